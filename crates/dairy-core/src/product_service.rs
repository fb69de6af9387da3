use tracing::info;

use dairy_domain::{DairyBook, Product};

use crate::{validation, CoreError, CoreResult};

pub struct ProductService;

impl ProductService {
    /// Adds the product or replaces the definition with the same id.
    pub fn upsert(book: &mut DairyBook, product: Product) -> CoreResult<()> {
        validation::validate_product(&product)?;
        info!(product_id = %product.id, price = product.price, "product saved");
        book.catalog.upsert(product);
        Ok(())
    }

    /// New price applies to future deliveries and sales only.
    pub fn set_price(book: &mut DairyBook, id: &str, price: f64) -> CoreResult<()> {
        validation::validate_amount("product price", price)?;
        let product = book
            .catalog
            .product_mut(id)
            .ok_or_else(|| CoreError::ProductNotFound(id.to_string()))?;
        product.price = price;
        Ok(())
    }

    pub fn set_active(book: &mut DairyBook, id: &str, active: bool) -> CoreResult<()> {
        let product = book
            .catalog
            .product_mut(id)
            .ok_or_else(|| CoreError::ProductNotFound(id.to_string()))?;
        product.active = active;
        Ok(())
    }

    pub fn list(book: &DairyBook) -> Vec<&Product> {
        book.catalog.products.iter().collect()
    }
}
