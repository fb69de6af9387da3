//! Product catalog used for pricing deliveries and sales.

use serde::{Deserialize, Serialize};

/// Name reported for products that no longer exist in the catalog.
pub const UNKNOWN_PRODUCT: &str = "Unknown";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Product {
    pub id: String,
    pub name: String,
    /// Unit label such as `litre` or `packet`.
    pub unit: String,
    pub price: f64,
    #[serde(default = "Product::default_active")]
    pub active: bool,
}

impl Product {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        unit: impl Into<String>,
        price: f64,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            unit: unit.into(),
            price,
            active: true,
        }
    }

    pub fn default_active() -> bool {
        true
    }
}

/// Name and price pair resolved from the catalog at a point in time.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceSnapshot {
    pub name: String,
    pub price: f64,
}

/// Mapping from product id to its current definition.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct Catalog {
    pub products: Vec<Product>,
}

impl Catalog {
    pub fn new(products: Vec<Product>) -> Self {
        Self { products }
    }

    pub fn product(&self, id: &str) -> Option<&Product> {
        self.products.iter().find(|product| product.id == id)
    }

    pub fn product_mut(&mut self, id: &str) -> Option<&mut Product> {
        self.products.iter_mut().find(|product| product.id == id)
    }

    /// Active product lookup used when pricing new deliveries.
    pub fn active_product(&self, id: &str) -> Option<&Product> {
        self.product(id).filter(|product| product.active)
    }

    /// Resolves name and price, degrading to `"Unknown"` / 0 for missing products.
    pub fn resolve(&self, id: &str) -> PriceSnapshot {
        match self.product(id) {
            Some(product) => PriceSnapshot {
                name: product.name.clone(),
                price: product.price,
            },
            None => PriceSnapshot {
                name: UNKNOWN_PRODUCT.to_string(),
                price: 0.0,
            },
        }
    }

    /// Inserts the product or replaces the one with the same id.
    pub fn upsert(&mut self, product: Product) {
        match self.product_mut(&product.id) {
            Some(existing) => *existing = product,
            None => self.products.push(product),
        }
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}
