use tracing::{info, warn};
use uuid::Uuid;

use dairy_domain::{round2, Customer, DairyBook, TimeSlot, UNKNOWN_PRODUCT};

use crate::{validation, CoreError, CoreResult};

/// One line of a customer's standing order, priced at today's catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct StandingOrderLine {
    pub product_id: String,
    pub product_name: String,
    pub quantity: f64,
    pub price: f64,
    pub amount: f64,
}

pub struct CustomerService;

impl CustomerService {
    pub fn add(book: &mut DairyBook, customer: Customer) -> CoreResult<Uuid> {
        validation::validate_customer(&customer)?;
        if book.customer(customer.id).is_some() {
            return Err(CoreError::InvalidOperation(format!(
                "Customer {} already exists",
                customer.id
            )));
        }
        let id = customer.id;
        info!(customer_id = %id, kind = %customer.kind, "customer added");
        book.customers.push(customer);
        Ok(id)
    }

    /// Replaces the editable fields; identity and creation time are kept.
    pub fn edit(book: &mut DairyBook, id: Uuid, changes: Customer) -> CoreResult<()> {
        validation::validate_customer(&changes)?;
        let customer = book
            .customer_mut(id)
            .ok_or(CoreError::CustomerNotFound(id))?;
        customer.name = changes.name;
        customer.phone = changes.phone;
        customer.address = changes.address;
        customer.kind = changes.kind;
        customer.schedule = changes.schedule;
        customer.default_items = changes.default_items;
        customer.default_items_by_slot = changes.default_items_by_slot;
        customer.touch();
        Ok(())
    }

    /// Hard-deletes the customer record; deliveries, sales, payments and ledgers stay.
    pub fn remove(book: &mut DairyBook, id: Uuid) -> CoreResult<Customer> {
        let index = book
            .customers
            .iter()
            .position(|customer| customer.id == id)
            .ok_or(CoreError::CustomerNotFound(id))?;
        let removed = book.customers.remove(index);
        info!(customer_id = %id, "customer removed");
        Ok(removed)
    }

    pub fn list(book: &DairyBook) -> Vec<&Customer> {
        book.customers.iter().collect()
    }

    pub fn get(book: &DairyBook, id: Uuid) -> CoreResult<&Customer> {
        book.customer(id).ok_or(CoreError::CustomerNotFound(id))
    }

    /// The slot's template as it would be charged today.
    ///
    /// Products missing from the catalog read as `"Unknown"` at 0 so a stale template
    /// can still be shown and corrected.
    pub fn standing_order(
        book: &DairyBook,
        id: Uuid,
        slot: TimeSlot,
    ) -> CoreResult<Vec<StandingOrderLine>> {
        let customer = Self::get(book, id)?;
        let lines = customer
            .items_for_slot(slot)
            .iter()
            .map(|item| {
                let resolved = book.catalog.resolve(&item.product_id);
                if resolved.name == UNKNOWN_PRODUCT {
                    warn!(
                        customer_id = %id,
                        product_id = %item.product_id,
                        "standing order names a product missing from the catalog"
                    );
                }
                StandingOrderLine {
                    product_id: item.product_id.clone(),
                    amount: round2(resolved.price * item.quantity),
                    product_name: resolved.name,
                    quantity: item.quantity,
                    price: resolved.price,
                }
            })
            .collect();
        Ok(lines)
    }
}
