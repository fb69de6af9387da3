use std::{collections::HashSet, fmt, path::PathBuf};

use dairy_domain::DairyBook;

use crate::CoreError;

/// Named collections persisted as whole units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Customers,
    Products,
    Deliveries,
    Sales,
    Payments,
    MonthlyRecords,
}

impl Collection {
    pub const ALL: [Collection; 6] = [
        Collection::Customers,
        Collection::Products,
        Collection::Deliveries,
        Collection::Sales,
        Collection::Payments,
        Collection::MonthlyRecords,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Collection::Customers => "customers",
            Collection::Products => "products",
            Collection::Deliveries => "deliveries",
            Collection::Sales => "sales",
            Collection::Payments => "payments",
            Collection::MonthlyRecords => "monthly_records",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Describes a persisted snapshot of every collection.
#[derive(Debug, Clone)]
pub struct SnapshotInfo {
    pub id: String,
    pub created_at: String,
    pub path: PathBuf,
}

/// Abstraction over persistence backends storing the shop's collections.
///
/// Loading never fails for an absent collection; it yields an empty one instead.
/// Saving replaces the whole collection in one step.
pub trait CollectionStorage: Send + Sync {
    fn load_book(&self) -> Result<DairyBook, CoreError>;
    fn save_collection(&self, book: &DairyBook, collection: Collection) -> Result<(), CoreError>;
    fn save_all(&self, book: &DairyBook) -> Result<(), CoreError> {
        for collection in Collection::ALL {
            self.save_collection(book, collection)?;
        }
        Ok(())
    }
    fn backup(&self, note: Option<&str>) -> Result<SnapshotInfo, CoreError>;
    fn list_backups(&self) -> Result<Vec<SnapshotInfo>, CoreError>;
    fn restore_backup(&self, backup: &SnapshotInfo) -> Result<DairyBook, CoreError>;
}

/// Detects dangling references within a book snapshot.
pub fn book_warnings(book: &DairyBook) -> Vec<String> {
    let customer_ids: HashSet<_> = book.customers.iter().map(|c| c.id).collect();
    let mut warnings = Vec::new();

    for delivery in &book.deliveries {
        if let Some(customer_id) = delivery.customer_id {
            if !customer_ids.contains(&customer_id) {
                warnings.push(format!(
                    "delivery {} references unknown customer {}",
                    delivery.id, customer_id
                ));
            }
        }
        for item in delivery.items.iter().chain(delivery.extra_items.iter()) {
            if book.catalog.product(&item.product_id).is_none() {
                warnings.push(format!(
                    "delivery {} references missing product {}",
                    delivery.id, item.product_id
                ));
            }
        }
    }
    for sale in &book.sales {
        if let Some(customer_id) = sale.customer_id {
            if !customer_ids.contains(&customer_id) {
                warnings.push(format!(
                    "sale {} references unknown customer {}",
                    sale.id, customer_id
                ));
            }
        }
    }
    for record in &book.monthly_records {
        if !customer_ids.contains(&record.customer_id) {
            warnings.push(format!(
                "monthly record {} ({}) references unknown customer {}",
                record.id, record.month, record.customer_id
            ));
        }
    }
    warnings
}
