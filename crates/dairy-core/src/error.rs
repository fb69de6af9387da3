use dairy_domain::{BillingMonth, DeliveryTransitionError};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Customer not found: {0}")]
    CustomerNotFound(Uuid),
    #[error("Delivery not found: {0}")]
    DeliveryNotFound(Uuid),
    #[error("Product not found: {0}")]
    ProductNotFound(String),
    #[error("No monthly record for customer {customer_id} in {month}")]
    MonthlyRecordNotFound {
        customer_id: Uuid,
        month: BillingMonth,
    },
    #[error("Delivery already exists for customer {customer_id} on {date} ({slot})")]
    DuplicateDelivery {
        customer_id: Uuid,
        date: chrono::NaiveDate,
        slot: dairy_domain::TimeSlot,
    },
    #[error("Invalid transition: {0}")]
    InvalidTransition(#[from] DeliveryTransitionError),
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("Serialization error: {0}")]
    Serde(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type CoreResult<T> = Result<T, CoreError>;
