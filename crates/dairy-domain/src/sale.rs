//! Immutable point-of-sale receipts.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::common::*;
use crate::delivery::DeliveryItem;
use crate::payment::{PaymentMode, PaymentType};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SaleItem {
    pub product_id: String,
    pub product_name: String,
    pub quantity: f64,
    pub price: f64,
    /// `round2(price * quantity)`.
    pub total: f64,
}

impl SaleItem {
    pub fn new(
        product_id: impl Into<String>,
        product_name: impl Into<String>,
        quantity: f64,
        price: f64,
    ) -> Self {
        Self {
            product_id: product_id.into(),
            product_name: product_name.into(),
            quantity,
            price,
            total: round2(price * quantity),
        }
    }
}

impl From<&DeliveryItem> for SaleItem {
    fn from(item: &DeliveryItem) -> Self {
        SaleItem::new(
            item.product_id.clone(),
            item.product_name.clone(),
            item.quantity,
            item.price,
        )
    }
}

/// A receipt. `paid_amount < total_amount` only ever occurs with [`PaymentType::Due`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Sale {
    pub id: Uuid,
    #[serde(default)]
    pub customer_id: Option<Uuid>,
    pub customer_name: String,
    pub items: Vec<SaleItem>,
    pub total_amount: f64,
    pub payment_type: PaymentType,
    pub paid_amount: f64,
    /// Channel of the collected part of a partially paid due sale.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paid_via: Option<PaymentMode>,
    pub date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl Sale {
    pub fn is_due(&self) -> bool {
        self.payment_type == PaymentType::Due
    }

    /// Unpaid remainder; non-due sales never carry one.
    pub fn outstanding(&self) -> f64 {
        if self.is_due() {
            self.total_amount - self.paid_amount
        } else {
            0.0
        }
    }
}

impl Identifiable for Sale {
    fn id(&self) -> Uuid {
        self.id
    }
}
