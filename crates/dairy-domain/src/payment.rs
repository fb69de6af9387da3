use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::common::Identifiable;

/// How a sale or delivery was settled at transaction time.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum PaymentType {
    Cash,
    Online,
    Due,
}

impl PaymentType {
    pub fn as_mode(self) -> Option<PaymentMode> {
        match self {
            PaymentType::Cash => Some(PaymentMode::Cash),
            PaymentType::Online => Some(PaymentMode::Online),
            PaymentType::Due => None,
        }
    }
}

impl fmt::Display for PaymentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            PaymentType::Cash => "cash",
            PaymentType::Online => "online",
            PaymentType::Due => "due",
        };
        f.write_str(label)
    }
}

/// Channel through which money actually changed hands.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMode {
    Cash,
    Online,
}

impl From<PaymentMode> for PaymentType {
    fn from(mode: PaymentMode) -> Self {
        match mode {
            PaymentMode::Cash => PaymentType::Cash,
            PaymentMode::Online => PaymentType::Online,
        }
    }
}

impl fmt::Display for PaymentMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        PaymentType::from(*self).fmt(f)
    }
}

/// Money received against a customer's running balance, independent of any sale.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Payment {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub amount: f64,
    pub mode: PaymentMode,
    pub date: NaiveDate,
    #[serde(default)]
    pub note: String,
    pub created_at: DateTime<Utc>,
}

impl Payment {
    pub fn new(customer_id: Uuid, amount: f64, mode: PaymentMode, date: NaiveDate) -> Self {
        Self {
            id: Uuid::new_v4(),
            customer_id,
            amount,
            mode,
            date,
            note: String::new(),
            created_at: Utc::now(),
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = note.into();
        self
    }
}

impl Identifiable for Payment {
    fn id(&self) -> Uuid {
        self.id
    }
}
