//! Per-slot delivery records and their monotonic lifecycle.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::common::*;
use crate::payment::PaymentType;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
    #[default]
    Pending,
    Delivered,
    Skipped,
}

impl DeliveryStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, DeliveryStatus::Pending)
    }
}

impl fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            DeliveryStatus::Pending => "pending",
            DeliveryStatus::Delivered => "delivered",
            DeliveryStatus::Skipped => "skipped",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    #[default]
    Unpaid,
    Partial,
    Paid,
}

impl PaymentStatus {
    /// Nothing paid is always `unpaid`, even against a zero total. Otherwise `paid`
    /// when the amount covers the total and `partial` below it.
    pub fn classify(amount: f64, total: f64) -> Self {
        if amount <= 0.0 {
            PaymentStatus::Unpaid
        } else if amount >= total {
            PaymentStatus::Paid
        } else {
            PaymentStatus::Partial
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Nobody at home.
    GharPeNahi,
    OutOfStation,
    NotRequired,
    PaymentPending,
    Other,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SkipReason::GharPeNahi => "ghar_pe_nahi",
            SkipReason::OutOfStation => "out_of_station",
            SkipReason::NotRequired => "not_required",
            SkipReason::PaymentPending => "payment_pending",
            SkipReason::Other => "other",
        };
        f.write_str(label)
    }
}

/// Line item with the product name and price captured when the line was created.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DeliveryItem {
    pub product_id: String,
    pub product_name: String,
    pub quantity: f64,
    pub price: f64,
}

impl DeliveryItem {
    pub fn line_value(&self) -> f64 {
        self.price * self.quantity
    }
}

/// Contact details of an unregistered buyer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct WalkInContact {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Delivery {
    pub id: Uuid,
    /// `None` for walk-in buyers.
    #[serde(default)]
    pub customer_id: Option<Uuid>,
    pub customer_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub walk_in: Option<WalkInContact>,
    pub date: NaiveDate,
    pub time_slot: TimeSlot,
    pub items: Vec<DeliveryItem>,
    #[serde(default)]
    pub extra_items: Vec<DeliveryItem>,
    #[serde(default)]
    pub status: DeliveryStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip_reason: Option<SkipReason>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip_note: Option<String>,
    #[serde(default)]
    pub payment_status: PaymentStatus,
    #[serde(default)]
    pub paid_amount: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_mode: Option<PaymentType>,
    #[serde(default)]
    pub total: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivered_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Delivery {
    pub fn pending(
        customer_id: Option<Uuid>,
        customer_name: impl Into<String>,
        date: NaiveDate,
        time_slot: TimeSlot,
        items: Vec<DeliveryItem>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            customer_id,
            customer_name: customer_name.into(),
            walk_in: None,
            date,
            time_slot,
            items,
            extra_items: Vec::new(),
            status: DeliveryStatus::Pending,
            skip_reason: None,
            skip_note: None,
            payment_status: PaymentStatus::Unpaid,
            paid_amount: 0.0,
            payment_mode: None,
            total: 0.0,
            delivered_at: None,
            created_at: Utc::now(),
        }
    }

    pub fn walk_in(
        contact: WalkInContact,
        date: NaiveDate,
        time_slot: TimeSlot,
        items: Vec<DeliveryItem>,
    ) -> Self {
        let mut delivery = Self::pending(None, contact.name.clone(), date, time_slot, items);
        delivery.walk_in = Some(contact);
        delivery
    }

    pub fn is_walk_in(&self) -> bool {
        self.customer_id.is_none()
    }

    pub fn is_pending(&self) -> bool {
        self.status == DeliveryStatus::Pending
    }

    /// Natural key of recurring and one-time deliveries.
    pub fn matches_key(&self, customer_id: Uuid, slot: TimeSlot, date: NaiveDate) -> bool {
        self.customer_id == Some(customer_id) && self.time_slot == slot && self.date == date
    }

    /// Whole-unit total: main items and extras are each summed unrounded, then rounded once.
    pub fn compute_total(&self) -> f64 {
        let main: f64 = self.items.iter().map(DeliveryItem::line_value).sum();
        let extra: f64 = self.extra_items.iter().map(DeliveryItem::line_value).sum();
        round_whole(main) + round_whole(extra)
    }

    pub fn add_extra_items(
        &mut self,
        items: Vec<DeliveryItem>,
    ) -> Result<(), DeliveryTransitionError> {
        self.ensure_pending()?;
        self.extra_items.extend(items);
        Ok(())
    }

    /// Sets every terminal field of a delivered record in one step.
    pub fn complete(
        &mut self,
        mode: PaymentType,
        paid_amount: f64,
        at: DateTime<Utc>,
    ) -> Result<(), DeliveryTransitionError> {
        self.ensure_pending()?;
        let total = self.compute_total();
        self.total = total;
        self.status = DeliveryStatus::Delivered;
        self.paid_amount = paid_amount;
        self.payment_mode = Some(mode);
        self.payment_status = PaymentStatus::classify(paid_amount, total);
        self.delivered_at = Some(at);
        Ok(())
    }

    /// Marks the delivery skipped; the note is kept only for [`SkipReason::Other`].
    pub fn skip(
        &mut self,
        reason: SkipReason,
        note: Option<String>,
    ) -> Result<(), DeliveryTransitionError> {
        self.ensure_pending()?;
        self.status = DeliveryStatus::Skipped;
        self.total = self.compute_total();
        self.skip_reason = Some(reason);
        self.skip_note = match reason {
            SkipReason::Other => note.filter(|text| !text.trim().is_empty()),
            _ => None,
        };
        Ok(())
    }

    fn ensure_pending(&self) -> Result<(), DeliveryTransitionError> {
        if self.is_pending() {
            Ok(())
        } else {
            Err(DeliveryTransitionError::AlreadyFinal {
                id: self.id,
                status: self.status,
            })
        }
    }
}

impl Identifiable for Delivery {
    fn id(&self) -> Uuid {
        self.id
    }
}

/// Raised when a delivery that already reached a terminal state is changed again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryTransitionError {
    AlreadyFinal { id: Uuid, status: DeliveryStatus },
}

impl fmt::Display for DeliveryTransitionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeliveryTransitionError::AlreadyFinal { id, status } => {
                write!(f, "delivery {id} is already {status}")
            }
        }
    }
}

impl std::error::Error for DeliveryTransitionError {}
