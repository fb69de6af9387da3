//! Per-customer, per-month ledger records.
//!
//! A [`MonthlyRecord`] keeps its derived totals in step with its `delivery_details` and
//! `payments` through [`MonthlyRecord::recompute`]. Every mutator below ends with a full
//! recompute, so `balance_due == round2(previous_balance + current_month_total - total_paid)`
//! holds after each call.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::common::*;
use crate::delivery::{Delivery, DeliveryItem, DeliveryStatus, SkipReason};
use crate::payment::{PaymentMode, PaymentType};

/// How deliveries for several slots on the same date land in the ledger.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum SameDaySlots {
    /// One detail per date; the slot written last replaces earlier ones.
    #[default]
    LastWriteWins,
    /// One detail per (date, slot).
    PerSlot,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum RecordStatus {
    #[default]
    Active,
    Closed,
    Billed,
}

impl fmt::Display for RecordStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            RecordStatus::Active => "active",
            RecordStatus::Closed => "closed",
            RecordStatus::Billed => "billed",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LedgerItem {
    pub product_id: String,
    pub product_name: String,
    pub quantity: f64,
    pub price: f64,
    /// `round2(price * quantity)`.
    pub amount: f64,
}

impl From<&DeliveryItem> for LedgerItem {
    fn from(item: &DeliveryItem) -> Self {
        Self {
            product_id: item.product_id.clone(),
            product_name: item.product_name.clone(),
            quantity: item.quantity,
            price: item.price,
            amount: round2(item.price * item.quantity),
        }
    }
}

/// Snapshot of one delivery outcome inside a monthly record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MonthlyDeliveryDetail {
    pub date: NaiveDate,
    pub time_slot: TimeSlot,
    pub status: DeliveryStatus,
    pub items: Vec<LedgerItem>,
    #[serde(default)]
    pub extra_items: Vec<LedgerItem>,
    /// Sum of line amounts; stored for skipped entries too, but only counted when delivered.
    pub total: f64,
    #[serde(default)]
    pub paid_amount: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_mode: Option<PaymentType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip_reason: Option<SkipReason>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip_note: Option<String>,
    pub delivery_id: Uuid,
}

impl MonthlyDeliveryDetail {
    pub fn from_delivery(delivery: &Delivery) -> Self {
        let items: Vec<LedgerItem> = delivery.items.iter().map(LedgerItem::from).collect();
        let extra_items: Vec<LedgerItem> =
            delivery.extra_items.iter().map(LedgerItem::from).collect();
        let total = round2(
            items
                .iter()
                .chain(extra_items.iter())
                .map(|item| item.amount)
                .sum(),
        );
        Self {
            date: delivery.date,
            time_slot: delivery.time_slot,
            status: delivery.status,
            items,
            extra_items,
            total,
            paid_amount: delivery.paid_amount,
            payment_mode: delivery.payment_mode,
            skip_reason: delivery.skip_reason,
            skip_note: delivery.skip_note.clone(),
            delivery_id: delivery.id,
        }
    }

    fn same_key(&self, other: &Self, policy: SameDaySlots) -> bool {
        match policy {
            SameDaySlots::LastWriteWins => self.date == other.date,
            SameDaySlots::PerSlot => self.date == other.date && self.time_slot == other.time_slot,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SkippedDate {
    pub date: NaiveDate,
    pub reason: Option<SkipReason>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LedgerPayment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_id: Option<Uuid>,
    pub date: NaiveDate,
    pub amount: f64,
    pub mode: PaymentMode,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MonthlyRecord {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub customer_name: String,
    pub month: BillingMonth,
    pub previous_balance: f64,
    #[serde(default)]
    pub delivery_details: Vec<MonthlyDeliveryDetail>,
    #[serde(default)]
    pub delivered_count: u32,
    #[serde(default)]
    pub skipped_count: u32,
    #[serde(default)]
    pub total_delivery_days: u32,
    #[serde(default)]
    pub skipped_dates: Vec<SkippedDate>,
    #[serde(default)]
    pub current_month_total: f64,
    #[serde(default)]
    pub payments: Vec<LedgerPayment>,
    #[serde(default)]
    pub total_paid: f64,
    #[serde(default)]
    pub total_due: f64,
    #[serde(default)]
    pub balance_due: f64,
    #[serde(default)]
    pub status: RecordStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub closed_at: Option<DateTime<Utc>>,
}

impl MonthlyRecord {
    pub fn open(
        customer_id: Uuid,
        customer_name: impl Into<String>,
        month: BillingMonth,
        previous_balance: f64,
        now: DateTime<Utc>,
    ) -> Self {
        let mut record = Self {
            id: Uuid::new_v4(),
            customer_id,
            customer_name: customer_name.into(),
            month,
            previous_balance: round2(previous_balance),
            delivery_details: Vec::new(),
            delivered_count: 0,
            skipped_count: 0,
            total_delivery_days: 0,
            skipped_dates: Vec::new(),
            current_month_total: 0.0,
            payments: Vec::new(),
            total_paid: 0.0,
            total_due: 0.0,
            balance_due: 0.0,
            status: RecordStatus::Active,
            created_at: now,
            updated_at: now,
            closed_at: None,
        };
        record.recompute();
        record
    }

    /// Inserts `detail`, replacing the entry with the same key under `policy`.
    pub fn upsert_detail(&mut self, detail: MonthlyDeliveryDetail, policy: SameDaySlots) {
        self.delivery_details
            .retain(|existing| !existing.same_key(&detail, policy));
        self.delivery_details.push(detail);
        self.delivery_details
            .sort_by(|a, b| (a.date, a.time_slot).cmp(&(b.date, b.time_slot)));
        self.recompute();
    }

    /// Payments are append-only.
    pub fn add_payment(&mut self, payment: LedgerPayment) {
        self.payments.push(payment);
        self.recompute();
    }

    /// Replaces the carried-in balance and refreshes the totals.
    pub fn reseed(&mut self, previous_balance: f64) {
        self.previous_balance = round2(previous_balance);
        self.recompute();
    }

    /// Rebuilds every derived field from `delivery_details` and `payments`.
    pub fn recompute(&mut self) {
        let mut delivered = 0;
        let mut skipped = 0;
        let mut current_total = 0.0;
        let mut detail_paid = 0.0;
        self.skipped_dates.clear();

        for detail in &self.delivery_details {
            detail_paid += detail.paid_amount;
            match detail.status {
                DeliveryStatus::Delivered => {
                    delivered += 1;
                    current_total += detail.total;
                }
                DeliveryStatus::Skipped => {
                    skipped += 1;
                    self.skipped_dates.push(SkippedDate {
                        date: detail.date,
                        reason: detail.skip_reason,
                        note: detail.skip_note.clone(),
                    });
                }
                DeliveryStatus::Pending => {}
            }
        }

        let payments_total: f64 = self.payments.iter().map(|payment| payment.amount).sum();
        self.delivered_count = delivered;
        self.skipped_count = skipped;
        self.total_delivery_days = delivered + skipped;
        self.current_month_total = round2(current_total);
        self.total_due = round2(self.previous_balance + self.current_month_total);
        self.total_paid = round2(payments_total + detail_paid);
        self.balance_due = round2(self.total_due - self.total_paid);
    }

    pub fn is_closed(&self) -> bool {
        self.status == RecordStatus::Closed
    }
}

impl Identifiable for MonthlyRecord {
    fn id(&self) -> Uuid {
        self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn june() -> BillingMonth {
        BillingMonth::new(2024, 6).unwrap()
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, d).unwrap()
    }

    fn detail(d: u32, slot: TimeSlot, status: DeliveryStatus, total: f64) -> MonthlyDeliveryDetail {
        MonthlyDeliveryDetail {
            date: day(d),
            time_slot: slot,
            status,
            items: Vec::new(),
            extra_items: Vec::new(),
            total,
            paid_amount: 0.0,
            payment_mode: Some(PaymentType::Due),
            skip_reason: None,
            skip_note: None,
            delivery_id: Uuid::new_v4(),
        }
    }

    fn record() -> MonthlyRecord {
        MonthlyRecord::open(Uuid::new_v4(), "Asha", june(), 15.0, Utc::now())
    }

    #[test]
    fn skipped_details_do_not_count_towards_the_month() {
        let mut record = record();
        record.upsert_detail(
            detail(1, TimeSlot::Morning, DeliveryStatus::Delivered, 60.0),
            SameDaySlots::LastWriteWins,
        );
        record.upsert_detail(
            detail(2, TimeSlot::Morning, DeliveryStatus::Skipped, 60.0),
            SameDaySlots::LastWriteWins,
        );
        assert_eq!(record.current_month_total, 60.0);
        assert_eq!(record.total_due, 75.0);
        assert_eq!(record.skipped_count, 1);
        assert_eq!(record.total_delivery_days, 2);
        assert_eq!(record.skipped_dates[0].date, day(2));
    }

    #[test]
    fn same_day_policy_controls_collapsing() {
        let mut collapsed = record();
        let mut per_slot = record();
        for slot in [TimeSlot::Morning, TimeSlot::Evening] {
            collapsed.upsert_detail(
                detail(3, slot, DeliveryStatus::Delivered, 40.0),
                SameDaySlots::LastWriteWins,
            );
            per_slot.upsert_detail(
                detail(3, slot, DeliveryStatus::Delivered, 40.0),
                SameDaySlots::PerSlot,
            );
        }
        assert_eq!(collapsed.delivery_details.len(), 1);
        assert_eq!(collapsed.delivery_details[0].time_slot, TimeSlot::Evening);
        assert_eq!(collapsed.current_month_total, 40.0);
        assert_eq!(per_slot.delivery_details.len(), 2);
        assert_eq!(per_slot.current_month_total, 80.0);
    }

    #[test]
    fn payments_and_detail_paid_amounts_both_reduce_the_balance() {
        let mut record = record();
        let mut paid_detail = detail(4, TimeSlot::Morning, DeliveryStatus::Delivered, 60.0);
        paid_detail.paid_amount = 10.0;
        record.upsert_detail(paid_detail, SameDaySlots::LastWriteWins);
        record.add_payment(LedgerPayment {
            payment_id: None,
            date: day(5),
            amount: 0.1,
            mode: PaymentMode::Cash,
        });
        record.add_payment(LedgerPayment {
            payment_id: None,
            date: day(6),
            amount: 0.2,
            mode: PaymentMode::Online,
        });
        assert_eq!(record.total_paid, 10.3);
        assert_eq!(record.balance_due, 64.7);
    }

    #[test]
    fn overpayment_leaves_a_negative_balance() {
        let mut record = record();
        record.add_payment(LedgerPayment {
            payment_id: None,
            date: day(1),
            amount: 40.0,
            mode: PaymentMode::Cash,
        });
        assert_eq!(record.balance_due, -25.0);
        record.reseed(40.0);
        assert_eq!(record.balance_due, 0.0);
    }
}
