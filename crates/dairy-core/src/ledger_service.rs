//! Monthly ledger engine for fixed customers.
//!
//! Every delivery outcome and every payment of a fixed customer funnels through
//! [`LedgerService::upsert_delivery`] or [`LedgerService::apply_payment`]. Both rebuild the
//! affected record from its details and payments, then walk forward through the customer's
//! later months so each `previous_balance` equals its predecessor's `balance_due`.

use chrono::{DateTime, Utc};
use tracing::{debug, info};
use uuid::Uuid;

use dairy_domain::{
    BillingMonth, DairyBook, LedgerPayment, MonthlyDeliveryDetail, MonthlyRecord, Payment,
    RecordStatus, SameDaySlots,
};

use crate::{CoreError, CoreResult};

/// Outcome of closing a month.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloseSummary {
    pub month: BillingMonth,
    /// Records that moved to `closed` during this call.
    pub closed: usize,
    /// Next-month records created during this call.
    pub opened: usize,
}

pub struct LedgerService;

impl LedgerService {
    /// Returns the record for (customer, month), creating it when absent.
    ///
    /// A new record carries the prior calendar month's `balance_due`, or 0 without one.
    pub fn ensure_record(
        book: &mut DairyBook,
        customer_id: Uuid,
        month: BillingMonth,
        now: DateTime<Utc>,
    ) -> CoreResult<&mut MonthlyRecord> {
        if book.record(customer_id, month).is_none() {
            let customer = book
                .customer(customer_id)
                .ok_or(CoreError::CustomerNotFound(customer_id))?;
            let previous_balance = book
                .record(customer_id, month.previous())
                .map_or(0.0, |record| record.balance_due);
            let record =
                MonthlyRecord::open(customer_id, customer.name.clone(), month, previous_balance, now);
            debug!(customer_id = %customer_id, month = %month, previous_balance, "opened monthly record");
            book.monthly_records.push(record);
        }
        book.record_mut(customer_id, month)
            .ok_or(CoreError::MonthlyRecordNotFound { customer_id, month })
    }

    /// Folds a delivered or skipped delivery into its customer's monthly record.
    ///
    /// Returns `false` without touching any record when the delivery does not belong
    /// to a fixed customer.
    pub fn upsert_delivery(
        book: &mut DairyBook,
        delivery_id: Uuid,
        policy: SameDaySlots,
        now: DateTime<Utc>,
    ) -> CoreResult<bool> {
        let delivery = book
            .delivery(delivery_id)
            .ok_or(CoreError::DeliveryNotFound(delivery_id))?;
        if !delivery.status.is_terminal() {
            return Err(CoreError::InvalidOperation(format!(
                "delivery {delivery_id} is still pending"
            )));
        }
        let Some(customer_id) = delivery.customer_id else {
            return Ok(false);
        };
        if !book.customer(customer_id).is_some_and(|customer| customer.is_fixed()) {
            return Ok(false);
        }

        let month = BillingMonth::from_date(delivery.date);
        let detail = MonthlyDeliveryDetail::from_delivery(delivery);
        let record = Self::ensure_record(book, customer_id, month, now)?;
        record.upsert_detail(detail, policy);
        record.updated_at = now;
        debug!(
            customer_id = %customer_id,
            month = %month,
            balance_due = record.balance_due,
            "ledger updated from delivery"
        );
        Self::propagate_carry_forward(book, customer_id, month, now);
        Ok(true)
    }

    /// Appends a standalone payment to the record of the payment's month, creating it if needed.
    pub fn apply_payment(
        book: &mut DairyBook,
        payment: &Payment,
        now: DateTime<Utc>,
    ) -> CoreResult<()> {
        let month = BillingMonth::from_date(payment.date);
        let record = Self::ensure_record(book, payment.customer_id, month, now)?;
        record.add_payment(LedgerPayment {
            payment_id: Some(payment.id),
            date: payment.date,
            amount: payment.amount,
            mode: payment.mode,
        });
        record.updated_at = now;
        debug!(
            customer_id = %payment.customer_id,
            month = %month,
            amount = payment.amount,
            balance_due = record.balance_due,
            "ledger updated from payment"
        );
        Self::propagate_carry_forward(book, payment.customer_id, month, now);
        Ok(())
    }

    /// Creates missing records for `month` for every fixed customer; returns their ids.
    pub fn initialize_month(
        book: &mut DairyBook,
        month: BillingMonth,
        now: DateTime<Utc>,
    ) -> CoreResult<Vec<Uuid>> {
        let pending: Vec<Uuid> = book
            .fixed_customers()
            .filter(|customer| book.record(customer.id, month).is_none())
            .map(|customer| customer.id)
            .collect();
        let mut created = Vec::with_capacity(pending.len());
        for customer_id in pending {
            created.push(Self::ensure_record(book, customer_id, month, now)?.id);
        }
        if !created.is_empty() {
            info!(month = %month, count = created.len(), "initialized monthly records");
        }
        Ok(created)
    }

    /// Closes every record of `month` and opens or reseeds the following month.
    ///
    /// Calling it again for a closed month keeps the original `closed_at`.
    pub fn close_month(
        book: &mut DairyBook,
        month: BillingMonth,
        now: DateTime<Utc>,
    ) -> CoreResult<CloseSummary> {
        let mut closed = 0;
        for record in book
            .monthly_records
            .iter_mut()
            .filter(|record| record.month == month)
        {
            if record.status != RecordStatus::Closed {
                record.status = RecordStatus::Closed;
                record.closed_at = record.closed_at.or(Some(now));
                record.updated_at = now;
                closed += 1;
            }
        }

        let next = month.next();
        let customers: Vec<Uuid> = book.fixed_customers().map(|customer| customer.id).collect();
        let mut opened = 0;
        for customer_id in customers {
            if book.record(customer_id, next).is_none() {
                Self::ensure_record(book, customer_id, next, now)?;
                opened += 1;
            }
            Self::propagate_carry_forward(book, customer_id, month, now);
        }

        info!(month = %month, closed, opened, "month closed");
        Ok(CloseSummary {
            month,
            closed,
            opened,
        })
    }

    /// Marks an active record as billed. Closed records cannot be billed.
    pub fn mark_billed(
        book: &mut DairyBook,
        customer_id: Uuid,
        month: BillingMonth,
        now: DateTime<Utc>,
    ) -> CoreResult<()> {
        let record = book
            .record_mut(customer_id, month)
            .ok_or(CoreError::MonthlyRecordNotFound { customer_id, month })?;
        match record.status {
            RecordStatus::Active => {
                record.status = RecordStatus::Billed;
                record.updated_at = now;
                Ok(())
            }
            RecordStatus::Billed => Ok(()),
            RecordStatus::Closed => Err(CoreError::InvalidOperation(format!(
                "record for {month} is already closed"
            ))),
        }
    }

    /// Reseeds every later record of the customer from its immediate predecessor.
    ///
    /// Records whose previous calendar month has no record keep their balance.
    pub fn propagate_carry_forward(
        book: &mut DairyBook,
        customer_id: Uuid,
        from: BillingMonth,
        now: DateTime<Utc>,
    ) {
        for month in book
            .record_months(customer_id)
            .into_iter()
            .filter(|month| *month > from)
        {
            let Some(carried) = book
                .record(customer_id, month.previous())
                .map(|record| record.balance_due)
            else {
                continue;
            };
            if let Some(record) = book.record_mut(customer_id, month) {
                if record.previous_balance != carried {
                    record.reseed(carried);
                    record.updated_at = now;
                    debug!(customer_id = %customer_id, month = %month, carried, "carry-forward reseeded");
                }
            }
        }
    }

    pub fn statement(
        book: &DairyBook,
        customer_id: Uuid,
        month: BillingMonth,
    ) -> CoreResult<&MonthlyRecord> {
        book.record(customer_id, month)
            .ok_or(CoreError::MonthlyRecordNotFound { customer_id, month })
    }
}
