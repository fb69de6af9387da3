//! Read-only projections over sales, payments and monthly records.
//!
//! Each customer type has exactly one canonical due source: fixed customers read their
//! monthly ledger, random customers the per-sale formula. Balances are never clamped, so a
//! negative value is an advance.

use std::cmp::Ordering;

use chrono::NaiveDate;
use uuid::Uuid;

use dairy_domain::{
    round2, BillingMonth, Customer, CustomerKind, DairyBook, DeliveryStatus, Sale,
};

use crate::{CoreError, CoreResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DueSource {
    /// `balance_due` of a monthly record.
    Ledger,
    /// Outstanding due sales minus standalone payments.
    Sales,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CustomerDue {
    pub customer_id: Uuid,
    pub customer_name: String,
    pub kind: CustomerKind,
    pub amount: f64,
    pub source: DueSource,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DailyStats {
    pub sales_total: f64,
    pub collection: f64,
    pub new_dues: f64,
    pub pending_deliveries: usize,
    pub delivered: usize,
    pub skipped: usize,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MonthlyStats {
    pub sale_count: usize,
    pub sales_total: f64,
    pub collection: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Dashboard {
    pub date: NaiveDate,
    pub today: DailyStats,
    pub month: MonthlyStats,
    /// Sum of positive random-customer dues.
    pub random_due_total: f64,
    /// Sum of positive fixed-customer ledger balances for the current month.
    pub fixed_outstanding_total: f64,
}

pub struct DuesService;

impl DuesService {
    /// Generic due: outstanding amounts of due sales minus standalone payments.
    pub fn customer_due(book: &DairyBook, customer_id: Uuid) -> f64 {
        let outstanding: f64 = book
            .sales_for(customer_id)
            .map(Sale::outstanding)
            .sum();
        let paid: f64 = book
            .payments_for(customer_id)
            .map(|payment| payment.amount)
            .sum();
        round2(outstanding - paid)
    }

    /// Ledger balance for `month`, or the latest earlier record's balance.
    pub fn ledger_balance(book: &DairyBook, customer_id: Uuid, month: BillingMonth) -> Option<f64> {
        book.monthly_records
            .iter()
            .filter(|record| record.customer_id == customer_id && record.month <= month)
            .max_by_key(|record| record.month)
            .map(|record| record.balance_due)
    }

    pub fn canonical_due(
        book: &DairyBook,
        customer_id: Uuid,
        month: BillingMonth,
    ) -> CoreResult<CustomerDue> {
        let customer = book
            .customer(customer_id)
            .ok_or(CoreError::CustomerNotFound(customer_id))?;
        Ok(Self::due_for(book, customer, month))
    }

    /// Non-zero canonical dues, largest first.
    pub fn due_list(book: &DairyBook, month: BillingMonth) -> Vec<CustomerDue> {
        let mut dues: Vec<CustomerDue> = book
            .customers
            .iter()
            .map(|customer| Self::due_for(book, customer, month))
            .filter(|due| due.amount != 0.0)
            .collect();
        dues.sort_by(|a, b| b.amount.partial_cmp(&a.amount).unwrap_or(Ordering::Equal));
        dues
    }

    /// Today's tiles. Fixed customers are excluded from money figures.
    pub fn daily_stats(book: &DairyBook, date: NaiveDate) -> DailyStats {
        let sales: Vec<&Sale> = book
            .sales
            .iter()
            .filter(|sale| sale.date == date)
            .filter(|sale| !Self::is_fixed_ref(book, sale.customer_id))
            .collect();
        let payments: f64 = book
            .payments
            .iter()
            .filter(|payment| payment.date == date)
            .filter(|payment| !Self::is_fixed_ref(book, Some(payment.customer_id)))
            .map(|payment| payment.amount)
            .sum();

        let mut stats = DailyStats {
            sales_total: round2(sales.iter().map(|sale| sale.total_amount).sum()),
            collection: round2(sales.iter().map(|sale| sale.paid_amount).sum::<f64>() + payments),
            new_dues: round2(sales.iter().map(|sale| sale.outstanding()).sum()),
            ..DailyStats::default()
        };
        for delivery in book.deliveries_on(date) {
            match delivery.status {
                DeliveryStatus::Pending => stats.pending_deliveries += 1,
                DeliveryStatus::Delivered => stats.delivered += 1,
                DeliveryStatus::Skipped => stats.skipped += 1,
            }
        }
        stats
    }

    /// Month tiles across every customer type.
    pub fn monthly_stats(book: &DairyBook, month: BillingMonth) -> MonthlyStats {
        let sales: Vec<&Sale> = book
            .sales
            .iter()
            .filter(|sale| month.contains(sale.date))
            .collect();
        let payments: f64 = book
            .payments
            .iter()
            .filter(|payment| month.contains(payment.date))
            .map(|payment| payment.amount)
            .sum();
        MonthlyStats {
            sale_count: sales.len(),
            sales_total: round2(sales.iter().map(|sale| sale.total_amount).sum()),
            collection: round2(sales.iter().map(|sale| sale.paid_amount).sum::<f64>() + payments),
        }
    }

    pub fn dashboard(book: &DairyBook, today: NaiveDate) -> Dashboard {
        let month = BillingMonth::from_date(today);
        let mut random_due_total = 0.0;
        let mut fixed_outstanding_total = 0.0;
        for customer in &book.customers {
            let due = Self::due_for(book, customer, month);
            if due.amount <= 0.0 {
                continue;
            }
            match customer.kind {
                CustomerKind::Fixed => fixed_outstanding_total += due.amount,
                CustomerKind::Random => random_due_total += due.amount,
            }
        }
        Dashboard {
            date: today,
            today: Self::daily_stats(book, today),
            month: Self::monthly_stats(book, month),
            random_due_total: round2(random_due_total),
            fixed_outstanding_total: round2(fixed_outstanding_total),
        }
    }

    fn due_for(book: &DairyBook, customer: &Customer, month: BillingMonth) -> CustomerDue {
        let ledger = if customer.is_fixed() {
            Self::ledger_balance(book, customer.id, month)
        } else {
            None
        };
        let (amount, source) = match ledger {
            Some(balance) => (balance, DueSource::Ledger),
            None => (Self::customer_due(book, customer.id), DueSource::Sales),
        };
        CustomerDue {
            customer_id: customer.id,
            customer_name: customer.name.clone(),
            kind: customer.kind,
            amount,
            source,
        }
    }

    /// Unknown or deleted customers count as non-fixed.
    fn is_fixed_ref(book: &DairyBook, customer_id: Option<Uuid>) -> bool {
        customer_id
            .and_then(|id| book.customer(id))
            .is_some_and(Customer::is_fixed)
    }
}
