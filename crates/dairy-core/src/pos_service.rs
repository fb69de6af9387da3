//! Delivery lifecycle and point-of-sale bridge.
//!
//! Terminal delivery transitions create the matching [`Sale`] and feed the ledger in the
//! same call, so no other write can land between a status change and its ledger effect.

use chrono::{DateTime, NaiveDate, Utc};
use tracing::info;
use uuid::Uuid;

use dairy_domain::{
    round2, Customer, DairyBook, Delivery, DeliveryTransitionError, ItemSpec, Payment,
    PaymentMode, PaymentStatus, PaymentType, Sale, SaleItem, SameDaySlots, SkipReason,
};

use crate::{
    delivery_service::DeliveryService, ledger_service::LedgerService, validation, CoreError,
    CoreResult,
};

/// Result of settling a delivery.
#[derive(Debug, Clone, PartialEq)]
pub struct Settlement {
    pub sale_id: Uuid,
    pub total: f64,
    pub paid_amount: f64,
    pub payment_status: PaymentStatus,
    /// Random customer created from a walk-in left with an outstanding balance.
    pub promoted_customer: Option<Uuid>,
    pub ledger_updated: bool,
}

/// Counter sale made without a delivery.
#[derive(Debug, Clone)]
pub struct CounterSale {
    pub customer_id: Option<Uuid>,
    /// Display name used when no customer is attached.
    pub walk_in_name: Option<String>,
    pub items: Vec<ItemSpec>,
    pub payment_type: PaymentType,
    /// Only read for due sales; cash and online sales are always fully paid.
    pub paid_amount: Option<f64>,
    pub date: NaiveDate,
}

pub struct PosService;

impl PosService {
    /// Delivers on account: a due sale with nothing collected.
    pub fn mark_delivered(
        book: &mut DairyBook,
        delivery_id: Uuid,
        policy: SameDaySlots,
        now: DateTime<Utc>,
    ) -> CoreResult<Settlement> {
        let delivery = Self::pending_delivery(book, delivery_id)?;
        if delivery.is_walk_in() {
            return Err(CoreError::InvalidOperation(
                "walk-in deliveries must be settled through a payment".into(),
            ));
        }
        Self::settle(book, delivery_id, PaymentType::Due, 0.0, policy, now)
    }

    /// Delivers and records what was collected.
    ///
    /// `amount` defaults to the full total, or 0 for `due`. A walk-in left with an
    /// outstanding balance is promoted to a random customer first.
    pub fn submit_payment(
        book: &mut DairyBook,
        delivery_id: Uuid,
        mode: PaymentType,
        amount: Option<f64>,
        policy: SameDaySlots,
        now: DateTime<Utc>,
    ) -> CoreResult<Settlement> {
        let delivery = Self::pending_delivery(book, delivery_id)?;
        let total = delivery.compute_total();
        let amount = amount.unwrap_or(match mode {
            PaymentType::Due => 0.0,
            PaymentType::Cash | PaymentType::Online => total,
        });
        validation::validate_amount("payment amount", amount)?;
        Self::settle(book, delivery_id, mode, amount, policy, now)
    }

    /// Skips a pending delivery. No sale is created.
    pub fn skip(
        book: &mut DairyBook,
        delivery_id: Uuid,
        reason: SkipReason,
        note: Option<String>,
        policy: SameDaySlots,
        now: DateTime<Utc>,
    ) -> CoreResult<bool> {
        let delivery = book
            .delivery_mut(delivery_id)
            .ok_or(CoreError::DeliveryNotFound(delivery_id))?;
        delivery.skip(reason, note)?;
        info!(delivery_id = %delivery_id, reason = %reason, "delivery skipped");
        LedgerService::upsert_delivery(book, delivery_id, policy, now)
    }

    /// Appends extra lines to a pending delivery, priced from the current catalog.
    pub fn add_extra_items(
        book: &mut DairyBook,
        delivery_id: Uuid,
        items: &[ItemSpec],
    ) -> CoreResult<()> {
        validation::validate_items(items)?;
        let priced = DeliveryService::price_items(&book.catalog, items)?;
        let delivery = book
            .delivery_mut(delivery_id)
            .ok_or(CoreError::DeliveryNotFound(delivery_id))?;
        delivery.add_extra_items(priced)?;
        Ok(())
    }

    /// Records a counter sale; returns the sale id.
    pub fn counter_sale(
        book: &mut DairyBook,
        sale: CounterSale,
        now: DateTime<Utc>,
    ) -> CoreResult<Uuid> {
        validation::validate_items(&sale.items)?;
        let customer_name = match sale.customer_id {
            Some(customer_id) => {
                let customer = book
                    .customer(customer_id)
                    .ok_or(CoreError::CustomerNotFound(customer_id))?;
                if customer.is_fixed() && sale.payment_type == PaymentType::Due {
                    return Err(CoreError::InvalidOperation(
                        "dues of fixed customers are kept in the monthly ledger".into(),
                    ));
                }
                customer.name.clone()
            }
            None => {
                if sale.payment_type == PaymentType::Due {
                    return Err(CoreError::Validation(
                        "a due sale needs a registered customer".into(),
                    ));
                }
                sale.walk_in_name
                    .clone()
                    .filter(|name| !name.trim().is_empty())
                    .unwrap_or_else(|| "Walk-in".to_string())
            }
        };

        let priced = DeliveryService::price_items(&book.catalog, &sale.items)?;
        let items: Vec<SaleItem> = priced.iter().map(SaleItem::from).collect();
        let total_amount = round2(items.iter().map(|item| item.total).sum());
        let paid_amount = match sale.payment_type {
            PaymentType::Due => {
                let paid = sale.paid_amount.unwrap_or(0.0);
                validation::validate_amount("paid amount", paid)?;
                paid
            }
            PaymentType::Cash | PaymentType::Online => total_amount,
        };

        let record = Sale {
            id: Uuid::new_v4(),
            customer_id: sale.customer_id,
            customer_name,
            items,
            total_amount,
            payment_type: sale.payment_type,
            paid_amount,
            paid_via: None,
            date: sale.date,
            delivery_id: None,
            created_at: now,
        };
        let id = record.id;
        info!(sale_id = %id, total = total_amount, payment_type = %sale.payment_type, "counter sale recorded");
        book.sales.push(record);
        Ok(id)
    }

    /// Records money received against a customer's balance.
    ///
    /// Payments from fixed customers also land in the monthly record of the payment date.
    pub fn record_payment(
        book: &mut DairyBook,
        customer_id: Uuid,
        amount: f64,
        mode: PaymentMode,
        date: NaiveDate,
        note: Option<String>,
        now: DateTime<Utc>,
    ) -> CoreResult<Uuid> {
        validation::validate_payment_amount(amount)?;
        let customer = book
            .customer(customer_id)
            .ok_or(CoreError::CustomerNotFound(customer_id))?;
        let fixed = customer.is_fixed();
        let mut payment = Payment::new(customer_id, amount, mode, date);
        payment.created_at = now;
        if let Some(note) = note {
            payment = payment.with_note(note);
        }
        if fixed {
            LedgerService::apply_payment(book, &payment, now)?;
        }
        let id = payment.id;
        info!(customer_id = %customer_id, amount, mode = %mode, "payment recorded");
        book.payments.push(payment);
        Ok(id)
    }

    fn pending_delivery(book: &DairyBook, delivery_id: Uuid) -> CoreResult<&Delivery> {
        let delivery = book
            .delivery(delivery_id)
            .ok_or(CoreError::DeliveryNotFound(delivery_id))?;
        if !delivery.is_pending() {
            return Err(DeliveryTransitionError::AlreadyFinal {
                id: delivery.id,
                status: delivery.status,
            }
            .into());
        }
        if delivery.items.is_empty() && delivery.extra_items.is_empty() {
            return Err(CoreError::Validation(
                "cannot deliver a delivery without items".into(),
            ));
        }
        Ok(delivery)
    }

    fn settle(
        book: &mut DairyBook,
        delivery_id: Uuid,
        mode: PaymentType,
        amount: f64,
        policy: SameDaySlots,
        now: DateTime<Utc>,
    ) -> CoreResult<Settlement> {
        let delivery = Self::pending_delivery(book, delivery_id)?;
        let total = delivery.compute_total();
        let outstanding = mode == PaymentType::Due || round2(amount) < round2(total);

        let promoted_customer = if delivery.is_walk_in() && outstanding {
            Some(Self::promote_walk_in(book, delivery_id, now)?)
        } else {
            None
        };

        let delivery = book
            .delivery_mut(delivery_id)
            .ok_or(CoreError::DeliveryNotFound(delivery_id))?;
        delivery.complete(mode, amount, now)?;
        let sale = Self::sale_for(delivery, mode, amount, outstanding, now);
        let sale_id = sale.id;
        let payment_status = delivery.payment_status;
        info!(
            delivery_id = %delivery_id,
            total,
            paid = amount,
            mode = %mode,
            "delivery completed"
        );
        book.sales.push(sale);

        let ledger_updated = LedgerService::upsert_delivery(book, delivery_id, policy, now)?;
        Ok(Settlement {
            sale_id,
            total,
            paid_amount: amount,
            payment_status,
            promoted_customer,
            ledger_updated,
        })
    }

    fn sale_for(
        delivery: &Delivery,
        mode: PaymentType,
        amount: f64,
        outstanding: bool,
        now: DateTime<Utc>,
    ) -> Sale {
        let items: Vec<SaleItem> = delivery
            .items
            .iter()
            .chain(delivery.extra_items.iter())
            .map(SaleItem::from)
            .collect();
        let (payment_type, paid_via) = if outstanding {
            let via = if amount > 0.0 { mode.as_mode() } else { None };
            (PaymentType::Due, via)
        } else {
            (mode, None)
        };
        Sale {
            id: Uuid::new_v4(),
            customer_id: delivery.customer_id,
            customer_name: delivery.customer_name.clone(),
            items,
            total_amount: delivery.total,
            payment_type,
            paid_amount: amount,
            paid_via,
            date: delivery.date,
            delivery_id: Some(delivery.id),
            created_at: now,
        }
    }

    /// Turns the walk-in contact into a random customer and re-points the delivery at it.
    fn promote_walk_in(
        book: &mut DairyBook,
        delivery_id: Uuid,
        now: DateTime<Utc>,
    ) -> CoreResult<Uuid> {
        let delivery = book
            .delivery(delivery_id)
            .ok_or(CoreError::DeliveryNotFound(delivery_id))?;
        let contact = delivery.walk_in.clone().unwrap_or_default();
        validation::validate_name("walk-in name", &contact.name)?;

        let mut customer = Customer::random(contact.name.trim());
        customer.phone = contact.phone;
        customer.address = contact.address;
        customer.created_at = now;
        customer.updated_at = now;
        let customer_id = customer.id;
        let name = customer.name.clone();
        book.customers.push(customer);

        if let Some(delivery) = book.delivery_mut(delivery_id) {
            delivery.customer_id = Some(customer_id);
            delivery.customer_name = name;
        }
        info!(delivery_id = %delivery_id, customer_id = %customer_id, "walk-in promoted to customer");
        Ok(customer_id)
    }
}
