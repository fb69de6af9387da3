//! Recurring delivery generation and ad-hoc delivery creation.

use std::collections::HashSet;

use chrono::NaiveDate;
use tracing::{info, warn};
use uuid::Uuid;

use dairy_domain::{
    Catalog, Customer, DairyBook, Delivery, DeliveryItem, ItemSpec, TimeSlot, WalkInContact,
};

use crate::{validation, CoreError, CoreResult};

pub struct DeliveryService;

impl DeliveryService {
    /// Computes the pending deliveries that should exist for `today` but do not yet.
    ///
    /// Only fixed customers with at least one item list are considered. Existing
    /// (customer, slot, date) keys are never duplicated, so repeated calls are safe.
    pub fn plan(
        today: NaiveDate,
        customers: &[Customer],
        existing: &[Delivery],
        catalog: &Catalog,
    ) -> Vec<Delivery> {
        let mut taken: HashSet<(Uuid, TimeSlot)> = existing
            .iter()
            .filter(|delivery| delivery.date == today)
            .filter_map(|delivery| delivery.customer_id.map(|id| (id, delivery.time_slot)))
            .collect();
        let mut planned = Vec::new();

        for customer in customers {
            if !customer.is_fixed() || !customer.has_default_items() {
                continue;
            }
            if !customer.delivers_on(today) {
                continue;
            }
            for slot in customer.delivery_slots() {
                if !taken.insert((customer.id, slot)) {
                    continue;
                }
                let items = Self::resolve_template(customer, slot, catalog);
                if items.is_empty() {
                    continue;
                }
                planned.push(Delivery::pending(
                    Some(customer.id),
                    customer.name.clone(),
                    today,
                    slot,
                    items,
                ));
            }
        }
        planned
    }

    /// Generates today's recurring deliveries into the book; returns the new ids.
    pub fn generate(book: &mut DairyBook, today: NaiveDate) -> Vec<Uuid> {
        let planned = Self::plan(today, &book.customers, &book.deliveries, &book.catalog);
        let ids: Vec<Uuid> = planned.iter().map(|delivery| delivery.id).collect();
        if !ids.is_empty() {
            info!(date = %today, count = ids.len(), "generated recurring deliveries");
        }
        book.deliveries.extend(planned);
        ids
    }

    /// Adds a one-time delivery for a registered customer.
    pub fn add_one_time(
        book: &mut DairyBook,
        customer_id: Uuid,
        date: NaiveDate,
        slot: TimeSlot,
        items: &[ItemSpec],
    ) -> CoreResult<Uuid> {
        validation::validate_items(items)?;
        let customer = book
            .customer(customer_id)
            .ok_or(CoreError::CustomerNotFound(customer_id))?;
        if book.has_delivery(customer_id, slot, date) {
            return Err(CoreError::DuplicateDelivery {
                customer_id,
                date,
                slot,
            });
        }
        let priced = Self::price_items(&book.catalog, items)?;
        let delivery = Delivery::pending(Some(customer_id), customer.name.clone(), date, slot, priced);
        let id = delivery.id;
        book.deliveries.push(delivery);
        Ok(id)
    }

    /// Records a delivery for an unregistered buyer.
    pub fn add_walk_in(
        book: &mut DairyBook,
        contact: WalkInContact,
        date: NaiveDate,
        slot: TimeSlot,
        items: &[ItemSpec],
    ) -> CoreResult<Uuid> {
        validation::validate_items(items)?;
        let priced = Self::price_items(&book.catalog, items)?;
        let delivery = Delivery::walk_in(contact, date, slot, priced);
        let id = delivery.id;
        book.deliveries.push(delivery);
        Ok(id)
    }

    /// Pending deliveries for `today` whose slot has opened by `current_hour`.
    pub fn started_pending(
        book: &DairyBook,
        today: NaiveDate,
        current_hour: u32,
    ) -> Vec<&Delivery> {
        let mut pending: Vec<&Delivery> = book
            .deliveries_on(today)
            .filter(|delivery| delivery.is_pending())
            .filter(|delivery| delivery.time_slot.has_started(current_hour))
            .collect();
        pending.sort_by(|a, b| {
            (a.time_slot, a.customer_name.as_str()).cmp(&(b.time_slot, b.customer_name.as_str()))
        });
        pending
    }

    /// Snapshots catalog name and price for each item; unknown or inactive products fail.
    pub fn price_items(catalog: &Catalog, items: &[ItemSpec]) -> CoreResult<Vec<DeliveryItem>> {
        items
            .iter()
            .map(|item| {
                let product = catalog
                    .active_product(&item.product_id)
                    .ok_or_else(|| {
                        CoreError::Validation(format!(
                            "product `{}` is not available",
                            item.product_id
                        ))
                    })?;
                Ok(DeliveryItem {
                    product_id: product.id.clone(),
                    product_name: product.name.clone(),
                    quantity: item.quantity,
                    price: product.price,
                })
            })
            .collect()
    }

    fn resolve_template(customer: &Customer, slot: TimeSlot, catalog: &Catalog) -> Vec<DeliveryItem> {
        customer
            .items_for_slot(slot)
            .iter()
            .filter_map(|item| match catalog.active_product(&item.product_id) {
                Some(product) => Some(DeliveryItem {
                    product_id: product.id.clone(),
                    product_name: product.name.clone(),
                    quantity: item.quantity,
                    price: product.price,
                }),
                None => {
                    warn!(
                        customer_id = %customer.id,
                        product_id = %item.product_id,
                        "skipping unavailable product in delivery template"
                    );
                    None
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dairy_domain::{Product, Schedule};

    fn catalog() -> Catalog {
        let mut paneer = Product::new("paneer", "Paneer", "kg", 400.0);
        paneer.active = false;
        Catalog::new(vec![Product::new("milk", "Milk", "litre", 60.0), paneer])
    }

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 3).unwrap()
    }

    #[test]
    fn plan_is_idempotent() {
        let customer = Customer::fixed("Asha")
            .with_schedule(Schedule::daily(vec![TimeSlot::Morning, TimeSlot::Evening]))
            .with_slot_items(TimeSlot::Morning, vec![ItemSpec::new("milk", 1.0)])
            .with_slot_items(TimeSlot::Evening, vec![ItemSpec::new("milk", 0.5)]);
        let customers = vec![customer.clone()];
        let first = DeliveryService::plan(day(), &customers, &[], &catalog());
        assert_eq!(first.len(), 2);
        let second = DeliveryService::plan(day(), &customers, &first, &catalog());
        assert!(second.is_empty());

        let mut existing = first.clone();
        existing.extend(second);
        assert!(DeliveryService::plan(day(), &customers, &existing, &catalog()).is_empty());
    }

    #[test]
    fn slot_without_items_falls_back_to_legacy_list() {
        let mut customer = Customer::fixed("Asha")
            .with_schedule(Schedule::daily(vec![TimeSlot::Morning, TimeSlot::Evening]))
            .with_slot_items(TimeSlot::Morning, vec![ItemSpec::new("milk", 1.0)]);
        let planned = DeliveryService::plan(day(), &[customer.clone()], &[], &catalog());
        assert_eq!(planned.len(), 1);

        customer.default_items = vec![ItemSpec::new("milk", 2.0)];
        let planned = DeliveryService::plan(day(), &[customer], &[], &catalog());
        assert_eq!(planned.len(), 2);
        let evening = planned
            .iter()
            .find(|delivery| delivery.time_slot == TimeSlot::Evening)
            .unwrap();
        assert_eq!(evening.items[0].quantity, 2.0);
    }

    #[test]
    fn random_and_empty_customers_are_ignored() {
        let random = Customer::random("Walk");
        let empty = Customer::fixed("Empty").with_schedule(Schedule::daily(vec![]));
        let planned = DeliveryService::plan(day(), &[random, empty], &[], &catalog());
        assert!(planned.is_empty());
    }

    #[test]
    fn inactive_products_drop_out_of_templates() {
        let only_paneer = Customer::fixed("Ravi")
            .with_slot_items(TimeSlot::Morning, vec![ItemSpec::new("paneer", 1.0)]);
        let mixed = Customer::fixed("Meera").with_slot_items(
            TimeSlot::Morning,
            vec![ItemSpec::new("paneer", 1.0), ItemSpec::new("milk", 2.0)],
        );
        let planned = DeliveryService::plan(day(), &[only_paneer, mixed], &[], &catalog());
        assert_eq!(planned.len(), 1);
        assert_eq!(planned[0].customer_name, "Meera");
        assert_eq!(planned[0].items.len(), 1);
        assert_eq!(planned[0].items[0].price, 60.0);
    }

    #[test]
    fn non_qualifying_days_produce_nothing() {
        // 2024-06-03 is a Monday (1).
        let customer = Customer::fixed("Asha")
            .with_schedule(Schedule::on_weekdays(vec![0, 6], vec![TimeSlot::Morning]))
            .with_slot_items(TimeSlot::Morning, vec![ItemSpec::new("milk", 1.0)]);
        assert!(DeliveryService::plan(day(), &[customer], &[], &catalog()).is_empty());
    }
}
