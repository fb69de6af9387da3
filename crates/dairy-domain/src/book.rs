use serde::{Deserialize, Serialize};
use uuid::Uuid;

use chrono::NaiveDate;

use crate::{
    common::{BillingMonth, Identifiable, TimeSlot},
    customer::Customer,
    delivery::Delivery,
    monthly::MonthlyRecord,
    payment::Payment,
    product::Catalog,
    sale::Sale,
};

fn find_by_id<T: Identifiable>(items: &[T], id: Uuid) -> Option<&T> {
    items.iter().find(|item| item.id() == id)
}

fn find_by_id_mut<T: Identifiable>(items: &mut [T], id: Uuid) -> Option<&mut T> {
    items.iter_mut().find(|item| item.id() == id)
}

/// Every collection the shop keeps, held together in memory.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DairyBook {
    #[serde(default)]
    pub customers: Vec<Customer>,
    #[serde(default)]
    pub catalog: Catalog,
    #[serde(default)]
    pub deliveries: Vec<Delivery>,
    #[serde(default)]
    pub sales: Vec<Sale>,
    #[serde(default)]
    pub payments: Vec<Payment>,
    #[serde(default)]
    pub monthly_records: Vec<MonthlyRecord>,
}

impl DairyBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_catalog(catalog: Catalog) -> Self {
        Self {
            catalog,
            ..Self::default()
        }
    }

    pub fn customer(&self, id: Uuid) -> Option<&Customer> {
        find_by_id(&self.customers, id)
    }

    pub fn customer_mut(&mut self, id: Uuid) -> Option<&mut Customer> {
        find_by_id_mut(&mut self.customers, id)
    }

    pub fn delivery(&self, id: Uuid) -> Option<&Delivery> {
        find_by_id(&self.deliveries, id)
    }

    pub fn delivery_mut(&mut self, id: Uuid) -> Option<&mut Delivery> {
        find_by_id_mut(&mut self.deliveries, id)
    }

    pub fn sale(&self, id: Uuid) -> Option<&Sale> {
        find_by_id(&self.sales, id)
    }

    pub fn payment(&self, id: Uuid) -> Option<&Payment> {
        find_by_id(&self.payments, id)
    }

    pub fn has_delivery(&self, customer_id: Uuid, slot: TimeSlot, date: NaiveDate) -> bool {
        self.deliveries
            .iter()
            .any(|delivery| delivery.matches_key(customer_id, slot, date))
    }

    pub fn deliveries_on(&self, date: NaiveDate) -> impl Iterator<Item = &Delivery> {
        self.deliveries
            .iter()
            .filter(move |delivery| delivery.date == date)
    }

    pub fn record(&self, customer_id: Uuid, month: BillingMonth) -> Option<&MonthlyRecord> {
        self.monthly_records
            .iter()
            .find(|record| record.customer_id == customer_id && record.month == month)
    }

    pub fn record_mut(
        &mut self,
        customer_id: Uuid,
        month: BillingMonth,
    ) -> Option<&mut MonthlyRecord> {
        self.monthly_records
            .iter_mut()
            .find(|record| record.customer_id == customer_id && record.month == month)
    }

    /// Months with a record for the customer, oldest first.
    pub fn record_months(&self, customer_id: Uuid) -> Vec<BillingMonth> {
        let mut months: Vec<BillingMonth> = self
            .monthly_records
            .iter()
            .filter(|record| record.customer_id == customer_id)
            .map(|record| record.month)
            .collect();
        months.sort();
        months.dedup();
        months
    }

    pub fn records_for_month(&self, month: BillingMonth) -> impl Iterator<Item = &MonthlyRecord> {
        self.monthly_records
            .iter()
            .filter(move |record| record.month == month)
    }

    pub fn sales_for(&self, customer_id: Uuid) -> impl Iterator<Item = &Sale> {
        self.sales
            .iter()
            .filter(move |sale| sale.customer_id == Some(customer_id))
    }

    pub fn payments_for(&self, customer_id: Uuid) -> impl Iterator<Item = &Payment> {
        self.payments
            .iter()
            .filter(move |payment| payment.customer_id == customer_id)
    }

    pub fn fixed_customers(&self) -> impl Iterator<Item = &Customer> {
        self.customers.iter().filter(|customer| customer.is_fixed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{customer::Customer, delivery::Delivery};
    use chrono::Utc;

    #[test]
    fn record_months_are_sorted_and_unique() {
        let mut book = DairyBook::new();
        let customer = Customer::fixed("Asha");
        let id = customer.id;
        book.customers.push(customer);
        for month in ["2024-07", "2024-05", "2024-06"] {
            book.monthly_records.push(MonthlyRecord::open(
                id,
                "Asha",
                month.parse().unwrap(),
                0.0,
                Utc::now(),
            ));
        }
        let months: Vec<String> = book
            .record_months(id)
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(months, vec!["2024-05", "2024-06", "2024-07"]);
    }

    #[test]
    fn natural_key_lookup_ignores_walk_ins() {
        let mut book = DairyBook::new();
        let date = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let customer_id = Uuid::new_v4();
        book.deliveries.push(Delivery::pending(
            Some(customer_id),
            "Asha",
            date,
            TimeSlot::Morning,
            Vec::new(),
        ));
        assert!(book.has_delivery(customer_id, TimeSlot::Morning, date));
        assert!(!book.has_delivery(customer_id, TimeSlot::Evening, date));
    }
}
