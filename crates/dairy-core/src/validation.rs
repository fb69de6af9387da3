//! Business-rule checks applied before any collection is mutated.
//!
//! Every validator returns [`CoreError::Validation`] with a message naming the
//! offending field, so callers can surface it without further mapping.

use dairy_domain::{Customer, CustomerKind, ItemSpec, Product, Schedule};

use crate::{CoreError, CoreResult};

const MAX_NAME_LEN: usize = 100;

/// Rejects blank or overly long names.
pub fn validate_name(field: &str, value: &str) -> CoreResult<()> {
    let value = value.trim();
    if value.is_empty() {
        return Err(CoreError::Validation(format!("{field} is required")));
    }
    if value.chars().count() > MAX_NAME_LEN {
        return Err(CoreError::Validation(format!(
            "{field} must be at most {MAX_NAME_LEN} characters"
        )));
    }
    Ok(())
}

/// Quantities must be finite and strictly positive.
pub fn validate_quantity(quantity: f64) -> CoreResult<()> {
    if !quantity.is_finite() || quantity <= 0.0 {
        return Err(CoreError::Validation(format!(
            "quantity must be greater than zero (got {quantity})"
        )));
    }
    Ok(())
}

/// Amounts may be zero but never negative.
pub fn validate_amount(field: &str, amount: f64) -> CoreResult<()> {
    if !amount.is_finite() || amount < 0.0 {
        return Err(CoreError::Validation(format!(
            "{field} must not be negative (got {amount})"
        )));
    }
    Ok(())
}

/// Standalone payments must move money.
pub fn validate_payment_amount(amount: f64) -> CoreResult<()> {
    if !amount.is_finite() || amount <= 0.0 {
        return Err(CoreError::Validation(format!(
            "payment amount must be greater than zero (got {amount})"
        )));
    }
    Ok(())
}

pub fn validate_items(items: &[ItemSpec]) -> CoreResult<()> {
    if items.is_empty() {
        return Err(CoreError::Validation("at least one item is required".into()));
    }
    for item in items {
        validate_name("product id", &item.product_id)?;
        validate_quantity(item.quantity)?;
    }
    Ok(())
}

pub fn validate_schedule(schedule: &Schedule) -> CoreResult<()> {
    if let Some(day) = schedule.days.iter().find(|day| **day > 6) {
        return Err(CoreError::Validation(format!(
            "schedule weekday {day} is outside 0..=6"
        )));
    }
    if let Some(date) = schedule
        .dates
        .iter()
        .find(|date| !(1..=31).contains(*date))
    {
        return Err(CoreError::Validation(format!(
            "schedule date {date} is outside 1..=31"
        )));
    }
    Ok(())
}

pub fn validate_customer(customer: &Customer) -> CoreResult<()> {
    validate_name("customer name", &customer.name)?;
    if customer.kind == CustomerKind::Random {
        if customer.schedule.is_some() {
            return Err(CoreError::Validation(
                "random customers cannot have a delivery schedule".into(),
            ));
        }
        if customer.has_default_items() {
            return Err(CoreError::Validation(
                "random customers cannot have default items".into(),
            ));
        }
    }
    if let Some(schedule) = customer.schedule.as_ref() {
        validate_schedule(schedule)?;
    }
    let slot_items = customer.default_items_by_slot.values().flatten();
    for item in customer.default_items.iter().chain(slot_items) {
        validate_name("product id", &item.product_id)?;
        validate_quantity(item.quantity)?;
    }
    Ok(())
}

pub fn validate_product(product: &Product) -> CoreResult<()> {
    validate_name("product id", &product.id)?;
    validate_name("product name", &product.name)?;
    validate_name("product unit", &product.unit)?;
    validate_amount("product price", product.price)
}

#[cfg(test)]
mod tests {
    use super::*;
    use dairy_domain::TimeSlot;

    #[test]
    fn blank_names_are_rejected() {
        assert!(validate_name("customer name", "   ").is_err());
        assert!(validate_name("customer name", "Asha").is_ok());
    }

    #[test]
    fn random_customers_cannot_carry_a_schedule() {
        let customer =
            Customer::random("Walk").with_schedule(Schedule::daily(vec![TimeSlot::Morning]));
        let err = validate_customer(&customer).unwrap_err();
        assert!(err.to_string().contains("schedule"));
    }

    #[test]
    fn schedule_ranges_are_enforced() {
        assert!(validate_schedule(&Schedule::on_weekdays(vec![7], vec![])).is_err());
        assert!(validate_schedule(&Schedule::on_dates(vec![0], vec![])).is_err());
        assert!(validate_schedule(&Schedule::on_dates(vec![31], vec![])).is_ok());
    }

    #[test]
    fn amounts_and_quantities() {
        assert!(validate_amount("price", 0.0).is_ok());
        assert!(validate_amount("price", -1.0).is_err());
        assert!(validate_payment_amount(0.0).is_err());
        assert!(validate_quantity(f64::NAN).is_err());
        assert!(validate_items(&[]).is_err());
    }
}
