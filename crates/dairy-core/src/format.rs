use chrono::NaiveDate;

use dairy_domain::{round2, round_whole};

/// Formats currency amounts for presentation.
pub trait CurrencyFormatter: Send + Sync {
    fn format_amount(&self, amount: f64) -> String;
}

/// Formats dates for presentation.
pub trait DateFormatter: Send + Sync {
    fn format_date(&self, date: NaiveDate) -> String;
}

/// Formatter using the shop's currency symbol and `DD/MM/YYYY` dates.
#[derive(Debug, Clone)]
pub struct ShopFormatter {
    pub currency_symbol: String,
}

impl ShopFormatter {
    pub fn new(currency_symbol: impl Into<String>) -> Self {
        Self {
            currency_symbol: currency_symbol.into(),
        }
    }
}

impl CurrencyFormatter for ShopFormatter {
    fn format_amount(&self, amount: f64) -> String {
        format_amount(amount, &self.currency_symbol)
    }
}

impl DateFormatter for ShopFormatter {
    fn format_date(&self, date: NaiveDate) -> String {
        date.format("%d/%m/%Y").to_string()
    }
}

/// Renders whole currency units with Indian digit grouping (`12,34,567`).
///
/// Stored values keep two decimals; only the display is rounded. Negative values keep
/// their sign.
pub fn format_amount(amount: f64, symbol: &str) -> String {
    let whole = round_whole(amount);
    let digits = format!("{:.0}", whole.abs());
    let grouped = group_indian(&digits);
    if whole < 0.0 {
        format!("-{symbol}{grouped}")
    } else {
        format!("{symbol}{grouped}")
    }
}

fn group_indian(digits: &str) -> String {
    if digits.len() <= 3 {
        return digits.to_string();
    }
    let (head, tail) = digits.split_at(digits.len() - 3);
    let mut groups: Vec<&str> = Vec::new();
    let mut end = head.len();
    while end > 0 {
        let start = end.saturating_sub(2);
        groups.push(&head[start..end]);
        end = start;
    }
    groups.reverse();
    format!("{},{}", groups.join(","), tail)
}

/// How a ledger balance reads to the customer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BalanceStanding {
    Due,
    Settled,
    /// Overpaid; the shop owes the customer.
    Advance,
}

impl BalanceStanding {
    pub fn of(balance: f64) -> Self {
        let balance = round2(balance);
        if balance > 0.0 {
            BalanceStanding::Due
        } else if balance < 0.0 {
            BalanceStanding::Advance
        } else {
            BalanceStanding::Settled
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            BalanceStanding::Due => "Due",
            BalanceStanding::Settled => "Settled",
            BalanceStanding::Advance => "Advance",
        }
    }
}
