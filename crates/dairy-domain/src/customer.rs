//! Customers and their recurring delivery schedules.

use std::{collections::BTreeMap, fmt};

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::common::*;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Customer {
    pub id: Uuid,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    pub kind: CustomerKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schedule: Option<Schedule>,
    /// Legacy flat item list, used for any slot without its own list.
    #[serde(default)]
    pub default_items: Vec<ItemSpec>,
    #[serde(default)]
    pub default_items_by_slot: BTreeMap<TimeSlot, Vec<ItemSpec>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Customer {
    pub fn new(name: impl Into<String>, kind: CustomerKind) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            phone: None,
            address: None,
            kind,
            schedule: None,
            default_items: Vec::new(),
            default_items_by_slot: BTreeMap::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn fixed(name: impl Into<String>) -> Self {
        Self::new(name, CustomerKind::Fixed)
    }

    pub fn random(name: impl Into<String>) -> Self {
        Self::new(name, CustomerKind::Random)
    }

    pub fn with_schedule(mut self, schedule: Schedule) -> Self {
        self.schedule = Some(schedule);
        self
    }

    pub fn with_slot_items(mut self, slot: TimeSlot, items: Vec<ItemSpec>) -> Self {
        self.default_items_by_slot.insert(slot, items);
        self
    }

    pub fn is_fixed(&self) -> bool {
        self.kind == CustomerKind::Fixed
    }

    /// `true` when either the legacy list or any per-slot list carries items.
    pub fn has_default_items(&self) -> bool {
        !self.default_items.is_empty()
            || self
                .default_items_by_slot
                .values()
                .any(|items| !items.is_empty())
    }

    /// Items for `slot`, falling back to the legacy flat list when the slot has none.
    pub fn items_for_slot(&self, slot: TimeSlot) -> &[ItemSpec] {
        match self.default_items_by_slot.get(&slot) {
            Some(items) if !items.is_empty() => items,
            _ => &self.default_items,
        }
    }

    /// Customers without a schedule qualify every day.
    pub fn delivers_on(&self, date: NaiveDate) -> bool {
        self.schedule
            .as_ref()
            .map_or(true, |schedule| schedule.qualifies(date))
    }

    pub fn delivery_slots(&self) -> Vec<TimeSlot> {
        self.schedule
            .as_ref()
            .map(Schedule::slots)
            .unwrap_or_else(|| vec![TimeSlot::Morning])
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

impl Identifiable for Customer {
    fn id(&self) -> Uuid {
        self.id
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum CustomerKind {
    /// Subscriber with a recurring schedule and a monthly ledger.
    Fixed,
    /// Ad-hoc buyer whose dues are tracked per sale.
    Random,
}

impl fmt::Display for CustomerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            CustomerKind::Fixed => "fixed",
            CustomerKind::Random => "random",
        };
        f.write_str(label)
    }
}

/// A product reference with the quantity to deliver or sell.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ItemSpec {
    pub product_id: String,
    pub quantity: f64,
}

impl ItemSpec {
    pub fn new(product_id: impl Into<String>, quantity: f64) -> Self {
        Self {
            product_id: product_id.into(),
            quantity,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Schedule {
    pub frequency: Frequency,
    #[serde(default)]
    pub time_slots: Vec<TimeSlot>,
    /// Weekdays counted from Sunday (0) to Saturday (6).
    #[serde(default)]
    pub days: Vec<u32>,
    /// Days of the month (1..=31).
    #[serde(default)]
    pub dates: Vec<u32>,
}

impl Schedule {
    pub fn daily(time_slots: Vec<TimeSlot>) -> Self {
        Self {
            frequency: Frequency::Daily,
            time_slots,
            days: Vec::new(),
            dates: Vec::new(),
        }
    }

    pub fn on_weekdays(days: Vec<u32>, time_slots: Vec<TimeSlot>) -> Self {
        Self {
            frequency: Frequency::SpecificDays,
            time_slots,
            days,
            dates: Vec::new(),
        }
    }

    pub fn on_dates(dates: Vec<u32>, time_slots: Vec<TimeSlot>) -> Self {
        Self {
            frequency: Frequency::SpecificDates,
            time_slots,
            days: Vec::new(),
            dates,
        }
    }

    pub fn qualifies(&self, date: NaiveDate) -> bool {
        match self.frequency {
            Frequency::Daily => true,
            Frequency::Weekly | Frequency::SpecificDays => self
                .days
                .contains(&date.weekday().num_days_from_sunday()),
            Frequency::SpecificDates => self.dates.contains(&date.day()),
        }
    }

    /// Configured slots, defaulting to morning only.
    pub fn slots(&self) -> Vec<TimeSlot> {
        if self.time_slots.is_empty() {
            vec![TimeSlot::Morning]
        } else {
            self.time_slots.clone()
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Frequency {
    Daily,
    Weekly,
    SpecificDays,
    SpecificDates,
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Frequency::Daily => "Daily",
            Frequency::Weekly => "Weekly",
            Frequency::SpecificDays => "Specific Days",
            Frequency::SpecificDates => "Specific Dates",
        };
        f.write_str(label)
    }
}
