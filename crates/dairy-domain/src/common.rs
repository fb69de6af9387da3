//! Shared trait, calendar helpers, money rounding, and time slots.

use std::{fmt, str::FromStr};

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, NaiveDateTime, Offset, Timelike, Utc};
use serde::{de::Deserializer, Deserialize, Serialize, Serializer};
use uuid::Uuid;

/// Offset of the shop's civil clock from UTC (+05:30), independent of host locale.
pub const SHOP_UTC_OFFSET_SECS: i32 = 5 * 3600 + 30 * 60;

/// Exposes a stable identifier for entities stored in the book.
pub trait Identifiable {
    fn id(&self) -> Uuid;
}

/// The shop's civil timezone, UTC+05:30.
pub fn shop_offset() -> FixedOffset {
    FixedOffset::east_opt(SHOP_UTC_OFFSET_SECS).unwrap_or_else(|| Utc.fix())
}

/// Converts a UTC instant into the shop's wall-clock time.
pub fn shop_local(now: DateTime<Utc>) -> NaiveDateTime {
    now.with_timezone(&shop_offset()).naive_local()
}

/// Civil date in the shop timezone for the given instant.
pub fn shop_date(now: DateTime<Utc>) -> NaiveDate {
    shop_local(now).date()
}

/// Hour of day (0..=23) in the shop timezone for the given instant.
pub fn shop_hour(now: DateTime<Utc>) -> u32 {
    shop_local(now).hour()
}

/// Rounds half-up to two decimal places.
///
/// Halves always move toward positive infinity (`-1.125` becomes `-1.12`, `0.125` becomes
/// `0.13`), matching the behaviour stored ledgers were produced with.
pub fn round2(value: f64) -> f64 {
    round_scaled(value, 100.0)
}

/// Rounds half-up to whole currency units.
pub fn round_whole(value: f64) -> f64 {
    round_scaled(value, 1.0)
}

fn round_scaled(value: f64, scale: f64) -> f64 {
    // `+ 0.0` folds a negative zero into positive zero.
    ((value * scale + 0.5).floor() / scale) + 0.0
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
/// Recurring delivery window with a fixed start hour.
pub enum TimeSlot {
    Morning,
    Noon,
    Evening,
}

impl TimeSlot {
    pub const ALL: [TimeSlot; 3] = [TimeSlot::Morning, TimeSlot::Noon, TimeSlot::Evening];

    /// Hour (shop time) at which the slot opens.
    pub fn start_hour(self) -> u32 {
        match self {
            TimeSlot::Morning => 6,
            TimeSlot::Noon => 12,
            TimeSlot::Evening => 17,
        }
    }

    pub fn has_started(self, current_hour: u32) -> bool {
        current_hour >= self.start_hour()
    }
}

impl fmt::Display for TimeSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            TimeSlot::Morning => "morning",
            TimeSlot::Noon => "noon",
            TimeSlot::Evening => "evening",
        };
        f.write_str(label)
    }
}

/// Calendar month used to key monthly records, serialised as `YYYY-MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BillingMonth {
    year: i32,
    month: u32,
}

impl BillingMonth {
    pub fn new(year: i32, month: u32) -> Result<Self, MonthParseError> {
        if !(1..=12).contains(&month) {
            return Err(MonthParseError::OutOfRange(month));
        }
        Ok(Self { year, month })
    }

    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    /// Calendar predecessor; January rolls back to the previous year's December.
    pub fn previous(&self) -> Self {
        if self.month == 1 {
            Self {
                year: self.year - 1,
                month: 12,
            }
        } else {
            Self {
                year: self.year,
                month: self.month - 1,
            }
        }
    }

    pub fn next(&self) -> Self {
        if self.month == 12 {
            Self {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Self {
                year: self.year,
                month: self.month + 1,
            }
        }
    }

    pub fn first_day(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.year && date.month() == self.month
    }
}

impl fmt::Display for BillingMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for BillingMonth {
    type Err = MonthParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        let (year, month) = trimmed
            .split_once('-')
            .ok_or_else(|| MonthParseError::Malformed(trimmed.to_string()))?;
        if year.len() != 4 || month.len() != 2 {
            return Err(MonthParseError::Malformed(trimmed.to_string()));
        }
        let year: i32 = year
            .parse()
            .map_err(|_| MonthParseError::Malformed(trimmed.to_string()))?;
        let month: u32 = month
            .parse()
            .map_err(|_| MonthParseError::Malformed(trimmed.to_string()))?;
        BillingMonth::new(year, month)
    }
}

impl Serialize for BillingMonth {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for BillingMonth {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        value.parse().map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Errors that can occur when constructing [`BillingMonth`] values.
pub enum MonthParseError {
    Malformed(String),
    OutOfRange(u32),
}

impl fmt::Display for MonthParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MonthParseError::Malformed(raw) => write!(f, "`{raw}` is not a YYYY-MM month"),
            MonthParseError::OutOfRange(month) => write!(f, "month {month} is outside 1..=12"),
        }
    }
}

impl std::error::Error for MonthParseError {}
