use chrono::{DateTime, NaiveDate, Utc};
use dairy_domain::{shop_date, shop_hour};

/// Clock abstracts access to the current timestamp so services remain deterministic in tests.
pub trait Clock: Send + Sync {
    /// Returns the current UTC timestamp.
    fn now(&self) -> DateTime<Utc>;

    /// Civil date in the shop timezone (UTC+05:30), whatever the host locale.
    fn today(&self) -> NaiveDate {
        shop_date(self.now())
    }

    /// Hour of day (0..=23) in the shop timezone.
    fn current_hour(&self) -> u32 {
        shop_hour(self.now())
    }
}

/// Clock pinned to a single instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    instant: DateTime<Utc>,
}

impl FixedClock {
    pub fn new(instant: DateTime<Utc>) -> Self {
        Self { instant }
    }

    pub fn set(&mut self, instant: DateTime<Utc>) {
        self.instant = instant;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.instant
    }
}
