use chrono::{DateTime, Utc};
use dairy_core::Clock;

/// Wall clock. Shop date and hour are derived from it on every call.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
