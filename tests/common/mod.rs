#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use dairy_config::Config;
use dairy_core::Clock;
use dairy_domain::{Customer, ItemSpec, Product, Schedule, TimeSlot};
use dairy_ledger::DairyManager;
use dairy_storage_json::{JsonCollectionStorage, StoragePaths};
use once_cell::sync::Lazy;
use tempfile::TempDir;

/// Holds TempDir guards so temporary folders live for the duration of the test run.
static TEST_DIRS: Lazy<Mutex<Vec<TempDir>>> = Lazy::new(|| Mutex::new(Vec::new()));

/// Clock shared between a test and the manager it drives.
#[derive(Clone)]
pub struct TestClock(Arc<Mutex<DateTime<Utc>>>);

impl TestClock {
    /// Clock reading `hour:00` shop time on `date`.
    pub fn at(date: NaiveDate, hour: u32) -> Self {
        Self(Arc::new(Mutex::new(shop_instant(date, hour))))
    }

    pub fn set(&self, date: NaiveDate, hour: u32) {
        *self.0.lock().expect("lock clock") = shop_instant(date, hour);
    }
}

impl Clock for TestClock {
    fn now(&self) -> DateTime<Utc> {
        *self.0.lock().expect("lock clock")
    }
}

/// UTC instant for a wall-clock hour at the shop (UTC+05:30).
pub fn shop_instant(date: NaiveDate, hour: u32) -> DateTime<Utc> {
    let local = date.and_hms_opt(hour, 0, 0).expect("valid hour");
    Utc.from_utc_datetime(&(local - Duration::minutes(330)))
}

pub fn june(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, day).expect("valid date")
}

/// Creates a unique base directory kept alive until the test binary exits.
pub fn temp_base() -> PathBuf {
    let temp = TempDir::new().expect("create temp dir");
    let base = temp.path().to_path_buf();
    TEST_DIRS.lock().expect("lock temp dir registry").push(temp);
    base
}

pub fn json_storage(base: &Path) -> JsonCollectionStorage {
    JsonCollectionStorage::with_retention(StoragePaths::under(base), 3)
        .expect("create json storage backend")
}

pub fn open_manager(base: &Path, clock: &TestClock, config: Config) -> DairyManager {
    DairyManager::open(Box::new(json_storage(base)), Box::new(clock.clone()), config)
        .expect("open manager")
}

/// Stocks milk (60), curd (25) and paneer (100).
pub fn stock_catalog(manager: &mut DairyManager) {
    for product in [
        Product::new("milk", "Milk", "litre", 60.0),
        Product::new("curd", "Curd", "cup", 25.0),
        Product::new("paneer", "Paneer", "pack", 100.0),
    ] {
        manager.upsert_product(product).expect("add product");
    }
}

/// Daily morning subscriber taking one litre of milk.
pub fn add_subscriber(manager: &mut DairyManager, name: &str) -> uuid::Uuid {
    let customer = Customer::fixed(name)
        .with_schedule(Schedule::daily(vec![TimeSlot::Morning]))
        .with_slot_items(TimeSlot::Morning, vec![ItemSpec::new("milk", 1.0)]);
    manager.add_customer(customer).expect("add customer")
}
