use chrono::{DateTime, NaiveDate, Utc};
use tracing::{info, warn};
use uuid::Uuid;

use dairy_config::Config;
use dairy_core::{
    book_warnings, Clock, CloseSummary, Collection, CollectionStorage, CounterSale,
    CustomerDue, CustomerService, DailyStats, Dashboard, DeliveryService, DuesService,
    LedgerService, MonthlyStats, PosService, ProductService, Settlement, ShopFormatter,
    SnapshotInfo, StandingOrderLine,
};
use dairy_domain::{
    BillingMonth, Customer, DairyBook, Delivery, ItemSpec, MonthlyRecord, PaymentMode,
    PaymentType, Product, SameDaySlots, SkipReason, TimeSlot, WalkInContact,
};
use dairy_storage_json::{JsonCollectionStorage, StoragePaths, DEFAULT_RETENTION};

use crate::clock::SystemClock;
use crate::errors::{DairyError, DairyResult};

const SETTLEMENT_COLLECTIONS: [Collection; 4] = [
    Collection::Customers,
    Collection::Deliveries,
    Collection::Sales,
    Collection::MonthlyRecords,
];

/// Facade that owns the shop's book and keeps storage in step with it.
///
/// Every mutation runs against a draft copy. The collections it touches are written
/// first and the draft replaces the current book only when all writes succeed, so a
/// failed operation leaves both memory and storage as they were.
pub struct DairyManager {
    book: DairyBook,
    storage: Box<dyn CollectionStorage>,
    clock: Box<dyn Clock>,
    config: Config,
}

impl DairyManager {
    /// Loads every collection and, when enabled, generates today's deliveries.
    pub fn open(
        storage: Box<dyn CollectionStorage>,
        clock: Box<dyn Clock>,
        config: Config,
    ) -> DairyResult<Self> {
        let book = storage.load_book()?;
        for warning in book_warnings(&book) {
            warn!(%warning, "loaded book has dangling references");
        }
        info!(
            shop = %config.shop_name,
            customers = book.customers.len(),
            deliveries = book.deliveries.len(),
            records = book.monthly_records.len(),
            "book loaded"
        );

        let mut manager = Self {
            book,
            storage,
            clock,
            config,
        };
        if manager.config.auto_generate_deliveries {
            manager.generate_today()?;
        }
        Ok(manager)
    }

    /// Opens the JSON store under the configured roots with the system clock.
    ///
    /// Also installs tracing with `config.log_filter` unless a subscriber is already set.
    pub fn from_config(config: Config) -> DairyResult<Self> {
        config.validate()?;
        crate::init_with_filter(&config.log_filter);
        let paths = StoragePaths {
            data_root: config.resolve_data_root(),
            backup_root: config.resolve_backup_root(),
        };
        let retention = config.backup_retention.unwrap_or(DEFAULT_RETENTION);
        info!(
            shop = %config.shop_name,
            locale = %config.locale,
            data_root = %paths.data_root.display(),
            retention,
            "opening shop"
        );
        let storage = JsonCollectionStorage::with_retention(paths, retention)?;
        Self::open(Box::new(storage), Box::new(SystemClock), config)
    }

    pub fn book(&self) -> &DairyBook {
        &self.book
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Display formatter using the configured currency symbol.
    pub fn formatter(&self) -> ShopFormatter {
        ShopFormatter::new(self.config.currency_symbol.clone())
    }

    pub fn policy(&self) -> SameDaySlots {
        self.config.same_day_slots
    }

    pub fn storage(&self) -> &dyn CollectionStorage {
        self.storage.as_ref()
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    // Customers and catalog.

    pub fn add_customer(&mut self, customer: Customer) -> DairyResult<Uuid> {
        self.commit(&[Collection::Customers], |book, _| {
            CustomerService::add(book, customer)
        })
    }

    pub fn edit_customer(&mut self, id: Uuid, changes: Customer) -> DairyResult<()> {
        self.commit(&[Collection::Customers], |book, _| {
            CustomerService::edit(book, id, changes)
        })
    }

    /// Deletes the customer record only; history stays in the other collections.
    pub fn remove_customer(&mut self, id: Uuid) -> DairyResult<Customer> {
        self.commit(&[Collection::Customers], |book, _| {
            CustomerService::remove(book, id)
        })
    }

    pub fn upsert_product(&mut self, product: Product) -> DairyResult<()> {
        self.commit(&[Collection::Products], |book, _| {
            ProductService::upsert(book, product)
        })
    }

    pub fn set_price(&mut self, product_id: &str, price: f64) -> DairyResult<()> {
        self.commit(&[Collection::Products], |book, _| {
            ProductService::set_price(book, product_id, price)
        })
    }

    pub fn set_product_active(&mut self, product_id: &str, active: bool) -> DairyResult<()> {
        self.commit(&[Collection::Products], |book, _| {
            ProductService::set_active(book, product_id, active)
        })
    }

    // Deliveries.

    /// Generates the recurring deliveries due today. Safe to call repeatedly.
    pub fn generate_today(&mut self) -> DairyResult<Vec<Uuid>> {
        let today = self.clock.today();
        let planned = DeliveryService::plan(
            today,
            &self.book.customers,
            &self.book.deliveries,
            &self.book.catalog,
        );
        if planned.is_empty() {
            return Ok(Vec::new());
        }
        self.commit(&[Collection::Deliveries], |book, _| {
            Ok(DeliveryService::generate(book, today))
        })
    }

    pub fn add_one_time_delivery(
        &mut self,
        customer_id: Uuid,
        date: NaiveDate,
        slot: TimeSlot,
        items: &[ItemSpec],
    ) -> DairyResult<Uuid> {
        self.commit(&[Collection::Deliveries], |book, _| {
            DeliveryService::add_one_time(book, customer_id, date, slot, items)
        })
    }

    pub fn add_walk_in(
        &mut self,
        contact: WalkInContact,
        date: NaiveDate,
        slot: TimeSlot,
        items: &[ItemSpec],
    ) -> DairyResult<Uuid> {
        self.commit(&[Collection::Deliveries], |book, _| {
            DeliveryService::add_walk_in(book, contact, date, slot, items)
        })
    }

    pub fn mark_delivered(&mut self, delivery_id: Uuid) -> DairyResult<Settlement> {
        let policy = self.policy();
        self.commit(&SETTLEMENT_COLLECTIONS, |book, now| {
            PosService::mark_delivered(book, delivery_id, policy, now)
        })
    }

    pub fn submit_payment(
        &mut self,
        delivery_id: Uuid,
        mode: PaymentType,
        amount: Option<f64>,
    ) -> DairyResult<Settlement> {
        let policy = self.policy();
        self.commit(&SETTLEMENT_COLLECTIONS, |book, now| {
            PosService::submit_payment(book, delivery_id, mode, amount, policy, now)
        })
    }

    /// Returns whether a monthly record was updated.
    pub fn skip(
        &mut self,
        delivery_id: Uuid,
        reason: SkipReason,
        note: Option<String>,
    ) -> DairyResult<bool> {
        let policy = self.policy();
        self.commit(
            &[Collection::Deliveries, Collection::MonthlyRecords],
            |book, now| PosService::skip(book, delivery_id, reason, note, policy, now),
        )
    }

    pub fn add_extra_items(&mut self, delivery_id: Uuid, items: &[ItemSpec]) -> DairyResult<()> {
        self.commit(&[Collection::Deliveries], |book, _| {
            PosService::add_extra_items(book, delivery_id, items)
        })
    }

    // Sales and payments.

    pub fn counter_sale(&mut self, sale: CounterSale) -> DairyResult<Uuid> {
        self.commit(&[Collection::Sales], |book, now| {
            PosService::counter_sale(book, sale, now)
        })
    }

    pub fn record_payment(
        &mut self,
        customer_id: Uuid,
        amount: f64,
        mode: PaymentMode,
        date: NaiveDate,
        note: Option<String>,
    ) -> DairyResult<Uuid> {
        self.commit(
            &[Collection::Payments, Collection::MonthlyRecords],
            |book, now| PosService::record_payment(book, customer_id, amount, mode, date, note, now),
        )
    }

    // Monthly ledger.

    pub fn initialize_month(&mut self, month: BillingMonth) -> DairyResult<Vec<Uuid>> {
        self.commit(&[Collection::MonthlyRecords], |book, now| {
            LedgerService::initialize_month(book, month, now)
        })
    }

    pub fn close_month(&mut self, month: BillingMonth) -> DairyResult<CloseSummary> {
        self.commit(&[Collection::MonthlyRecords], |book, now| {
            LedgerService::close_month(book, month, now)
        })
    }

    pub fn mark_billed(&mut self, customer_id: Uuid, month: BillingMonth) -> DairyResult<()> {
        self.commit(&[Collection::MonthlyRecords], |book, now| {
            LedgerService::mark_billed(book, customer_id, month, now)
        })
    }

    // Backups.

    pub fn backup(&self, note: Option<&str>) -> DairyResult<SnapshotInfo> {
        let info = self.storage.backup(note)?;
        info!(backup = %info.id, "snapshot created");
        Ok(info)
    }

    pub fn list_backups(&self) -> DairyResult<Vec<SnapshotInfo>> {
        Ok(self.storage.list_backups()?)
    }

    /// Restores a snapshot by id and replaces the in-memory book with it.
    pub fn restore_backup(&mut self, backup_id: &str) -> DairyResult<()> {
        let info = self
            .storage
            .list_backups()?
            .into_iter()
            .find(|entry| entry.id == backup_id)
            .ok_or_else(|| DairyError::BackupNotFound(backup_id.to_string()))?;
        self.book = self.storage.restore_backup(&info)?;
        info!(backup = %info.id, "snapshot restored");
        Ok(())
    }

    // Views.

    pub fn customer_due(&self, customer_id: Uuid) -> f64 {
        DuesService::customer_due(&self.book, customer_id)
    }

    pub fn canonical_due(&self, customer_id: Uuid) -> DairyResult<CustomerDue> {
        let month = BillingMonth::from_date(self.today());
        Ok(DuesService::canonical_due(&self.book, customer_id, month)?)
    }

    pub fn due_list(&self) -> Vec<CustomerDue> {
        DuesService::due_list(&self.book, BillingMonth::from_date(self.today()))
    }

    pub fn daily_stats(&self, date: NaiveDate) -> DailyStats {
        DuesService::daily_stats(&self.book, date)
    }

    pub fn monthly_stats(&self, month: BillingMonth) -> MonthlyStats {
        DuesService::monthly_stats(&self.book, month)
    }

    pub fn dashboard(&self) -> Dashboard {
        DuesService::dashboard(&self.book, self.today())
    }

    /// Today's pending deliveries whose slot has already started.
    pub fn started_pending(&self) -> Vec<&Delivery> {
        DeliveryService::started_pending(&self.book, self.today(), self.clock.current_hour())
    }

    pub fn statement(&self, customer_id: Uuid, month: BillingMonth) -> DairyResult<&MonthlyRecord> {
        Ok(LedgerService::statement(&self.book, customer_id, month)?)
    }

    pub fn standing_order(
        &self,
        customer_id: Uuid,
        slot: TimeSlot,
    ) -> DairyResult<Vec<StandingOrderLine>> {
        Ok(CustomerService::standing_order(&self.book, customer_id, slot)?)
    }

    fn commit<T, F>(&mut self, touched: &[Collection], op: F) -> DairyResult<T>
    where
        F: FnOnce(&mut DairyBook, DateTime<Utc>) -> dairy_core::CoreResult<T>,
    {
        let mut draft = self.book.clone();
        let value = op(&mut draft, self.clock.now())?;

        for (index, collection) in touched.iter().enumerate() {
            if let Err(err) = self.storage.save_collection(&draft, *collection) {
                for written in &touched[..index] {
                    if let Err(rollback) = self.storage.save_collection(&self.book, *written) {
                        warn!(collection = %written, error = %rollback, "rollback write failed");
                    }
                }
                return Err(err.into());
            }
        }

        self.book = draft;
        Ok(value)
    }
}
