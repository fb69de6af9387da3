#![doc(test(attr(deny(warnings))))]

//! Dairy Ledger tracks a neighbourhood dairy's recurring deliveries, counter sales,
//! payments and per-customer monthly ledgers.
//!
//! [`DairyManager`] is the entry point: it owns the in-memory book, persists every
//! change through a [`dairy_core::CollectionStorage`] backend and reads the current
//! time from a [`dairy_core::Clock`].

pub mod clock;
pub mod errors;
pub mod manager;
pub mod utils;

pub use clock::SystemClock;
pub use errors::{DairyError, DairyResult};
pub use manager::DairyManager;

/// Initializes global tracing with [`utils::DEFAULT_LOG_FILTER`].
pub fn init() {
    init_with_filter(utils::DEFAULT_LOG_FILTER);
}

/// Initializes global tracing with a configured directive, e.g. `Config::log_filter`.
pub fn init_with_filter(directive: &str) {
    utils::init_tracing(directive);
    let build = utils::build_info::current();
    tracing::info!(
        version = build.version,
        git_hash = build.git_hash,
        profile = build.profile,
        "Dairy Ledger tracing initialized."
    );
}
