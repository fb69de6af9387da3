//! dairy-core
//!
//! Business logic for the dairy delivery and billing ledger.
//! Depends on dairy-domain. No terminal I/O, no direct storage interactions.

pub mod customer_service;
pub mod delivery_service;
pub mod dues_service;
pub mod error;
pub mod format;
pub mod ledger_service;
pub mod pos_service;
pub mod product_service;
pub mod storage;
pub mod time;
pub mod validation;

pub use customer_service::*;
pub use delivery_service::*;
pub use dues_service::*;
pub use error::{CoreError, CoreResult};
pub use format::*;
pub use ledger_service::*;
pub use pos_service::*;
pub use product_service::*;
pub use storage::*;
pub use time::*;
