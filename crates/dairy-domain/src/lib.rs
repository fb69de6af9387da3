//! dairy-domain
//!
//! Pure domain models (customers, catalog, deliveries, sales, payments, monthly records).
//! No I/O, no storage. Only data types, core enums, and record-local arithmetic.

pub mod book;
pub mod common;
pub mod customer;
pub mod delivery;
pub mod monthly;
pub mod payment;
pub mod product;
pub mod sale;

pub use book::*;
pub use common::*;
pub use customer::*;
pub use delivery::*;
pub use monthly::*;
pub use payment::*;
pub use product::*;
pub use sale::*;
