//! dairy-config
//!
//! Persistent shop configuration.
//! Owns the Config data structure plus disk persistence and backup helpers.

pub mod error;
pub mod manager;
pub mod model;

pub use error::ConfigError;
pub use manager::ConfigManager;
pub use model::{Config, HOME_ENV_VAR};
