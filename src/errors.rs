use thiserror::Error;

use dairy_config::ConfigError;
use dairy_core::CoreError;

/// Failures surfaced by [`crate::DairyManager`].
#[derive(Debug, Error)]
pub enum DairyError {
    #[error(transparent)]
    Core(#[from] CoreError),
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("Backup not found: {0}")]
    BackupNotFound(String),
}

pub type DairyResult<T> = Result<T, DairyError>;
