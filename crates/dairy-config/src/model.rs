use serde::{Deserialize, Serialize};
use std::{env, path::PathBuf};

use dairy_domain::SameDaySlots;

use crate::ConfigError;

/// Environment variable overriding the base directory for data, backups and config.
pub const HOME_ENV_VAR: &str = "DAIRY_LEDGER_HOME";

const DEFAULT_DIR_NAME: &str = "DairyLedger";

/// Shop-wide settings persisted next to the data collections.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    #[serde(default = "Config::default_shop_name")]
    pub shop_name: String,
    #[serde(default = "Config::default_locale")]
    pub locale: String,
    #[serde(default = "Config::default_currency_symbol")]
    pub currency_symbol: String,
    /// How same-date deliveries in different slots land in the monthly ledger.
    #[serde(default)]
    pub same_day_slots: SameDaySlots,
    #[serde(default = "Config::default_auto_generate")]
    pub auto_generate_deliveries: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backup_retention: Option<usize>,
    #[serde(default = "Config::default_log_filter")]
    pub log_filter: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// Optional custom directory for collection files. Defaults to `<base>/data`.
    pub data_root: Option<PathBuf>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// Optional custom directory for snapshots. Defaults to `<base>/backups`.
    pub backup_root: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            shop_name: Self::default_shop_name(),
            locale: Self::default_locale(),
            currency_symbol: Self::default_currency_symbol(),
            same_day_slots: SameDaySlots::default(),
            auto_generate_deliveries: Self::default_auto_generate(),
            backup_retention: None,
            log_filter: Self::default_log_filter(),
            data_root: None,
            backup_root: None,
        }
    }
}

impl Config {
    pub fn default_shop_name() -> String {
        "Dairy".into()
    }

    pub fn default_locale() -> String {
        "en-IN".into()
    }

    pub fn default_currency_symbol() -> String {
        "₹".into()
    }

    pub fn default_auto_generate() -> bool {
        true
    }

    pub fn default_log_filter() -> String {
        "dairy_ledger=info,dairy_core=info,dairy_storage_json=info,dairy_config=info".into()
    }

    /// `$DAIRY_LEDGER_HOME` when set, else `~/Documents/DairyLedger`.
    pub fn resolve_base_dir() -> PathBuf {
        if let Some(home) = env::var_os(HOME_ENV_VAR).filter(|value| !value.is_empty()) {
            return PathBuf::from(home);
        }

        let base = dirs::document_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."));

        base.join(DEFAULT_DIR_NAME)
    }

    pub fn resolve_data_root(&self) -> PathBuf {
        match &self.data_root {
            Some(path) => path.clone(),
            None => Self::resolve_base_dir().join("data"),
        }
    }

    pub fn resolve_backup_root(&self) -> PathBuf {
        match &self.backup_root {
            Some(path) => path.clone(),
            None => Self::resolve_base_dir().join("backups"),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.shop_name.trim().is_empty() {
            return Err(ConfigError::Invalid("shop name is required".into()));
        }
        if self.currency_symbol.trim().is_empty() {
            return Err(ConfigError::Invalid("currency symbol is required".into()));
        }
        if self.backup_retention == Some(0) {
            return Err(ConfigError::Invalid(
                "backup retention must keep at least one snapshot".into(),
            ));
        }
        Ok(())
    }
}
