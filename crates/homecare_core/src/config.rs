//! Runtime configuration read from `HOMECARE_*` environment variables.
//!
//! # Invariants
//! - Every key has a default; an empty environment yields a usable
//!   in-memory configuration.
//! - Blank values are treated as unset.

use crate::logging::default_log_level;
use crate::store::{SqliteDocumentStore, StoreResult};
use std::path::PathBuf;
use thiserror::Error;

pub const ENV_DB_PATH: &str = "HOMECARE_DB_PATH";
pub const ENV_STORE_SLOT: &str = "HOMECARE_STORE_SLOT";
pub const ENV_LOG_LEVEL: &str = "HOMECARE_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "HOMECARE_LOG_DIR";

pub const DEFAULT_STORE_SLOT: &str = "homecare-db";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{key} must not be blank")]
    Blank { key: &'static str },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreConfig {
    /// SQLite file; `None` keeps the document in memory.
    pub db_path: Option<PathBuf>,
    pub store_slot: String,
    pub log_level: String,
    /// Logging stays off when unset.
    pub log_dir: Option<PathBuf>,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            db_path: None,
            store_slot: DEFAULT_STORE_SLOT.to_string(),
            log_level: default_log_level().to_string(),
            log_dir: None,
        }
    }
}

impl CoreConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(std::env::vars())
    }

    /// Builds config from explicit key/value pairs. Unrelated keys are ignored.
    pub fn from_vars<I, K, V>(vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut config = Self::default();
        for (key, value) in vars {
            let value: String = value.into();
            let trimmed = value.trim();
            match key.as_ref() {
                ENV_DB_PATH if !trimmed.is_empty() => config.db_path = Some(PathBuf::from(trimmed)),
                ENV_STORE_SLOT if trimmed.is_empty() => {
                    return Err(ConfigError::Blank {
                        key: ENV_STORE_SLOT,
                    })
                }
                ENV_STORE_SLOT => config.store_slot = trimmed.to_string(),
                ENV_LOG_LEVEL if !trimmed.is_empty() => config.log_level = trimmed.to_string(),
                ENV_LOG_DIR if !trimmed.is_empty() => config.log_dir = Some(PathBuf::from(trimmed)),
                _ => {}
            }
        }
        Ok(config)
    }
}

/// Opens the store described by `config`.
pub fn open_store(config: &CoreConfig) -> StoreResult<SqliteDocumentStore> {
    match &config.db_path {
        Some(path) => SqliteDocumentStore::open(path, config.store_slot.as_str()),
        None => SqliteDocumentStore::open_in_memory(config.store_slot.as_str()),
    }
}

#[cfg(test)]
mod tests {
    use super::{open_store, ConfigError, CoreConfig, DEFAULT_STORE_SLOT};
    use crate::store::DocumentStore;
    use std::path::PathBuf;

    #[test]
    fn empty_environment_uses_defaults() {
        let config = CoreConfig::from_vars(Vec::<(String, String)>::new()).unwrap();
        assert_eq!(config, CoreConfig::default());
        assert_eq!(config.store_slot, DEFAULT_STORE_SLOT);
        assert!(config.db_path.is_none());
    }

    #[test]
    fn reads_known_keys_and_ignores_others() {
        let config = CoreConfig::from_vars([
            ("HOMECARE_DB_PATH", " /var/lib/homecare/db.sqlite "),
            ("HOMECARE_STORE_SLOT", "ward-3"),
            ("HOMECARE_LOG_LEVEL", "warn"),
            ("HOMECARE_LOG_DIR", ""),
            ("PATH", "/usr/bin"),
        ])
        .unwrap();
        assert_eq!(
            config.db_path,
            Some(PathBuf::from("/var/lib/homecare/db.sqlite"))
        );
        assert_eq!(config.store_slot, "ward-3");
        assert_eq!(config.log_level, "warn");
        assert!(config.log_dir.is_none());
    }

    #[test]
    fn blank_slot_is_rejected() {
        let err = CoreConfig::from_vars([("HOMECARE_STORE_SLOT", "  ")]).unwrap_err();
        assert_eq!(
            err,
            ConfigError::Blank {
                key: "HOMECARE_STORE_SLOT"
            }
        );
    }

    #[test]
    fn open_store_defaults_to_memory() {
        let store = open_store(&CoreConfig::default()).unwrap();
        assert_eq!(store.slot(), DEFAULT_STORE_SLOT);
        assert!(store.load().unwrap().is_none());
    }
}
