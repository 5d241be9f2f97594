//! Ledger bootstrap configuration
//!
//! Loaded from an optional TOML file passed with `--config`. Every field has a
//! default, so a partial file only overrides what it names:
//!
//! ```toml
//! administrators = ["0x00000000000000000000000000000000000000a1"]
//! backend_services = ["0x00000000000000000000000000000000000000b1"]
//! event_capacity = 4096
//! ```

use crate::core::DEFAULT_EVENT_CAPACITY;
use crate::types::AccountId;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised while loading a configuration file
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file '{path}': {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Config field {field} must not contain the zero account")]
    ZeroAccount { field: &'static str },
}

/// Initial roles and journal sizing for a fresh ledger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Accounts holding the Administrator role at startup
    pub administrators: Vec<AccountId>,

    /// Accounts holding the BackendService role at startup
    pub backend_services: Vec<AccountId>,

    /// Buffer size of the live event channel
    pub event_capacity: usize,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            administrators: vec![AccountId::from_low_u64(0xa1)],
            backend_services: vec![AccountId::from_low_u64(0xb1)],
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }
}

impl LedgerConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path` if given, otherwise use defaults
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.administrators.iter().any(AccountId::is_zero) {
            return Err(ConfigError::ZeroAccount {
                field: "administrators",
            });
        }
        if self.backend_services.iter().any(AccountId::is_zero) {
            return Err(ConfigError::ZeroAccount {
                field: "backend_services",
            });
        }
        Ok(())
    }
}
