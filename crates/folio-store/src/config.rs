//! Store configuration
//!
//! Connection parameters arrive as one bundle, usually from a YAML file:
//!
//! ```yaml
//! driver: sqlite
//! address: ./portfolio.db
//! batch_size: 250
//! master_key: "base64 of 32 random bytes"
//! ```

use crate::errors::{config_error, io_error, Result};
use folio_core::dialect::DriverKind;
use folio_core_types::Sensitive;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub const DEFAULT_BATCH_SIZE: usize = 100;

/// Address that selects a private in-memory SQLite database
pub const IN_MEMORY: &str = ":memory:";

fn default_batch_size() -> usize {
    DEFAULT_BATCH_SIZE
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreConfig {
    pub driver: DriverKind,

    /// File path for SQLite, host/database for server drivers
    pub address: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<Sensitive<String>>,

    /// Writes between intermediate commits during synchronize
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Base64 key that wraps every key set's data key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub master_key: Option<Sensitive<String>>,
}

impl StoreConfig {
    pub fn sqlite(address: impl Into<String>) -> Self {
        Self {
            driver: DriverKind::Sqlite,
            address: address.into(),
            user: None,
            password: None,
            batch_size: DEFAULT_BATCH_SIZE,
            master_key: None,
        }
    }

    pub fn in_memory() -> Self {
        Self::sqlite(IN_MEMORY)
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_master_key(mut self, encoded: impl Into<String>) -> Self {
        self.master_key = Some(Sensitive::new(encoded.into()));
        self
    }

    pub fn is_in_memory(&self) -> bool {
        self.address == IN_MEMORY
    }

    pub fn validate(&self) -> Result<()> {
        if self.address.trim().is_empty() {
            return Err(config_error("address must not be empty"));
        }
        if self.batch_size == 0 {
            return Err(config_error("batch_size must be at least 1"));
        }
        Ok(())
    }
}

/// Load and validate a configuration file
pub fn load_config(path: &Path) -> Result<StoreConfig> {
    let content = fs::read_to_string(path).map_err(|e| io_error("config_load", e))?;
    parse_config_str(&content)
}

pub fn parse_config_str(content: &str) -> Result<StoreConfig> {
    let config: StoreConfig = serde_yaml::from_str(content)
        .map_err(|e| config_error(&format!("YAML parse error: {}", e)))?;
    config.validate()?;
    Ok(config)
}
