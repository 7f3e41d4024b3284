//! Store configuration via `sqlstore.toml`
//!
//! Every field has a default, so an empty file (or no file at all, via
//! `StoreConfig::default()`) is a valid configuration. Settings are applied
//! to the SQLite connection when the store is opened.

use serde::{Deserialize, Serialize};
use sqlstore_core::{Error, Result};
use std::path::Path;

/// Conventional config file name, placed next to the database file.
pub const CONFIG_FILE_NAME: &str = "sqlstore.toml";

/// Store configuration loaded from `sqlstore.toml`.
///
/// # Example
///
/// ```toml
/// statement_cache_capacity = 64
/// busy_timeout_ms = 5000
/// journal_mode = "wal"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Capacity of the connection's prepared-statement cache.
    /// Each registered type uses seven statements; searches add their own.
    #[serde(default = "default_statement_cache_capacity")]
    pub statement_cache_capacity: usize,
    /// How long a statement waits on a locked database before failing.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    /// SQLite journal mode: `"delete"`, `"wal"` or `"memory"`.
    #[serde(default = "default_journal_mode")]
    pub journal_mode: String,
}

fn default_statement_cache_capacity() -> usize {
    64
}

fn default_busy_timeout_ms() -> u64 {
    5000
}

fn default_journal_mode() -> String {
    "wal".to_string()
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            statement_cache_capacity: default_statement_cache_capacity(),
            busy_timeout_ms: default_busy_timeout_ms(),
            journal_mode: default_journal_mode(),
        }
    }
}

impl StoreConfig {
    /// Parse the journal mode into the pragma value.
    ///
    /// # Errors
    ///
    /// Returns an error if the mode is not one of the supported values.
    pub fn journal_mode_pragma(&self) -> Result<&'static str> {
        match self.journal_mode.to_ascii_lowercase().as_str() {
            "delete" => Ok("DELETE"),
            "wal" => Ok("WAL"),
            "memory" => Ok("MEMORY"),
            other => Err(Error::config(format!(
                "Invalid journal mode '{}'. Expected \"delete\", \"wal\" or \"memory\".",
                other
            ))),
        }
    }

    /// Returns the default config file content with comments.
    pub fn default_toml() -> &'static str {
        r#"# sqlstore configuration
#
# Prepared statements kept per connection (default: 64).
# Each registered type uses seven; raise this when registering many types.
statement_cache_capacity = 64

# Milliseconds to wait on a locked database before failing (default: 5000).
busy_timeout_ms = 5000

# Journal mode: "delete", "wal" (default) or "memory".
journal_mode = "wal"
"#
    }

    /// Read and parse config from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        let config: StoreConfig = toml::from_str(&content).map_err(|e| {
            Error::config(format!(
                "Failed to parse config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        config.journal_mode_pragma()?;
        Ok(config)
    }

    /// Write the default config file if it does not already exist.
    pub fn write_default_if_missing(path: &Path) -> Result<()> {
        if !path.exists() {
            std::fs::write(path, Self::default_toml())?;
        }
        Ok(())
    }
}
