//! Configuration for pagedb
//!
//! Centralized configuration with sensible defaults.

use std::path::PathBuf;

/// Main configuration for a pagedb database
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Root directory for all data files
    /// Internal structure:
    ///   {data_dir}/
    ///     ├── metadata.json              (catalog)
    ///     ├── {table}_{n}.csv            (page n of a table, 1-based)
    ///     └── {table}_key_index.json     (primary-key index)
    pub data_dir: PathBuf,

    // -------------------------------------------------------------------------
    // Paging Configuration
    // -------------------------------------------------------------------------
    /// Byte budget of one page. A new table's capacity (records per page) is
    /// derived from this once, at creation time.
    pub page_budget_bytes: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./pagedb_data"),
            page_budget_bytes: 4000,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the data directory (root for all storage)
    pub fn data_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.data_dir = path.into();
        self
    }

    /// Set the page byte budget used to size new tables
    pub fn page_budget_bytes(mut self, bytes: usize) -> Self {
        self.config.page_budget_bytes = bytes;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
