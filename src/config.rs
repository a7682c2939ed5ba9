//! Configuration for FlatKV
//!
//! Centralized configuration with sensible defaults.

use std::path::PathBuf;

/// Main configuration for a FlatKV store
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Directory holding the store's files
    /// Internal structure:
    ///   {data_dir}/
    ///     ├── table        (binary segment)
    ///     └── index        (key/offset pairs)
    pub data_dir: PathBuf,

    // -------------------------------------------------------------------------
    // Durability Configuration
    // -------------------------------------------------------------------------
    /// fsync the new segment and index before renaming them into place,
    /// and the directory afterwards
    pub sync_on_flush: bool,

    // -------------------------------------------------------------------------
    // Recovery Configuration
    // -------------------------------------------------------------------------
    /// Cross-check the index against a full segment scan on open and
    /// rebuild it when they disagree
    pub verify_on_open: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./flatkv_data"),
            sync_on_flush: true,
            verify_on_open: true,
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
    /// Set the data directory
    pub fn data_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.data_dir = path.into();
        self
    }

    /// Enable or disable fsync during flush
    pub fn sync_on_flush(mut self, enabled: bool) -> Self {
        self.config.sync_on_flush = enabled;
        self
    }

    /// Enable or disable index verification on open
    pub fn verify_on_open(mut self, enabled: bool) -> Self {
        self.config.verify_on_open = enabled;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
