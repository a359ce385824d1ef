//! Configuration structures for the order-book depth terminal.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Aggregate feeds written by the collectors that never hold a per-item book.
pub const DEFAULT_DENYLIST: [&str; 7] = [
    "steam_prices.csv",
    "tf2_orders.csv",
    "tf2_listings.csv",
    "supply_data.csv",
    "monitor_data.csv",
    "alerts.csv",
    "supply.csv",
];

/// Main configuration for the terminal.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Catalog discovery configuration.
    pub catalog: CatalogConfig,
    /// Read-through cache configuration.
    pub cache: CacheConfig,
    /// Depth curve configuration.
    pub depth: DepthConfig,
}

impl Config {
    /// Parse a configuration from JSON text.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Config = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&text)
    }

    /// Check invariants serde cannot express.
    pub fn validate(&self) -> Result<()> {
        if self.catalog.sniff_rows == 0 {
            return Err(Error::config("catalog.sniff_rows must be at least 1"));
        }
        if let Some(bad) = self
            .catalog
            .denylist
            .iter()
            .find(|name| name.is_empty() || name.contains('/') || name.contains('\\'))
        {
            return Err(Error::config(format!(
                "denylist entry {bad:?} must be a bare file name"
            )));
        }
        Ok(())
    }
}

/// Catalog discovery configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Directory scanned when no directory is selected explicitly.
    pub data_dir: PathBuf,
    /// File names never treated as order books (exact, case-sensitive).
    pub denylist: Vec<String>,
    /// Data rows read when sniffing a header.
    pub sniff_rows: usize,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("."),
            denylist: DEFAULT_DENYLIST.iter().map(|s| s.to_string()).collect(),
            sniff_rows: 2,
        }
    }
}

/// Read-through cache configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Whether catalog scans and loaded tables are cached at all.
    pub enabled: bool,
    /// Entry lifetime in seconds.
    pub ttl_secs: u64,
}

impl CacheConfig {
    /// Entry lifetime in milliseconds.
    pub fn ttl_ms(&self) -> i64 {
        i64::try_from(self.ttl_secs.saturating_mul(1000)).unwrap_or(i64::MAX)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl_secs: 30,
        }
    }
}

/// Depth curve configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DepthConfig {
    /// Merge same-price rows into one level before accumulating.
    pub aggregate_price_levels: bool,
}
