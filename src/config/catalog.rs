//! Store configuration loading from config.toml
//!
//! The file carries store-wide settings and an optional list of categories
//! that are seeded into the database on startup when missing.

use crate::core::pricing::DEFAULT_LOW_STOCK_THRESHOLD;
use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::Path;

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Default, Deserialize)]
pub struct CatalogConfig {
    /// `[store]` table; defaults apply when absent
    #[serde(default)]
    pub store: StoreSettings,
    /// Categories to seed
    #[serde(default)]
    pub categories: Vec<CategorySeed>,
}

/// Store-wide settings used by the save workflows and reports.
#[derive(Debug, Clone, Deserialize)]
pub struct StoreSettings {
    /// Shown in log lines and reports
    #[serde(default = "default_store_name")]
    pub name: String,
    /// ISO currency code prices are expressed in
    #[serde(default = "default_currency")]
    pub currency: String,
    /// Stock at or below this value is reported as low
    #[serde(default = "default_low_stock_threshold")]
    pub low_stock_threshold: i32,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            name: default_store_name(),
            currency: default_currency(),
            low_stock_threshold: DEFAULT_LOW_STOCK_THRESHOLD,
        }
    }
}

fn default_store_name() -> String {
    "Shop".to_string()
}

fn default_currency() -> String {
    "USD".to_string()
}

const fn default_low_stock_threshold() -> i32 {
    DEFAULT_LOW_STOCK_THRESHOLD
}

/// A category to create on first run.
#[derive(Debug, Deserialize, Clone)]
pub struct CategorySeed {
    /// Root category name, matched by slug
    pub name: String,
    /// Used only when the category is created
    #[serde(default)]
    pub description: Option<String>,
    /// Subcategory names created under this one
    #[serde(default)]
    pub children: Vec<String>,
}

/// Loads the store configuration from a TOML file
///
/// # Errors
/// Returns an error if:
/// - The file cannot be read
/// - The TOML syntax is invalid
/// - `low_stock_threshold` is negative
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<CatalogConfig> {
    let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| Error::Config {
        message: format!("Failed to read config file: {e}"),
    })?;

    parse_config(&contents)
}

/// Parses the TOML text of a configuration file.
///
/// # Errors
/// Returns a `Config` error for invalid TOML or a negative
/// `low_stock_threshold`.
pub fn parse_config(contents: &str) -> Result<CatalogConfig> {
    let config: CatalogConfig = toml::from_str(contents).map_err(|e| Error::Config {
        message: format!("Failed to parse config.toml: {e}"),
    })?;

    if config.store.low_stock_threshold < 0 {
        return Err(Error::Config {
            message: "low_stock_threshold cannot be negative".to_string(),
        });
    }

    Ok(config)
}

/// Loads the configuration named by `SHOP_ADMIN_CONFIG`, or `./config.toml`.
///
/// A missing file is not an error: defaults are used and nothing is seeded.
///
/// # Errors
/// Returns an error if an existing file cannot be read or parsed.
pub fn load_default_config() -> Result<CatalogConfig> {
    let path = std::env::var("SHOP_ADMIN_CONFIG").unwrap_or_else(|_| "config.toml".to_string());
    if Path::new(&path).exists() {
        load_config(path)
    } else {
        tracing::warn!("No configuration file at {path}, using defaults");
        Ok(CatalogConfig::default())
    }
}
