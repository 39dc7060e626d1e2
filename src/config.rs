// src/config.rs
//
// Focused configuration records, one per feature, composed into
// EngineConfig by the caller. Every record deserializes from JSON with
// all fields optional, so a config file only states what it changes.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

#[derive(Debug)]
pub enum ConfigError {
    Io(String),
    Parse(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(msg) => write!(f, "Config read error: {msg}"),
            ConfigError::Parse(msg) => write!(f, "Config parse error: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Where the comparable store lives and how long to wait for it.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub path: String,
    /// Wait this long on a locked store before giving up.
    pub busy_timeout_ms: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: "market.sqlite3".to_string(),
            busy_timeout_ms: 10_000,
        }
    }
}

/// Tables mapping zips to counties and counties to regions.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GeoConfig {
    pub zip_county_table: String,
    pub counties_table: String,
}

impl Default for GeoConfig {
    fn default() -> Self {
        Self {
            zip_county_table: "zip_county".to_string(),
            counties_table: "counties".to_string(),
        }
    }
}

/// Live city/state geocoding, off unless enabled.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GeocodeConfig {
    pub enabled: bool,
    pub endpoint: String,
    /// Sleep after every live call, success or not.
    pub rate_limit_secs: f64,
    pub timeout_secs: u64,
    /// Persist resolved and missed queries across runs when set.
    pub cache_file: Option<PathBuf>,
}

impl Default for GeocodeConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            endpoint: "https://nominatim.openstreetmap.org/search".to_string(),
            rate_limit_secs: 1.0,
            timeout_secs: 10,
            cache_file: None,
        }
    }
}

/// Sold-transaction comps, searched zip then county then region.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SalesConfig {
    pub sales_table: String,
    pub properties_table: String,
    /// Year-built window for the strict pass, in years either side.
    pub year_tolerance: i64,
    pub max_rows: usize,
}

impl Default for SalesConfig {
    fn default() -> Self {
        Self {
            sales_table: "sales".to_string(),
            properties_table: "properties".to_string(),
            year_tolerance: 5,
            max_rows: 10,
        }
    }
}

/// Similar-listing lookup against a stored listings table.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PeerConfig {
    pub table: String,
    pub title_column: String,
    /// Column to price-bound and sort by; None disables the price bound.
    pub price_column: Option<String>,
    pub max_rows: usize,
}

impl Default for PeerConfig {
    fn default() -> Self {
        Self {
            table: "fb_listings".to_string(),
            title_column: "title".to_string(),
            price_column: Some("asking_price".to_string()),
            max_rows: 10,
        }
    }
}

/// Derived average-lot-rent lookup, same tier order as sales comps.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RentConfig {
    pub table: String,
    pub rent_column: String,
}

impl Default for RentConfig {
    fn default() -> Self {
        Self {
            table: "lot_rents".to_string(),
            rent_column: "lot_rent".to_string(),
        }
    }
}

/// Writing evaluated listings back into the store.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PersistConfig {
    pub listings_table: String,
    /// Optional append-only price history table.
    pub history_table: Option<String>,
    /// Persist every evaluated listing, not only accepted ones.
    pub insert_all_evaluated: bool,
    /// Persist listings the evaluation accepted.
    pub insert_accepted: bool,
}

impl Default for PersistConfig {
    fn default() -> Self {
        Self {
            listings_table: "fb_listings".to_string(),
            history_table: None,
            insert_all_evaluated: false,
            insert_accepted: true,
        }
    }
}

/// How much comparison text the notification comment carries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Full,
    Short,
    None,
}

/// Everything the engine needs, features absent unless configured.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub store: StoreConfig,
    pub geo: GeoConfig,
    pub geocode: GeocodeConfig,
    pub sales: Option<SalesConfig>,
    pub peers: Option<PeerConfig>,
    pub rent: Option<RentConfig>,
    pub persist: Option<PersistConfig>,
    pub output_format: OutputFormat,
}

impl EngineConfig {
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("{}: {e}", path.display())))?;
        serde_json::from_str(&raw)
            .map_err(|e| ConfigError::Parse(format!("{}: {e}", path.display())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_fills_defaults() {
        let cfg: EngineConfig = serde_json::from_str(
            r#"{
                "store": { "path": "/tmp/compare.sqlite3" },
                "sales": { "year_tolerance": 3 },
                "output_format": "short"
            }"#,
        )
        .unwrap();
        assert_eq!(cfg.store.path, "/tmp/compare.sqlite3");
        assert_eq!(cfg.store.busy_timeout_ms, 10_000);
        let sales = cfg.sales.unwrap();
        assert_eq!(sales.year_tolerance, 3);
        assert_eq!(sales.sales_table, "sales");
        assert_eq!(cfg.output_format, OutputFormat::Short);
        assert!(cfg.peers.is_none());
        assert!(cfg.persist.is_none());
    }

    #[test]
    fn empty_object_is_a_valid_config() {
        let cfg: EngineConfig = serde_json::from_str("{}").unwrap();
        assert!(!cfg.geocode.enabled);
        assert_eq!(cfg.geocode.rate_limit_secs, 1.0);
        assert_eq!(cfg.output_format, OutputFormat::Full);
    }
}
