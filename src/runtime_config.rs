// =============================================================================
// Dashboard Configuration — JSON file with per-field defaults and atomic save
// =============================================================================
//
// Every tunable of the dashboard lives here: the asset list shown in the
// selector, the display currencies, the history start date, indicator
// defaults, data-provider settings and the HTTP bind address.
//
// All fields carry `#[serde(default)]` so that adding new fields never breaks
// loading an older config file. Saving uses a tmp + rename pattern so a crash
// mid-write cannot corrupt the file.
// =============================================================================

use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::dashboard::IndicatorParams;
use crate::market_data::Currency;
use crate::yahoo::DEFAULT_BASE_URL;

// =============================================================================
// Default-value helpers (required by serde `default = "..."` attribute)
// =============================================================================

fn default_assets() -> Vec<AssetConfig> {
    vec![
        AssetConfig::new("Bitcoin", "BTC-USD"),
        AssetConfig::new("S&P 500", "^GSPC"),
        AssetConfig::new("Gold", "GC=F"),
    ]
}

fn default_currencies() -> Vec<Currency> {
    Currency::ALL.to_vec()
}

fn default_start_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2019, 1, 1).unwrap_or_default()
}

fn default_bind_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_yahoo_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_request_timeout_secs() -> u64 {
    15
}

fn default_cache_ttl_secs() -> u64 {
    300
}

fn default_cache_max_entries() -> usize {
    32
}

fn default_report_rows() -> usize {
    5
}

// =============================================================================
// AssetConfig
// =============================================================================

/// One entry of the asset selector: what the user sees and what the data
/// provider is asked for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetConfig {
    pub label: String,
    pub ticker: String,
}

impl AssetConfig {
    pub fn new(label: impl Into<String>, ticker: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            ticker: ticker.into(),
        }
    }
}

// =============================================================================
// DashboardConfig
// =============================================================================

/// Top-level configuration for the dashboard service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardConfig {
    // --- Selector contents ---------------------------------------------------

    /// Assets offered in the selector, in display order.
    #[serde(default = "default_assets")]
    pub assets: Vec<AssetConfig>,

    /// Currencies offered in the selector. Prices are converted from USD.
    #[serde(default = "default_currencies")]
    pub currencies: Vec<Currency>,

    /// First date of the downloaded history.
    #[serde(default = "default_start_date")]
    pub start_date: NaiveDate,

    // --- Indicators ----------------------------------------------------------

    /// Default windows/spans used when a request does not override them.
    #[serde(default)]
    pub indicators: IndicatorParams,

    /// Number of most recent rows included in the PDF report.
    #[serde(default = "default_report_rows")]
    pub report_rows: usize,

    // --- Data provider -------------------------------------------------------

    #[serde(default = "default_yahoo_base_url")]
    pub yahoo_base_url: String,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// How long a downloaded series is reused before fetching again.
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,

    #[serde(default = "default_cache_max_entries")]
    pub cache_max_entries: usize,

    // --- Server --------------------------------------------------------------

    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            assets: default_assets(),
            currencies: default_currencies(),
            start_date: default_start_date(),
            indicators: IndicatorParams::default(),
            report_rows: default_report_rows(),
            yahoo_base_url: default_yahoo_base_url(),
            request_timeout_secs: default_request_timeout_secs(),
            cache_ttl_secs: default_cache_ttl_secs(),
            cache_max_entries: default_cache_max_entries(),
            bind_addr: default_bind_addr(),
        }
    }
}

impl DashboardConfig {
    /// Load configuration from a JSON file at `path`.
    ///
    /// If the file does not exist, returns an error so the caller can fall
    /// back to defaults with a warning.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read dashboard config from {}", path.display()))?;

        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse dashboard config from {}", path.display()))?;

        config
            .validate()
            .with_context(|| format!("invalid dashboard config in {}", path.display()))?;

        info!(
            path = %path.display(),
            assets = config.assets.len(),
            start_date = %config.start_date,
            "dashboard config loaded"
        );

        Ok(config)
    }

    /// Persist the current configuration to `path` using an atomic write
    /// (write to `.tmp`, then rename).
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        let content = serde_json::to_string_pretty(self)
            .context("failed to serialise dashboard config to JSON")?;

        let tmp_path = path.with_extension("json.tmp");

        std::fs::write(&tmp_path, &content)
            .with_context(|| format!("failed to write tmp config to {}", tmp_path.display()))?;

        std::fs::rename(&tmp_path, path)
            .with_context(|| format!("failed to rename tmp config to {}", path.display()))?;

        info!(path = %path.display(), "dashboard config saved (atomic)");
        Ok(())
    }

    /// Reject configurations the service cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.assets.is_empty() {
            anyhow::bail!("at least one asset must be configured");
        }
        for (i, asset) in self.assets.iter().enumerate() {
            if asset.label.trim().is_empty() || asset.ticker.trim().is_empty() {
                anyhow::bail!("asset #{i} needs a non-empty label and ticker");
            }
            if self.assets[..i]
                .iter()
                .any(|a| a.label.eq_ignore_ascii_case(&asset.label))
            {
                anyhow::bail!("duplicate asset label '{}'", asset.label);
            }
        }
        if self.currencies.is_empty() {
            anyhow::bail!("at least one currency must be configured");
        }
        if self.report_rows == 0 {
            anyhow::bail!("report_rows must be >= 1");
        }
        self.indicators
            .validate()
            .context("invalid indicator defaults")?;
        Ok(())
    }

    /// Find an asset by its selector label (case-insensitive).
    pub fn asset(&self, label: &str) -> Option<&AssetConfig> {
        self.assets
            .iter()
            .find(|a| a.label.eq_ignore_ascii_case(label.trim()))
    }

    pub fn offers_currency(&self, currency: Currency) -> bool {
        self.currencies.contains(&currency)
    }
}

// =============================================================================
// Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_expected_values() {
        let cfg = DashboardConfig::default();
        assert_eq!(cfg.assets.len(), 3);
        assert_eq!(cfg.assets[0], AssetConfig::new("Bitcoin", "BTC-USD"));
        assert_eq!(cfg.assets[1].ticker, "^GSPC");
        assert_eq!(cfg.assets[2].ticker, "GC=F");
        assert_eq!(cfg.currencies, vec![Currency::Usd, Currency::Eur, Currency::Gbp]);
        assert_eq!(cfg.start_date, NaiveDate::from_ymd_opt(2019, 1, 1).unwrap());
        assert_eq!(cfg.indicators.rsi_window, 14);
        assert_eq!(cfg.indicators.sma_window, 50);
        assert_eq!(cfg.report_rows, 5);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn deserialise_empty_json_uses_defaults() {
        let cfg: DashboardConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(cfg.assets.len(), 3);
        assert_eq!(cfg.cache_ttl_secs, 300);
        assert_eq!(cfg.indicators.macd_long, 26);
        assert_eq!(cfg.bind_addr, "0.0.0.0:8080");
    }

    #[test]
    fn deserialise_partial_json_fills_defaults() {
        let json = r#"{
            "assets": [{ "label": "Apple", "ticker": "AAPL" }],
            "currencies": ["EUR"],
            "indicators": { "sma_window": 20 }
        }"#;
        let cfg: DashboardConfig = serde_json::from_str(json).unwrap();
        assert_eq!(cfg.assets, vec![AssetConfig::new("Apple", "AAPL")]);
        assert_eq!(cfg.currencies, vec![Currency::Eur]);
        assert_eq!(cfg.indicators.sma_window, 20);
        assert_eq!(cfg.indicators.ema_span, 50);
        assert_eq!(cfg.report_rows, 5);
    }

    #[test]
    fn asset_lookup_is_case_insensitive() {
        let cfg = DashboardConfig::default();
        assert_eq!(cfg.asset("bitcoin").unwrap().ticker, "BTC-USD");
        assert_eq!(cfg.asset(" s&p 500 ").unwrap().ticker, "^GSPC");
        assert!(cfg.asset("Dogecoin").is_none());
    }

    #[test]
    fn validate_rejects_bad_configs() {
        let mut cfg = DashboardConfig::default();
        cfg.assets.clear();
        assert!(cfg.validate().is_err());

        let mut cfg = DashboardConfig::default();
        cfg.assets.push(AssetConfig::new("BITCOIN", "BTC-EUR"));
        assert!(cfg.validate().is_err());

        let mut cfg = DashboardConfig::default();
        cfg.indicators.rsi_window = 0;
        assert!(cfg.validate().is_err());

        let mut cfg = DashboardConfig::default();
        cfg.report_rows = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn save_then_load_roundtrip() {
        let dir = std::env::temp_dir().join(format!("dashboard-config-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("dashboard_config.json");

        let mut cfg = DashboardConfig::default();
        cfg.report_rows = 12;
        cfg.save(&path).unwrap();

        let loaded = DashboardConfig::load(&path).unwrap();
        assert_eq!(loaded.report_rows, 12);
        assert_eq!(loaded.assets, cfg.assets);
        assert!(!path.with_extension("json.tmp").exists());

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn load_missing_file_is_an_error() {
        assert!(DashboardConfig::load("/definitely/not/here/dashboard_config.json").is_err());
    }
}
