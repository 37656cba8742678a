// =============================================================================
// Central Application State — Market Dashboard
// =============================================================================
//
// Shared across all request handlers via `Arc<AppState>`. Holds the live
// configuration, the Yahoo client and the fetch cache.
//
// Thread safety:
//   - parking_lot::RwLock for the configuration. Handlers take a snapshot
//     and release the lock before any `.await`.
//   - `persist_lock` serialises configuration updates end to end, so the
//     file on disk always matches the last update applied in memory.
//   - SeriesCache manages its own interior mutability.
// =============================================================================

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use parking_lot::{Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::dashboard::{IndicatorOverrides, IndicatorParams};
use crate::indicators::IndicatorResult;
use crate::market_data::{convert_series, Currency, PriceSeries, SeriesCache, SeriesKey};
use crate::runtime_config::DashboardConfig;
use crate::yahoo::YahooClient;

/// Central application state shared across all async tasks via `Arc<AppState>`.
pub struct AppState {
    // ── Configuration ───────────────────────────────────────────────────
    pub config: Arc<RwLock<DashboardConfig>>,
    /// Where configuration changes made through the API are persisted.
    pub config_path: PathBuf,
    persist_lock: Mutex<()>,

    // ── Market Data ─────────────────────────────────────────────────────
    pub yahoo: YahooClient,
    pub cache: SeriesCache,

    // ── Metadata ────────────────────────────────────────────────────────
    pub start_time: Instant,
}

impl AppState {
    pub fn new(config: DashboardConfig, config_path: impl Into<PathBuf>) -> Result<Self> {
        let yahoo = YahooClient::new(config.yahoo_base_url.clone(), config.request_timeout_secs)
            .context("failed to build Yahoo client")?;
        let cache = SeriesCache::new(
            Duration::from_secs(config.cache_ttl_secs),
            config.cache_max_entries,
        );

        Ok(Self {
            config: Arc::new(RwLock::new(config)),
            config_path: config_path.into(),
            persist_lock: Mutex::new(()),
            yahoo,
            cache,
            start_time: Instant::now(),
        })
    }

    /// Clone of the current configuration, taken under a short read lock.
    pub fn config_snapshot(&self) -> DashboardConfig {
        self.config.read().clone()
    }

    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    /// Apply `overrides` to the default indicator parameters and persist the
    /// result. Concurrent updates are applied and saved one at a time.
    ///
    /// A failed save is logged; the in-memory update stands.
    pub fn update_indicator_defaults(
        &self,
        overrides: &IndicatorOverrides,
    ) -> IndicatorResult<IndicatorParams> {
        let _persist = self.persist_lock.lock();

        let (params, snapshot) = {
            let mut config = self.config.write();
            let params = config.indicators.with_overrides(overrides)?;
            config.indicators = params;
            (params, config.clone())
        };

        if let Err(e) = snapshot.save(&self.config_path) {
            warn!(error = %format!("{e:#}"), "failed to persist indicator defaults");
        }
        info!(?params, "indicator defaults updated");
        Ok(params)
    }

    /// Daily series for `ticker` from `start`, re-quoted in `currency`.
    ///
    /// Raw provider series (the asset and, when needed, the FX pair) come
    /// from the cache when fresh. Conversion runs on every call.
    pub async fn load_series(
        &self,
        ticker: &str,
        start: NaiveDate,
        currency: Currency,
    ) -> Result<Arc<PriceSeries>> {
        let series = self.fetch_cached(ticker, start).await?;

        let Some(fx_ticker) = currency.usd_rate_ticker() else {
            return Ok(series);
        };

        let rates = self.fetch_cached(&fx_ticker, start).await?;
        let converted = convert_series(&series, &rates)
            .with_context(|| format!("failed to convert {ticker} to {currency}"))?;

        debug!(
            ticker,
            currency = %currency,
            bars = converted.len(),
            dropped = series.len() - converted.len(),
            "series converted"
        );
        Ok(Arc::new(converted))
    }

    async fn fetch_cached(&self, ticker: &str, start: NaiveDate) -> Result<Arc<PriceSeries>> {
        let key = SeriesKey::new(ticker, start);
        if let Some(hit) = self.cache.get(&key) {
            return Ok(hit);
        }

        let series = Arc::new(self.yahoo.fetch_daily(ticker, start).await?);
        info!(key = %key, bars = series.len(), "series downloaded");
        self.cache.insert(key, Arc::clone(&series));
        Ok(series)
    }
}
