// =============================================================================
// Dashboard composition — indicator checklist -> indicator panel
// =============================================================================
//
// The dashboard lets the user tick any of RSI / MACD / Returns / SMA / EMA.
// Whenever the selection changes the presentation layer asks for a fresh
// panel; every call recomputes from the series, nothing is cached here.
// =============================================================================

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::indicators::{
    self, calculate_daily_returns, calculate_ema, calculate_macd, calculate_rsi, calculate_sma,
    check_period, validate_period, IndicatorResult, MacdResult,
};
use crate::market_data::{DerivedSeries, PriceSeries};

// =============================================================================
// IndicatorKind
// =============================================================================

/// One entry of the indicator checklist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IndicatorKind {
    #[serde(rename = "RSI")]
    Rsi,
    #[serde(rename = "MACD")]
    Macd,
    #[serde(rename = "Returns")]
    Returns,
    #[serde(rename = "SMA")]
    Sma,
    #[serde(rename = "EMA")]
    Ema,
}

impl IndicatorKind {
    pub const ALL: [IndicatorKind; 5] = [
        IndicatorKind::Rsi,
        IndicatorKind::Macd,
        IndicatorKind::Returns,
        IndicatorKind::Sma,
        IndicatorKind::Ema,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Rsi => "RSI",
            Self::Macd => "MACD",
            Self::Returns => "Returns",
            Self::Sma => "SMA",
            Self::Ema => "EMA",
        }
    }
}

impl fmt::Display for IndicatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IndicatorKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rsi" => Ok(Self::Rsi),
            "macd" => Ok(Self::Macd),
            "returns" | "return" | "rendement" => Ok(Self::Returns),
            "sma" => Ok(Self::Sma),
            "ema" => Ok(Self::Ema),
            other => Err(format!("unknown indicator '{other}'")),
        }
    }
}

/// Parse a comma-separated checklist such as `"RSI,MACD,SMA"`.
///
/// Blank entries are ignored and repeats collapse into one.
pub fn parse_filters(raw: &str) -> Result<Vec<IndicatorKind>, String> {
    let mut kinds = Vec::new();
    for part in raw.split(',').filter(|p| !p.trim().is_empty()) {
        let kind: IndicatorKind = part.parse()?;
        if !kinds.contains(&kind) {
            kinds.push(kind);
        }
    }
    Ok(kinds)
}

// =============================================================================
// IndicatorParams
// =============================================================================

fn default_rsi_window() -> usize {
    indicators::DEFAULT_RSI_WINDOW
}

fn default_macd_short() -> usize {
    indicators::DEFAULT_MACD_SHORT
}

fn default_macd_long() -> usize {
    indicators::DEFAULT_MACD_LONG
}

fn default_macd_signal() -> usize {
    indicators::DEFAULT_MACD_SIGNAL
}

fn default_sma_window() -> usize {
    indicators::DEFAULT_SMA_WINDOW
}

fn default_ema_span() -> usize {
    indicators::DEFAULT_EMA_SPAN
}

/// Window/span settings for every indicator on the panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndicatorParams {
    #[serde(default = "default_rsi_window")]
    pub rsi_window: usize,
    #[serde(default = "default_macd_short")]
    pub macd_short: usize,
    #[serde(default = "default_macd_long")]
    pub macd_long: usize,
    #[serde(default = "default_macd_signal")]
    pub macd_signal: usize,
    #[serde(default = "default_sma_window")]
    pub sma_window: usize,
    #[serde(default = "default_ema_span")]
    pub ema_span: usize,
}

impl Default for IndicatorParams {
    fn default() -> Self {
        Self {
            rsi_window: default_rsi_window(),
            macd_short: default_macd_short(),
            macd_long: default_macd_long(),
            macd_signal: default_macd_signal(),
            sma_window: default_sma_window(),
            ema_span: default_ema_span(),
        }
    }
}

impl IndicatorParams {
    /// Every window/span must be at least 1.
    pub fn validate(&self) -> IndicatorResult<()> {
        check_period("rsi_window", self.rsi_window)?;
        check_period("macd_short", self.macd_short)?;
        check_period("macd_long", self.macd_long)?;
        check_period("macd_signal", self.macd_signal)?;
        check_period("sma_window", self.sma_window)?;
        check_period("ema_span", self.ema_span)?;
        Ok(())
    }

    /// Apply raw per-request overrides on top of these defaults.
    pub fn with_overrides(mut self, overrides: &IndicatorOverrides) -> IndicatorResult<Self> {
        let apply = |name: &'static str, raw: Option<i64>, slot: &mut usize| -> IndicatorResult<()> {
            if let Some(raw) = raw {
                *slot = validate_period(name, raw)?;
            }
            Ok(())
        };

        apply("rsi_window", overrides.rsi_window, &mut self.rsi_window)?;
        apply("macd_short", overrides.macd_short, &mut self.macd_short)?;
        apply("macd_long", overrides.macd_long, &mut self.macd_long)?;
        apply("macd_signal", overrides.macd_signal, &mut self.macd_signal)?;
        apply("sma_window", overrides.sma_window, &mut self.sma_window)?;
        apply("ema_span", overrides.ema_span, &mut self.ema_span)?;
        Ok(self)
    }
}

/// Optional, unvalidated parameter overrides as they arrive from a request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IndicatorOverrides {
    pub rsi_window: Option<i64>,
    pub macd_short: Option<i64>,
    pub macd_long: Option<i64>,
    pub macd_signal: Option<i64>,
    pub sma_window: Option<i64>,
    pub ema_span: Option<i64>,
}

// =============================================================================
// IndicatorPanel
// =============================================================================

/// Indicator overlays for one asset. Daily returns are always present; the
/// rest only when selected.
#[derive(Debug, Clone, Serialize)]
pub struct IndicatorPanel {
    pub params: IndicatorParams,
    pub selected: Vec<IndicatorKind>,
    pub returns: DerivedSeries,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rsi: Option<DerivedSeries>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub macd: Option<MacdResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sma: Option<DerivedSeries>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ema: Option<DerivedSeries>,
}

/// Compute the selected indicators for `series`.
pub fn build_panel(
    series: &PriceSeries,
    selected: &[IndicatorKind],
    params: IndicatorParams,
) -> IndicatorResult<IndicatorPanel> {
    params.validate()?;

    let wants = |kind: IndicatorKind| selected.contains(&kind);

    let returns = calculate_daily_returns(series)?;
    let rsi = wants(IndicatorKind::Rsi)
        .then(|| calculate_rsi(series, params.rsi_window))
        .transpose()?;
    let macd = wants(IndicatorKind::Macd)
        .then(|| calculate_macd(series, params.macd_short, params.macd_long, params.macd_signal))
        .transpose()?;
    let sma = wants(IndicatorKind::Sma)
        .then(|| calculate_sma(series, params.sma_window))
        .transpose()?;
    let ema = wants(IndicatorKind::Ema)
        .then(|| calculate_ema(series, params.ema_span))
        .transpose()?;

    Ok(IndicatorPanel {
        params,
        selected: selected.to_vec(),
        returns,
        rsi,
        macd,
        sma,
        ema,
    })
}

// =============================================================================
// Latest readings (report summary)
// =============================================================================

/// Close of the most recent bar plus the latest defined value of each
/// indicator. `None` means the indicator never left its warm-up period.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LatestReadings {
    pub params: IndicatorParams,
    pub date: NaiveDate,
    pub close: f64,
    pub daily_return: Option<f64>,
    pub rsi: Option<f64>,
    pub macd: Option<f64>,
    pub signal: Option<f64>,
    pub sma: Option<f64>,
    pub ema: Option<f64>,
}

pub fn latest_readings(series: &PriceSeries, params: IndicatorParams) -> IndicatorResult<LatestReadings> {
    let panel = build_panel(series, &IndicatorKind::ALL, params)?;
    let latest = |s: &Option<DerivedSeries>| s.as_ref().and_then(DerivedSeries::last_defined);

    // build_panel succeeded, so the series is non-empty.
    let last = &series.bars()[series.len() - 1];

    Ok(LatestReadings {
        params,
        date: last.date,
        close: last.close,
        daily_return: panel.returns.last_defined(),
        rsi: latest(&panel.rsi),
        macd: panel.macd.as_ref().and_then(|m| m.macd.last_defined()),
        signal: panel.macd.as_ref().and_then(|m| m.signal.last_defined()),
        sma: latest(&panel.sma),
        ema: latest(&panel.ema),
    })
}
