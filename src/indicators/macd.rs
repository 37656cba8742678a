// =============================================================================
// Moving Average Convergence Divergence (MACD)
// =============================================================================
//
//   macd      = EMA(close, short) - EMA(close, long)
//   signal    = EMA(macd, signal)
//   histogram = macd - signal
//
// All three lines use the recursive EMA seeded at the first value, so they
// are defined from the very first bar.
// =============================================================================

use serde::Serialize;

use super::ema::{ema_of, smooth};
use super::{check_not_empty, check_period, IndicatorResult};
use crate::market_data::{DerivedSeries, PriceSeries};

/// The three MACD lines, each aligned with the input series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MacdResult {
    pub macd: DerivedSeries,
    pub signal: DerivedSeries,
    pub histogram: DerivedSeries,
}

/// Compute MACD, its signal line and the histogram.
///
/// # Errors
/// - `InvalidParameter` when any span is zero
/// - `EmptySeries` when the series has no bars
pub fn calculate_macd(
    series: &PriceSeries,
    short_span: usize,
    long_span: usize,
    signal_span: usize,
) -> IndicatorResult<MacdResult> {
    check_period("short_span", short_span)?;
    check_period("long_span", long_span)?;
    check_period("signal_span", signal_span)?;
    check_not_empty(series, "MACD")?;

    let closes = series.closes();
    let short = smooth(closes.iter().copied().map(Some), short_span);
    let long = smooth(closes.iter().copied().map(Some), long_span);

    let macd_values: Vec<Option<f64>> = short
        .iter()
        .zip(&long)
        .map(|(s, l)| Some((*s)? - (*l)?))
        .collect();
    let macd = DerivedSeries::from_parts(series.dates(), macd_values);
    let signal = ema_of(&macd, signal_span)?;

    let histogram_values: Vec<Option<f64>> = macd
        .values()
        .into_iter()
        .zip(signal.values())
        .map(|(m, s)| Some(m? - s?))
        .collect();
    let histogram = DerivedSeries::from_parts(macd.dates(), histogram_values);

    Ok(MacdResult {
        macd,
        signal,
        histogram,
    })
}
