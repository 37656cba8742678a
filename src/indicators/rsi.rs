// =============================================================================
// Relative Strength Index (RSI) — simple rolling means
// =============================================================================
//
// Step 1 — delta_i = close_i - close_{i-1} (undefined at i = 0).
// Step 2 — gain_i = max(delta_i, 0), loss_i = max(-delta_i, 0).
// Step 3 — average gain / average loss are plain means over the last
//          `window` deltas (no Wilder smoothing).
// Step 4 — RS  = avg_gain / avg_loss
//          RSI = 100 - 100 / (1 + RS)
//
// The first defined value is at index `window`. Zero average loss never turns
// into NaN or infinity: pure gains saturate at 100, no movement at all reads
// 50.
// =============================================================================

use super::{check_not_empty, check_period, IndicatorResult};
use crate::market_data::{DerivedSeries, PriceSeries};

/// Compute the RSI series over `window` deltas.
///
/// # Errors
/// - `InvalidParameter` when `window == 0`
/// - `EmptySeries` when the series has no bars
pub fn calculate_rsi(series: &PriceSeries, window: usize) -> IndicatorResult<DerivedSeries> {
    check_period("window", window)?;
    check_not_empty(series, "RSI")?;

    let closes = series.closes();
    let mut values = vec![None; closes.len()];

    // deltas[k] is the change from closes[k] to closes[k + 1].
    let deltas: Vec<f64> = closes.windows(2).map(|w| w[1] - w[0]).collect();
    let window_f = window as f64;

    for i in window..closes.len() {
        let recent = &deltas[i - window..i];
        let (sum_gain, sum_loss) = recent.iter().fold((0.0_f64, 0.0_f64), |(g, l), &d| {
            if d > 0.0 {
                (g + d, l)
            } else {
                (g, l - d)
            }
        });
        values[i] = Some(rsi_from_averages(sum_gain / window_f, sum_loss / window_f));
    }

    Ok(DerivedSeries::from_parts(series.dates(), values))
}

// =============================================================================
// Internal helpers
// =============================================================================

/// Convert average gain / average loss into an RSI value in [0, 100].
///
/// - Both averages zero: 50.0 (no movement).
/// - Average loss zero, average gain positive: 100.0.
fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 && avg_gain == 0.0 {
        50.0
    } else if avg_loss == 0.0 {
        100.0
    } else {
        let rs = avg_gain / avg_loss;
        100.0 - 100.0 / (1.0 + rs)
    }
}
