// =============================================================================
// Daily Returns
// =============================================================================
//
// return_i = close_i / close_{i-1} - 1, undefined at i = 0.
//
// Closes are guaranteed positive by `PriceSeries`, so the ratio is always
// finite.

use super::{check_not_empty, IndicatorResult};
use crate::market_data::{DerivedSeries, PriceSeries};

/// Simple day-over-day returns of closes.
///
/// # Errors
/// - `EmptySeries` when the series has no bars
pub fn calculate_daily_returns(series: &PriceSeries) -> IndicatorResult<DerivedSeries> {
    check_not_empty(series, "daily returns")?;

    let closes = series.closes();
    let values = std::iter::once(None)
        .chain(closes.windows(2).map(|w| Some(w[1] / w[0] - 1.0)))
        .collect();

    Ok(DerivedSeries::from_parts(series.dates(), values))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::test_support::{assert_close, empty_series, series_from_closes};
    use crate::indicators::IndicatorError;

    #[test]
    fn returns_known_values() {
        let series = series_from_closes(&[100.0, 110.0, 99.0]);
        let returns = calculate_daily_returns(&series).unwrap();
        assert_eq!(returns.value_at(0), None);
        assert_close(returns.value_at(1).unwrap(), 0.1);
        assert_close(returns.value_at(2).unwrap(), -0.1);
    }

    #[test]
    fn returns_reconstruct_closes() {
        let closes = [31.5, 32.25, 30.0, 30.0, 35.75, 34.1, 36.9];
        let series = series_from_closes(&closes);
        let returns = calculate_daily_returns(&series).unwrap();

        let mut rebuilt = closes[0];
        for (i, &close) in closes.iter().enumerate().skip(1) {
            rebuilt *= 1.0 + returns.value_at(i).unwrap();
            assert!((rebuilt - close).abs() < 1e-9, "index {i}: {rebuilt} vs {close}");
        }
    }

    #[test]
    fn returns_single_point_is_undefined() {
        let returns = calculate_daily_returns(&series_from_closes(&[12.0])).unwrap();
        assert_eq!(returns.values(), vec![None]);
    }

    #[test]
    fn returns_empty_input() {
        assert!(matches!(
            calculate_daily_returns(&empty_series()),
            Err(IndicatorError::EmptySeries { .. })
        ));
    }
}
