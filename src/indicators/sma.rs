// =============================================================================
// Simple Moving Average (SMA)
// =============================================================================
//
// SMA_i = mean(close[i - window + 1 ..= i])
//
// Undefined for the first `window - 1` bars. Each mean is summed from its own
// window, O(n * window), so a single huge close cannot leave rounding residue
// in the means that follow it.
// =============================================================================

use super::{check_not_empty, check_period, IndicatorResult};
use crate::market_data::{DerivedSeries, PriceSeries};

/// Rolling arithmetic mean of closes over `window` bars.
///
/// # Errors
/// - `InvalidParameter` when `window == 0`
/// - `EmptySeries` when the series has no bars
pub fn calculate_sma(series: &PriceSeries, window: usize) -> IndicatorResult<DerivedSeries> {
    check_period("window", window)?;
    check_not_empty(series, "SMA")?;

    let values = rolling_mean(&series.closes(), window);
    Ok(DerivedSeries::from_parts(series.dates(), values))
}

/// Trailing mean over `window` values; `None` until the window is full.
fn rolling_mean(values: &[f64], window: usize) -> Vec<Option<f64>> {
    (0..values.len())
        .map(|i| {
            if i + 1 < window {
                return None;
            }
            let sum: f64 = values[i + 1 - window..=i].iter().sum();
            Some(sum / window as f64)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::test_support::{assert_close, empty_series, series_from_closes};
    use crate::indicators::IndicatorError;

    #[test]
    fn sma_worked_example() {
        let series = series_from_closes(&[10.0, 11.0, 12.0, 11.0, 10.0]);
        let sma = calculate_sma(&series, 2).unwrap();
        let values = sma.values();
        assert_eq!(values[0], None);
        let expected = [10.5, 11.5, 11.5, 10.5];
        for (v, e) in values[1..].iter().zip(expected) {
            assert_close(v.unwrap(), e);
        }
    }

    #[test]
    fn sma_length_and_warm_up() {
        let closes: Vec<f64> = (1..=30).map(|x| x as f64).collect();
        let series = series_from_closes(&closes);
        for window in [1, 2, 5, 14, 30, 45] {
            let sma = calculate_sma(&series, window).unwrap();
            assert_eq!(sma.len(), series.len());
            for (i, v) in sma.values().iter().enumerate() {
                assert_eq!(v.is_none(), i + 1 < window, "window {window}, index {i}");
            }
        }
    }

    #[test]
    fn sma_window_one_is_identity() {
        let series = series_from_closes(&[3.0, 1.5, 7.25]);
        let sma = calculate_sma(&series, 1).unwrap();
        assert_eq!(sma.values(), vec![Some(3.0), Some(1.5), Some(7.25)]);
    }

    #[test]
    fn sma_unaffected_by_earlier_outlier() {
        let series = series_from_closes(&[1e16, 1.0, 1.0, 1.0]);
        let sma = calculate_sma(&series, 1).unwrap();
        assert_eq!(sma.values(), vec![Some(1e16), Some(1.0), Some(1.0), Some(1.0)]);

        let sma = calculate_sma(&series, 2).unwrap();
        assert_eq!(sma.value_at(2), Some(1.0));
        assert_eq!(sma.value_at(3), Some(1.0));

        let series = series_from_closes(&[1e9, 0.37, 0.41, 0.29]);
        let sma = calculate_sma(&series, 1).unwrap();
        assert_eq!(sma.values(), vec![Some(1e9), Some(0.37), Some(0.41), Some(0.29)]);
    }

    #[test]
    fn sma_dates_align_with_input() {
        let series = series_from_closes(&[1.0, 2.0, 3.0]);
        let sma = calculate_sma(&series, 2).unwrap();
        assert_eq!(sma.dates(), series.dates());
    }

    #[test]
    fn sma_single_point_is_all_undefined() {
        let series = series_from_closes(&[42.0]);
        let sma = calculate_sma(&series, 3).unwrap();
        assert_eq!(sma.values(), vec![None]);
    }

    #[test]
    fn sma_window_zero() {
        let series = series_from_closes(&[1.0, 2.0]);
        assert_eq!(
            calculate_sma(&series, 0),
            Err(IndicatorError::InvalidParameter {
                name: "window",
                value: 0
            })
        );
    }

    #[test]
    fn sma_empty_input() {
        assert!(matches!(
            calculate_sma(&empty_series(), 5),
            Err(IndicatorError::EmptySeries { .. })
        ));
    }

    #[test]
    fn sma_parameter_checked_before_emptiness() {
        assert!(matches!(
            calculate_sma(&empty_series(), 0),
            Err(IndicatorError::InvalidParameter { .. })
        ));
    }
}
