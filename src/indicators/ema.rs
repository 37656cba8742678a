// =============================================================================
// Exponential Moving Average (EMA)
// =============================================================================
//
// EMA gives more weight to recent prices, making it more responsive to new
// information than the Simple Moving Average (SMA).
//
// Formula:
//   alpha  = 2 / (span + 1)
//   EMA_0  = close_0
//   EMA_t  = alpha * close_t + (1 - alpha) * EMA_{t-1}
//
// This is the plain recursive form: the first value seeds the recursion and
// there is no warm-up gap and no bias correction.
// =============================================================================

use super::{check_not_empty, check_period, IndicatorError, IndicatorResult};
use crate::market_data::{DerivedSeries, PriceSeries};

/// Compute the EMA of closes with the given `span`.
///
/// # Errors
/// - `InvalidParameter` when `span == 0`
/// - `EmptySeries` when the series has no bars
pub fn calculate_ema(series: &PriceSeries, span: usize) -> IndicatorResult<DerivedSeries> {
    check_period("span", span)?;
    check_not_empty(series, "EMA")?;

    let values = smooth(series.closes().into_iter().map(Some), span);
    Ok(DerivedSeries::from_parts(series.dates(), values))
}

/// Apply the same EMA recursion to an already-derived series.
///
/// The recursion seeds at the first defined value. Undefined inputs produce
/// undefined outputs and leave the running average untouched.
pub fn ema_of(series: &DerivedSeries, span: usize) -> IndicatorResult<DerivedSeries> {
    check_period("span", span)?;
    if series.is_empty() {
        return Err(IndicatorError::empty_series("EMA"));
    }

    let values = smooth(series.values().into_iter(), span);
    Ok(DerivedSeries::from_parts(series.dates(), values))
}

/// Shared recursion used by every EMA in the engine, MACD included.
pub(crate) fn smooth<I>(values: I, span: usize) -> Vec<Option<f64>>
where
    I: IntoIterator<Item = Option<f64>>,
{
    let alpha = 2.0 / (span as f64 + 1.0);
    let mut prev: Option<f64> = None;

    values
        .into_iter()
        .map(|value| {
            let v = value?;
            let next = match prev {
                Some(p) => alpha * v + (1.0 - alpha) * p,
                None => v,
            };
            prev = Some(next);
            Some(next)
        })
        .collect()
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::test_support::{assert_close, empty_series, series_from_closes};

    #[test]
    fn ema_seeds_at_first_close() {
        let series = series_from_closes(&[5.0, 6.0, 7.0]);
        let ema = calculate_ema(&series, 10).unwrap();
        assert_eq!(ema.value_at(0), Some(5.0));
        assert!(ema.values().iter().all(Option::is_some));
    }

    #[test]
    fn ema_known_values() {
        // span 3 => alpha = 0.5
        let series = series_from_closes(&[10.0, 11.0, 12.0, 11.0, 10.0]);
        let ema = calculate_ema(&series, 3).unwrap();
        let expected = [10.0, 10.5, 11.25, 11.125, 10.5625];
        for (v, e) in ema.values().iter().zip(expected) {
            assert_close(v.unwrap(), e);
        }
    }

    #[test]
    fn ema_span_one_tracks_close() {
        let series = series_from_closes(&[4.0, 8.0, 2.0]);
        let ema = calculate_ema(&series, 1).unwrap();
        assert_eq!(ema.values(), vec![Some(4.0), Some(8.0), Some(2.0)]);
    }

    #[test]
    fn ema_constant_series_stays_constant() {
        let series = series_from_closes(&[100.0; 60]);
        let ema = calculate_ema(&series, 50).unwrap();
        for v in ema.values() {
            assert_close(v.unwrap(), 100.0);
        }
    }

    #[test]
    fn ema_single_point() {
        let series = series_from_closes(&[7.0]);
        let ema = calculate_ema(&series, 12).unwrap();
        assert_eq!(ema.values(), vec![Some(7.0)]);
    }

    #[test]
    fn ema_span_zero() {
        let series = series_from_closes(&[1.0, 2.0, 3.0]);
        assert!(matches!(
            calculate_ema(&series, 0),
            Err(IndicatorError::InvalidParameter { name: "span", .. })
        ));
    }

    #[test]
    fn ema_empty_input() {
        assert!(matches!(
            calculate_ema(&empty_series(), 5),
            Err(IndicatorError::EmptySeries { .. })
        ));
    }

    #[test]
    fn ema_of_skips_undefined_prefix() {
        let series = series_from_closes(&[1.0, 2.0, 3.0, 4.0]);
        let sma = crate::indicators::calculate_sma(&series, 2).unwrap();
        let smoothed = ema_of(&sma, 3).unwrap();
        assert_eq!(smoothed.value_at(0), None);
        assert_close(smoothed.value_at(1).unwrap(), 1.5);
        assert_close(smoothed.value_at(2).unwrap(), 0.5 * 2.5 + 0.5 * 1.5);
    }

    #[test]
    fn ema_of_matches_calculate_ema_on_closes() {
        let series = series_from_closes(&[3.0, 9.0, 4.0, 6.5, 8.0]);
        let direct = calculate_ema(&series, 4).unwrap();
        let as_derived = DerivedSeries::from_parts(
            series.dates(),
            series.closes().into_iter().map(Some).collect(),
        );
        assert_eq!(ema_of(&as_derived, 4).unwrap(), direct);
    }
}
