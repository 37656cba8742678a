// =============================================================================
// Technical Indicators Module
// =============================================================================
//
// Pure, side-effect-free indicator computations over a daily `PriceSeries`.
// Every operation returns a `DerivedSeries` with exactly one entry per input
// bar; warm-up entries are `None`. Parameters are checked before any work is
// done and an empty input is always an `EmptySeries` error.

pub mod ema;
pub mod error;
pub mod macd;
pub mod returns;
pub mod rsi;
pub mod sma;

pub use ema::calculate_ema;
pub use error::{IndicatorError, IndicatorResult};
pub use macd::{calculate_macd, MacdResult};
pub use returns::calculate_daily_returns;
pub use rsi::calculate_rsi;
pub use sma::calculate_sma;

use crate::market_data::PriceSeries;

pub const DEFAULT_RSI_WINDOW: usize = 14;
pub const DEFAULT_MACD_SHORT: usize = 12;
pub const DEFAULT_MACD_LONG: usize = 26;
pub const DEFAULT_MACD_SIGNAL: usize = 9;
pub const DEFAULT_SMA_WINDOW: usize = 50;
pub const DEFAULT_EMA_SPAN: usize = 50;

/// Convert a raw, possibly negative window/span from an outer surface (query
/// string, config file) into a usable period.
pub fn validate_period(name: &'static str, raw: i64) -> IndicatorResult<usize> {
    if raw < 1 {
        return Err(IndicatorError::invalid_parameter(name, raw));
    }
    usize::try_from(raw).map_err(|_| IndicatorError::invalid_parameter(name, raw))
}

/// Reject a zero period.
pub(crate) fn check_period(name: &'static str, period: usize) -> IndicatorResult<()> {
    if period == 0 {
        return Err(IndicatorError::invalid_parameter(name, 0));
    }
    Ok(())
}

pub(crate) fn check_not_empty(series: &PriceSeries, indicator: &'static str) -> IndicatorResult<()> {
    if series.is_empty() {
        return Err(IndicatorError::empty_series(indicator));
    }
    Ok(())
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_period_accepts_positive() {
        assert_eq!(validate_period("window", 14), Ok(14));
        assert_eq!(validate_period("window", 1), Ok(1));
    }

    #[test]
    fn validate_period_rejects_zero_and_negative() {
        assert_eq!(
            validate_period("window", 0),
            Err(IndicatorError::InvalidParameter {
                name: "window",
                value: 0
            })
        );
        assert_eq!(
            validate_period("span", -3),
            Err(IndicatorError::InvalidParameter {
                name: "span",
                value: -3
            })
        );
    }
}
