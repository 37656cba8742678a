// =============================================================================
// Indicator Engine Errors
// =============================================================================
//
// Only two conditions are errors: a non-positive window/span and an empty
// input series. Both are raised before any computation starts. RSI's
// zero-loss case is a defined saturation value, not an error.
// =============================================================================

use thiserror::Error;

/// Result alias for indicator computations.
pub type IndicatorResult<T> = std::result::Result<T, IndicatorError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IndicatorError {
    /// A window or span argument was zero or negative.
    #[error("invalid parameter: {name} must be >= 1, got {value}")]
    InvalidParameter { name: &'static str, value: i64 },

    /// The input series holds no observations.
    #[error("empty series: no observations to compute {indicator} from")]
    EmptySeries { indicator: &'static str },
}

impl IndicatorError {
    pub fn invalid_parameter(name: &'static str, value: i64) -> Self {
        Self::InvalidParameter { name, value }
    }

    pub fn empty_series(indicator: &'static str) -> Self {
        Self::EmptySeries { indicator }
    }
}
