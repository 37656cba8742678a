use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Reasons a set of bars cannot form a [`PriceSeries`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SeriesError {
    #[error("dates must be strictly increasing: {current} follows {previous}")]
    NonIncreasingDate {
        previous: NaiveDate,
        current: NaiveDate,
    },

    #[error("invalid {field} price {value} on {date}: prices must be finite and positive")]
    InvalidPrice {
        date: NaiveDate,
        field: &'static str,
        value: f64,
    },
}

// ---------------------------------------------------------------------------
// Bar / PriceSeries
// ---------------------------------------------------------------------------

/// One daily OHLC observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume: Option<f64>,
}

impl Bar {
    pub fn new(date: NaiveDate, open: f64, high: f64, low: f64, close: f64) -> Self {
        Self {
            date,
            open,
            high,
            low,
            close,
            volume: None,
        }
    }

    pub fn with_volume(mut self, volume: f64) -> Self {
        self.volume = Some(volume);
        self
    }

    /// Every price must be finite and strictly positive.
    pub fn validate(&self) -> Result<(), SeriesError> {
        for (field, value) in [
            ("open", self.open),
            ("high", self.high),
            ("low", self.low),
            ("close", self.close),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(SeriesError::InvalidPrice {
                    date: self.date,
                    field,
                    value,
                });
            }
        }
        Ok(())
    }
}

/// Date-ordered daily price history for a single asset.
///
/// Dates are strictly increasing and every price is positive. Non-trading
/// days are simply absent. An empty series is allowed; the indicator engine
/// rejects it with `EmptySeries`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PriceSeries {
    bars: Vec<Bar>,
}

impl PriceSeries {
    /// Validate and wrap `bars`.
    pub fn new(bars: Vec<Bar>) -> Result<Self, SeriesError> {
        for bar in &bars {
            bar.validate()?;
        }
        for pair in bars.windows(2) {
            if pair[1].date <= pair[0].date {
                return Err(SeriesError::NonIncreasingDate {
                    previous: pair[0].date,
                    current: pair[1].date,
                });
            }
        }
        Ok(Self { bars })
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.bars.iter().map(|b| b.date).collect()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    /// The most recent `count` bars, oldest first.
    pub fn tail(&self, count: usize) -> &[Bar] {
        let start = self.bars.len().saturating_sub(count);
        &self.bars[start..]
    }
}

// ---------------------------------------------------------------------------
// DerivedSeries
// ---------------------------------------------------------------------------

/// A single `(date, value)` entry of a derived series. `value` is `None`
/// while the indicator is still warming up.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DerivedPoint {
    pub date: NaiveDate,
    pub value: Option<f64>,
}

/// Indicator output aligned one-to-one with the dates of its input series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DerivedSeries {
    points: Vec<DerivedPoint>,
}

impl DerivedSeries {
    /// Zip `dates` with `values`. Both must have the same length.
    pub(crate) fn from_parts(dates: Vec<NaiveDate>, values: Vec<Option<f64>>) -> Self {
        debug_assert_eq!(dates.len(), values.len());
        let points = dates
            .into_iter()
            .zip(values)
            .map(|(date, value)| DerivedPoint { date, value })
            .collect();
        Self { points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.points.iter().map(|p| p.date).collect()
    }

    pub fn values(&self) -> Vec<Option<f64>> {
        self.points.iter().map(|p| p.value).collect()
    }

    /// Value at position `index`, `None` when undefined or out of range.
    #[cfg(test)]
    pub fn value_at(&self, index: usize) -> Option<f64> {
        self.points.get(index).and_then(|p| p.value)
    }

    /// The most recent defined value.
    pub fn last_defined(&self) -> Option<f64> {
        self.points.iter().rev().find_map(|p| p.value)
    }
}
