// =============================================================================
// Currency conversion of a USD-quoted price series
// =============================================================================
//
// Each bar is scaled by the USD->target FX close on the same date. When the
// FX series has no quote for that date (FX and equity calendars differ) the
// most recent earlier quote is used. Bars dated before the first FX quote
// have no rate and are dropped.
// =============================================================================

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::{Bar, PriceSeries, SeriesError};

/// Display currencies offered by the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    Usd,
    Eur,
    Gbp,
}

impl Currency {
    pub const ALL: [Currency; 3] = [Currency::Usd, Currency::Eur, Currency::Gbp];

    pub fn code(self) -> &'static str {
        match self {
            Self::Usd => "USD",
            Self::Eur => "EUR",
            Self::Gbp => "GBP",
        }
    }

    /// Yahoo ticker quoting how many units of `self` one USD buys, or `None`
    /// for USD itself.
    pub fn usd_rate_ticker(self) -> Option<String> {
        match self {
            Self::Usd => None,
            other => Some(format!("USD{}=X", other.code())),
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Currency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "USD" => Ok(Self::Usd),
            "EUR" => Ok(Self::Eur),
            "GBP" => Ok(Self::Gbp),
            other => Err(format!("unsupported currency '{other}'")),
        }
    }
}

/// Re-quote `series` using the FX closes in `rates`.
pub fn convert_series(series: &PriceSeries, rates: &PriceSeries) -> Result<PriceSeries, SeriesError> {
    let fx = rates.bars();
    let mut cursor = 0usize;
    let mut current_rate: Option<f64> = None;
    let mut converted = Vec::with_capacity(series.len());

    for bar in series.bars() {
        while cursor < fx.len() && fx[cursor].date <= bar.date {
            current_rate = Some(fx[cursor].close);
            cursor += 1;
        }

        let Some(rate) = current_rate else {
            continue;
        };

        converted.push(Bar {
            date: bar.date,
            open: bar.open * rate,
            high: bar.high * rate,
            low: bar.low * rate,
            close: bar.close * rate,
            volume: bar.volume,
        });
    }

    PriceSeries::new(converted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    fn flat(date: NaiveDate, price: f64) -> Bar {
        Bar::new(date, price, price, price, price)
    }

    #[test]
    fn currency_parsing_is_case_insensitive() {
        assert_eq!("eur".parse::<Currency>(), Ok(Currency::Eur));
        assert_eq!(" GBP ".parse::<Currency>(), Ok(Currency::Gbp));
        assert!("JPY".parse::<Currency>().is_err());
    }

    #[test]
    fn usd_has_no_rate_ticker() {
        assert_eq!(Currency::Usd.usd_rate_ticker(), None);
        assert_eq!(Currency::Eur.usd_rate_ticker().as_deref(), Some("USDEUR=X"));
    }

    #[test]
    fn converts_on_matching_dates() {
        let series = PriceSeries::new(vec![flat(day(4), 100.0), flat(day(5), 200.0)]).unwrap();
        let rates = PriceSeries::new(vec![flat(day(4), 0.5), flat(day(5), 0.8)]).unwrap();
        let out = convert_series(&series, &rates).unwrap();
        assert_eq!(out.closes(), vec![50.0, 160.0]);
    }

    #[test]
    fn forward_fills_missing_fx_dates() {
        let series = PriceSeries::new(vec![
            flat(day(4), 100.0),
            flat(day(6), 100.0),
            flat(day(9), 100.0),
        ])
        .unwrap();
        let rates = PriceSeries::new(vec![flat(day(4), 0.9), flat(day(8), 0.7)]).unwrap();
        let out = convert_series(&series, &rates).unwrap();
        let closes = out.closes();
        assert!((closes[0] - 90.0).abs() < 1e-9);
        assert!((closes[1] - 90.0).abs() < 1e-9);
        assert!((closes[2] - 70.0).abs() < 1e-9);
    }

    #[test]
    fn drops_bars_before_first_rate() {
        let series = PriceSeries::new(vec![flat(day(1), 10.0), flat(day(5), 10.0)]).unwrap();
        let rates = PriceSeries::new(vec![flat(day(3), 2.0)]).unwrap();
        let out = convert_series(&series, &rates).unwrap();
        assert_eq!(out.dates(), vec![day(5)]);
        assert_eq!(out.closes(), vec![20.0]);
    }

    #[test]
    fn volume_is_not_scaled() {
        let series =
            PriceSeries::new(vec![flat(day(4), 10.0).with_volume(500.0)]).unwrap();
        let rates = PriceSeries::new(vec![flat(day(4), 3.0)]).unwrap();
        let out = convert_series(&series, &rates).unwrap();
        assert_eq!(out.bars().last().unwrap().volume, Some(500.0));
    }
}
