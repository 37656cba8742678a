// =============================================================================
// Yahoo Finance Chart API Client — daily OHLCV history
// =============================================================================
//
// Uses the public, unauthenticated v8 chart endpoint:
//
//   GET {base}/v8/finance/chart/{ticker}?period1=..&period2=..&interval=1d
//
// The response is column-oriented (parallel arrays of timestamps, opens,
// highs, ...). It is turned into a row-oriented, validated `PriceSeries`
// here so nothing downstream relies on positional alignment.
// =============================================================================

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use reqwest::Url;
use serde::Deserialize;
use tracing::{debug, instrument, warn};

use crate::market_data::{Bar, PriceSeries};

/// Default API host.
pub const DEFAULT_BASE_URL: &str = "https://query1.finance.yahoo.com";

/// Yahoo rejects requests without a browser-like user agent.
const CLIENT_USER_AGENT: &str = "Mozilla/5.0 (compatible; market-dashboard/1.0)";

// =============================================================================
// Response shapes
// =============================================================================

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    chart: ChartBody,
}

#[derive(Debug, Deserialize)]
struct ChartBody {
    #[serde(default)]
    result: Option<Vec<ChartData>>,
    #[serde(default)]
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    #[serde(default)]
    meta: ChartMeta,
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: ChartIndicators,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChartMeta {
    /// Exchange offset from UTC in seconds; used to map a bar's timestamp to
    /// its local trading date.
    #[serde(default)]
    gmtoffset: i64,
}

#[derive(Debug, Deserialize)]
struct ChartIndicators {
    quote: Vec<QuoteColumns>,
}

#[derive(Debug, Default, Deserialize)]
struct QuoteColumns {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<f64>>,
}

// =============================================================================
// Client
// =============================================================================

/// Yahoo Finance chart API client.
#[derive(Debug, Clone)]
pub struct YahooClient {
    base_url: String,
    client: reqwest::Client,
}

impl YahooClient {
    // -------------------------------------------------------------------------
    // Construction
    // -------------------------------------------------------------------------

    /// Create a client against `base_url` (normally [`DEFAULT_BASE_URL`]).
    pub fn new(base_url: impl Into<String>, timeout_secs: u64) -> Result<Self> {
        let mut default_headers = HeaderMap::new();
        default_headers.insert(USER_AGENT, HeaderValue::from_static(CLIENT_USER_AGENT));

        let client = reqwest::Client::builder()
            .default_headers(default_headers)
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()
            .context("failed to build reqwest client")?;

        let base_url = base_url.into().trim_end_matches('/').to_string();
        debug!(base_url = %base_url, "YahooClient initialised");

        Ok(Self { base_url, client })
    }

    // -------------------------------------------------------------------------
    // Public market data
    // -------------------------------------------------------------------------

    /// Daily bars for `ticker` from `start` (inclusive) up to now.
    #[instrument(skip(self), name = "yahoo::fetch_daily")]
    pub async fn fetch_daily(&self, ticker: &str, start: NaiveDate) -> Result<PriceSeries> {
        let url = self.chart_url(ticker, start, Utc::now())?;

        let resp = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("GET chart for {ticker} failed"))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .with_context(|| format!("failed to read chart response for {ticker}"))?;

        if !status.is_success() {
            // Yahoo still sends a JSON envelope with an error object on 4xx.
            if let Ok(envelope) = serde_json::from_str::<ChartEnvelope>(&body) {
                if let Some(err) = envelope.chart.error {
                    anyhow::bail!(
                        "Yahoo chart for {ticker} returned {status}: {} ({})",
                        err.description,
                        err.code
                    );
                }
            }
            anyhow::bail!("Yahoo chart for {ticker} returned {status}");
        }

        let series = parse_chart(&body).with_context(|| format!("bad chart payload for {ticker}"))?;
        debug!(ticker, count = series.len(), "daily bars fetched");
        Ok(series)
    }

    // -------------------------------------------------------------------------
    // Internal helpers
    // -------------------------------------------------------------------------

    fn chart_url(&self, ticker: &str, start: NaiveDate, end: DateTime<Utc>) -> Result<Url> {
        let mut url = Url::parse(&format!("{}/v8/finance/chart", self.base_url))
            .with_context(|| format!("invalid base url '{}'", self.base_url))?;

        url.path_segments_mut()
            .map_err(|_| anyhow::anyhow!("base url '{}' cannot carry a path", self.base_url))?
            .push(ticker);

        let period1 = start
            .and_hms_opt(0, 0, 0)
            .context("invalid start date")?
            .and_utc()
            .timestamp();

        url.query_pairs_mut()
            .append_pair("period1", &period1.to_string())
            .append_pair("period2", &end.timestamp().to_string())
            .append_pair("interval", "1d")
            .append_pair("events", "history");

        Ok(url)
    }
}

// =============================================================================
// Parsing
// =============================================================================

/// Turn a chart JSON payload into a validated series.
///
/// Rows with a missing open/high/low/close are skipped (Yahoo emits nulls for
/// halted sessions), as are rows quoting a zero, negative or non-finite
/// price. When two rows land on the same trading date the later one wins.
pub fn parse_chart(body: &str) -> Result<PriceSeries> {
    let envelope: ChartEnvelope =
        serde_json::from_str(body).context("failed to parse chart JSON")?;

    if let Some(err) = envelope.chart.error {
        anyhow::bail!("Yahoo error {}: {}", err.code, err.description);
    }

    let data = envelope
        .chart
        .result
        .and_then(|mut r| if r.is_empty() { None } else { Some(r.swap_remove(0)) })
        .context("chart response has no result")?;

    let quote = data.indicators.quote.into_iter().next().unwrap_or_default();
    let offset = data.meta.gmtoffset;

    let mut rows: BTreeMap<NaiveDate, Bar> = BTreeMap::new();
    let mut skipped = 0usize;
    let mut invalid = 0usize;

    for (i, &ts) in data.timestamp.iter().enumerate() {
        let column = |col: &[Option<f64>]| col.get(i).copied().flatten();

        let (Some(open), Some(high), Some(low), Some(close)) = (
            column(&quote.open),
            column(&quote.high),
            column(&quote.low),
            column(&quote.close),
        ) else {
            skipped += 1;
            continue;
        };

        let date = DateTime::from_timestamp(ts + offset, 0)
            .with_context(|| format!("timestamp {ts} out of range"))?
            .date_naive();

        let bar = Bar::new(date, open, high, low, close);
        let bar = match column(&quote.volume) {
            Some(volume) => bar.with_volume(volume),
            None => bar,
        };
        if let Err(e) = bar.validate() {
            debug!(error = %e, "dropping chart row");
            invalid += 1;
            continue;
        }
        rows.insert(date, bar);
    }

    if skipped > 0 {
        warn!(skipped, "skipped chart rows with missing prices");
    }
    if invalid > 0 {
        warn!(invalid, "skipped chart rows with non-positive prices");
    }

    PriceSeries::new(rows.into_values().collect()).context("chart rows do not form a valid series")
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    // 2024-01-02 14:30 UTC, 2024-01-03 14:30 UTC, 2024-01-04 14:30 UTC
    const SAMPLE: &str = r#"{
        "chart": {
            "result": [{
                "meta": { "symbol": "^GSPC", "gmtoffset": -18000 },
                "timestamp": [1704205800, 1704292200, 1704378600],
                "indicators": {
                    "quote": [{
                        "open":   [4745.2, null,   4697.4],
                        "high":   [4754.3, 4729.3, 4726.8],
                        "low":    [4722.7, 4699.7, 4687.5],
                        "close":  [4742.8, 4704.8, 4688.7],
                        "volume": [3743050000, 3950760000, null]
                    }],
                    "adjclose": [{ "adjclose": [4742.8, 4704.8, 4688.7] }]
                }
            }],
            "error": null
        }
    }"#;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn parses_rows_and_skips_nulls() {
        let series = parse_chart(SAMPLE).unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series.dates(), vec![ymd(2024, 1, 2), ymd(2024, 1, 4)]);
        assert_eq!(series.closes(), vec![4742.8, 4688.7]);
        assert_eq!(series.bars()[0].volume, Some(3_743_050_000.0));
        assert_eq!(series.bars()[1].volume, None);
    }

    #[test]
    fn surfaces_api_error() {
        let body = r#"{"chart":{"result":null,"error":{"code":"Not Found","description":"No data found, symbol may be delisted"}}}"#;
        let err = parse_chart(body).unwrap_err().to_string();
        assert!(err.contains("Not Found"), "{err}");
    }

    #[test]
    fn missing_result_is_an_error() {
        let body = r#"{"chart":{"result":[],"error":null}}"#;
        assert!(parse_chart(body).is_err());
    }

    #[test]
    fn empty_timestamps_give_empty_series() {
        let body = r#"{"chart":{"result":[{"meta":{},"indicators":{"quote":[{}]}}],"error":null}}"#;
        let series = parse_chart(body).unwrap();
        assert!(series.is_empty());
    }

    #[test]
    fn unsorted_and_duplicate_rows_are_normalised() {
        let body = r#"{"chart":{"result":[{
            "meta": {"gmtoffset": 0},
            "timestamp": [1704326400, 1704240000, 1704326400],
            "indicators": {"quote": [{
                "open":  [3.0, 2.0, 4.0],
                "high":  [3.0, 2.0, 4.0],
                "low":   [3.0, 2.0, 4.0],
                "close": [3.0, 2.0, 4.0]
            }]}
        }],"error":null}}"#;
        let series = parse_chart(body).unwrap();
        assert_eq!(series.dates(), vec![ymd(2024, 1, 3), ymd(2024, 1, 4)]);
        assert_eq!(series.closes(), vec![2.0, 4.0]);
    }

    #[test]
    fn non_positive_price_rows_are_skipped() {
        let body = r#"{"chart":{"result":[{
            "timestamp": [1704240000, 1704326400, 1704412800, 1704499200],
            "indicators": {"quote": [{
                "open":  [1.0, 1.0, 2.0, 3.0],
                "high":  [1.5, 1.0, 2.5, 3.5],
                "low":   [0.5, 0.0, 1.5, 2.5],
                "close": [1.2, 1.0, -2.0, 3.1]
            }]}
        }],"error":null}}"#;
        let series = parse_chart(body).unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series.dates(), vec![ymd(2024, 1, 3), ymd(2024, 1, 6)]);
        assert_eq!(series.closes(), vec![1.2, 3.1]);
    }

    #[test]
    fn chart_url_carries_period_and_interval() {
        let client = YahooClient::new(DEFAULT_BASE_URL, 10).unwrap();
        let end = ymd(2024, 6, 1).and_hms_opt(0, 0, 0).unwrap().and_utc();
        let url = client.chart_url("BTC-USD", ymd(2019, 1, 1), end).unwrap();
        assert_eq!(url.host_str(), Some("query1.finance.yahoo.com"));
        assert_eq!(url.path(), "/v8/finance/chart/BTC-USD");
        let text = url.as_str();
        assert!(text.contains("period1=1546300800"), "{text}");
        assert!(text.contains("period2=1717200000"), "{text}");
        assert!(text.contains("interval=1d"), "{text}");
    }

    #[test]
    fn chart_url_keeps_ticker_in_one_segment() {
        let client = YahooClient::new("http://localhost:9000/", 10).unwrap();
        let end = ymd(2024, 6, 1).and_hms_opt(0, 0, 0).unwrap().and_utc();
        let url = client.chart_url("A/B", ymd(2024, 1, 1), end).unwrap();
        assert_eq!(url.path(), "/v8/finance/chart/A%2FB");
    }
}
