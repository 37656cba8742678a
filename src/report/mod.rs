// =============================================================================
// Report Exporter — PDF summary of an asset
// =============================================================================
//
// Lays out the most recent rows of the (already converted) series and the
// latest indicator readings. All numbers arrive precomputed; nothing here
// touches the indicator engine. Long tables continue on further pages.
// =============================================================================

pub mod pdf;

use anyhow::Result;
use chrono::{DateTime, Utc};
use tracing::info;
use uuid::Uuid;

use crate::dashboard::LatestReadings;
use crate::market_data::{Bar, Currency};

use self::pdf::{Font, TextDocument};

/// Suggested download name for the exported report.
pub const REPORT_FILENAME: &str = "rapport_analyse_financiere.pdf";

/// Render the report for `rows` (oldest first) and `readings`.
pub fn render_report(
    asset_label: &str,
    currency: Currency,
    rows: &[Bar],
    readings: &LatestReadings,
) -> Result<Vec<u8>> {
    let report_id = Uuid::new_v4();
    let document = compose_report(asset_label, currency, rows, readings, report_id, Utc::now());
    let bytes = document.render()?;
    info!(
        asset = %asset_label,
        currency = %currency,
        report_id = %report_id,
        rows = rows.len(),
        lines = document.lines().len(),
        bytes = bytes.len(),
        "report rendered"
    );
    Ok(bytes)
}

fn compose_report(
    asset_label: &str,
    currency: Currency,
    rows: &[Bar],
    readings: &LatestReadings,
    report_id: Uuid,
    generated_at: DateTime<Utc>,
) -> TextDocument {
    let title = format!("Financial Analysis Report: {asset_label}");
    let mut doc = TextDocument::new(title.clone());

    doc.line(Font::Bold, 18.0, title)
        .blank()
        .line(
            Font::Regular,
            12.0,
            format!("Historical performance for {asset_label} ({currency})"),
        )
        .blank()
        .line(Font::Bold, 11.0, format!("Most recent {} sessions", rows.len()))
        .line(Font::Mono, 9.0, table_header());
    for bar in rows {
        doc.line(Font::Mono, 9.0, table_row(bar));
    }

    doc.blank().line(Font::Bold, 11.0, READINGS_HEADING);
    for line in reading_lines(readings, currency) {
        doc.line(Font::Regular, 10.0, line);
    }

    doc.blank()
        .line(Font::Regular, 8.0, format!("Report id: {report_id}"))
        .line(
            Font::Regular,
            8.0,
            format!("Generated: {}", generated_at.format("%Y-%m-%d %H:%M:%S UTC")),
        );
    doc
}

const READINGS_HEADING: &str = "Latest indicator readings";

fn table_header() -> String {
    format!(
        "{:<10} {:>12} {:>12} {:>12} {:>12} {:>14}",
        "Date", "Open", "High", "Low", "Close", "Volume"
    )
}

fn table_row(bar: &Bar) -> String {
    let volume = bar
        .volume
        .map(|v| format!("{v:.0}"))
        .unwrap_or_else(|| "-".to_string());
    format!(
        "{:<10} {:>12.2} {:>12.2} {:>12.2} {:>12.2} {:>14}",
        bar.date.format("%Y-%m-%d"),
        bar.open,
        bar.high,
        bar.low,
        bar.close,
        volume
    )
}

fn fmt_value(value: Option<f64>, decimals: usize) -> String {
    match value {
        Some(v) => format!("{v:.decimals$}"),
        None => "n/a".to_string(),
    }
}

fn reading_lines(readings: &LatestReadings, currency: Currency) -> Vec<String> {
    let p = &readings.params;
    vec![
        format!(
            "Close ({}): {:.2} {currency}",
            readings.date.format("%Y-%m-%d"),
            readings.close
        ),
        format!(
            "Daily return: {}",
            readings
                .daily_return
                .map(|r| format!("{:.2} %", r * 100.0))
                .unwrap_or_else(|| "n/a".to_string())
        ),
        format!("RSI({}): {}", p.rsi_window, fmt_value(readings.rsi, 2)),
        format!(
            "MACD({}/{}/{}): {}  signal: {}",
            p.macd_short,
            p.macd_long,
            p.macd_signal,
            fmt_value(readings.macd, 4),
            fmt_value(readings.signal, 4)
        ),
        format!("SMA({}): {}", p.sma_window, fmt_value(readings.sma, 2)),
        format!("EMA({}): {}", p.ema_span, fmt_value(readings.ema, 2)),
    ]
}
