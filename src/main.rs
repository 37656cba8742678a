// =============================================================================
// Market Dashboard — Main Entry Point
// =============================================================================
//
// Serves the dashboard API: asset selector, OHLC series, technical indicator
// overlays (RSI, MACD, SMA, EMA, daily returns), the multi-asset comparison
// and the PDF report export.
// =============================================================================

// ── Module declarations ──────────────────────────────────────────────────────
mod api;
mod app_state;
mod dashboard;
mod indicators;
mod market_data;
mod report;
mod runtime_config;
mod yahoo;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::app_state::AppState;
use crate::runtime_config::DashboardConfig;

const DEFAULT_CONFIG_PATH: &str = "dashboard_config.json";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── 1. Environment & config ──────────────────────────────────────────
    let _ = dotenv::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Market Dashboard — starting up");

    let config_path = PathBuf::from(
        std::env::var("DASHBOARD_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.into()),
    );

    let mut config = if config_path.exists() {
        DashboardConfig::load(&config_path).unwrap_or_else(|e| {
            warn!(error = %format!("{e:#}"), "Failed to load config, using defaults");
            DashboardConfig::default()
        })
    } else {
        // First run: write the defaults out so they can be edited.
        let config = DashboardConfig::default();
        if let Err(e) = config.save(&config_path) {
            warn!(error = %e, "Failed to write default config");
        }
        config
    };

    // Override bind address from env if available.
    if let Ok(addr) = std::env::var("DASHBOARD_BIND_ADDR") {
        config.bind_addr = addr;
    }

    info!(
        assets = ?config.assets.iter().map(|a| a.label.as_str()).collect::<Vec<_>>(),
        currencies = ?config.currencies,
        start_date = %config.start_date,
        "Configured dashboard"
    );

    // ── 2. Build shared state ────────────────────────────────────────────
    let bind_addr = config.bind_addr.clone();
    let state = Arc::new(AppState::new(config, config_path)?);

    // ── 3. Start the API server ──────────────────────────────────────────
    let app = api::rest::router(state);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind API server to {bind_addr}"))?;
    info!(addr = %bind_addr, "API server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("API server failed")?;

    info!("Market Dashboard shut down complete.");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    warn!("Shutdown signal received — stopping gracefully");
}
