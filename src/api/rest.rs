// =============================================================================
// REST API Endpoints — Axum 0.7
// =============================================================================
//
// All endpoints live under `/api/v1/`. The dashboard front end calls these
// whenever the asset, currency or indicator selection changes; every call
// recomputes indicators from the (possibly cached) price series.
//
// CORS is configured permissively for development; tighten `allowed_origins`
// in production.
// =============================================================================

use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Json, Query, State,
    },
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tower_http::cors::{Any, CorsLayer};
use tracing::{debug, warn};

use crate::app_state::AppState;
use crate::dashboard::{
    build_panel, latest_readings, parse_filters, IndicatorKind, IndicatorOverrides,
    IndicatorPanel, IndicatorParams,
};
use crate::indicators::IndicatorError;
use crate::market_data::{Bar, Currency, PriceSeries};
use crate::report::{render_report, REPORT_FILENAME};
use crate::runtime_config::{AssetConfig, DashboardConfig};

// =============================================================================
// Router construction
// =============================================================================

/// Build the full REST API router with CORS middleware and shared state.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/v1/health", get(health))
        .route("/api/v1/assets", get(assets))
        .route("/api/v1/series", get(series))
        .route("/api/v1/indicators", get(indicators))
        .route("/api/v1/comparison", get(comparison))
        .route("/api/v1/report", get(report))
        .route("/api/v1/indicator-defaults", post(set_indicator_defaults))
        // ── Middleware & State ───────────────────────────────────────
        .layer(cors)
        .with_state(state)
}

// =============================================================================
// Errors
// =============================================================================

/// Request failures and the status code each maps to.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("market data unavailable: {0:#}")]
    Upstream(anyhow::Error),

    #[error("internal error: {0:#}")]
    Internal(anyhow::Error),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Upstream(_) => StatusCode::BAD_GATEWAY,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<IndicatorError> for ApiError {
    fn from(e: IndicatorError) -> Self {
        Self::BadRequest(e.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.to_string();
        if matches!(self, Self::Upstream(_) | Self::Internal(_)) {
            warn!(status = %status, error = %message, "request failed");
        }
        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

type ApiResult<T> = Result<T, ApiError>;

// =============================================================================
// Selection helpers
// =============================================================================

/// Resolve the asset label and optional currency code against `config`.
/// A missing currency means USD.
fn resolve_selection(
    config: &DashboardConfig,
    asset: &str,
    currency: Option<&str>,
) -> ApiResult<(AssetConfig, Currency)> {
    let asset = config
        .asset(asset)
        .cloned()
        .ok_or_else(|| ApiError::NotFound(format!("unknown asset '{}'", asset.trim())))?;
    let currency = resolve_currency(config, currency)?;
    Ok((asset, currency))
}

fn resolve_currency(config: &DashboardConfig, currency: Option<&str>) -> ApiResult<Currency> {
    let currency = match currency {
        Some(code) => code.parse::<Currency>().map_err(ApiError::NotFound)?,
        None => Currency::Usd,
    };
    if !config.offers_currency(currency) {
        return Err(ApiError::NotFound(format!("currency {currency} is not offered")));
    }
    Ok(currency)
}

async fn load(
    state: &AppState,
    asset: &AssetConfig,
    start: NaiveDate,
    currency: Currency,
) -> ApiResult<Arc<PriceSeries>> {
    state
        .load_series(&asset.ticker, start, currency)
        .await
        .map_err(ApiError::Upstream)
}

// =============================================================================
// Health
// =============================================================================

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    uptime_secs: u64,
    cached_series: usize,
    server_time: i64,
}

async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let resp = HealthResponse {
        status: "ok",
        uptime_secs: state.uptime_secs(),
        cached_series: state.cache.len(),
        server_time: chrono::Utc::now().timestamp_millis(),
    };
    Json(resp)
}

// =============================================================================
// Assets (selector contents)
// =============================================================================

#[derive(Serialize)]
struct AssetsResponse {
    assets: Vec<AssetConfig>,
    currencies: Vec<Currency>,
    indicators: Vec<IndicatorKind>,
    defaults: IndicatorParams,
    start_date: NaiveDate,
}

async fn assets(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let config = state.config.read();
    Json(AssetsResponse {
        assets: config.assets.clone(),
        currencies: config.currencies.clone(),
        indicators: IndicatorKind::ALL.to_vec(),
        defaults: config.indicators,
        start_date: config.start_date,
    })
}

// =============================================================================
// Series (table + candlestick view)
// =============================================================================

#[derive(Deserialize)]
struct SelectionQuery {
    asset: String,
    #[serde(default)]
    currency: Option<String>,
}

#[derive(Serialize)]
struct SeriesResponse<'a> {
    asset: String,
    ticker: String,
    currency: Currency,
    bars: &'a [Bar],
}

async fn series(
    State(state): State<Arc<AppState>>,
    query: Result<Query<SelectionQuery>, QueryRejection>,
) -> ApiResult<Response> {
    let Query(query) = query?;
    let config = state.config_snapshot();
    let (asset, currency) = resolve_selection(&config, &query.asset, query.currency.as_deref())?;
    let series = load(&state, &asset, config.start_date, currency).await?;

    Ok(Json(SeriesResponse {
        asset: asset.label,
        ticker: asset.ticker,
        currency,
        bars: series.bars(),
    })
    .into_response())
}

// =============================================================================
// Indicators (overview panel)
// =============================================================================

#[derive(Deserialize)]
struct IndicatorsQuery {
    asset: String,
    #[serde(default)]
    currency: Option<String>,
    /// Comma-separated checklist, e.g. `RSI,MACD,SMA`.
    #[serde(default)]
    filters: Option<String>,
    // Kept flat: serde_urlencoded cannot deserialise numbers through
    // `#[serde(flatten)]`.
    rsi_window: Option<i64>,
    macd_short: Option<i64>,
    macd_long: Option<i64>,
    macd_signal: Option<i64>,
    sma_window: Option<i64>,
    ema_span: Option<i64>,
}

impl IndicatorsQuery {
    fn overrides(&self) -> IndicatorOverrides {
        IndicatorOverrides {
            rsi_window: self.rsi_window,
            macd_short: self.macd_short,
            macd_long: self.macd_long,
            macd_signal: self.macd_signal,
            sma_window: self.sma_window,
            ema_span: self.ema_span,
        }
    }
}

#[derive(Serialize)]
struct IndicatorsResponse {
    asset: String,
    currency: Currency,
    #[serde(flatten)]
    panel: IndicatorPanel,
}

async fn indicators(
    State(state): State<Arc<AppState>>,
    query: Result<Query<IndicatorsQuery>, QueryRejection>,
) -> ApiResult<Json<IndicatorsResponse>> {
    let Query(query) = query?;
    let config = state.config_snapshot();
    let (asset, currency) = resolve_selection(&config, &query.asset, query.currency.as_deref())?;
    let kinds = parse_filters(query.filters.as_deref().unwrap_or_default())
        .map_err(ApiError::BadRequest)?;
    let params = config.indicators.with_overrides(&query.overrides())?;

    let series = load(&state, &asset, config.start_date, currency).await?;
    let panel = build_panel(&series, &kinds, params)?;
    debug!(
        asset = %asset.label,
        currency = %currency,
        bars = panel.returns.len(),
        selected = ?panel.selected,
        "indicator panel built"
    );

    Ok(Json(IndicatorsResponse {
        asset: asset.label,
        currency,
        panel,
    }))
}

// =============================================================================
// Comparison (every configured asset side by side)
// =============================================================================

#[derive(Deserialize)]
struct ComparisonQuery {
    #[serde(default)]
    currency: Option<String>,
}

#[derive(Serialize)]
struct ComparisonEntry {
    asset: String,
    ticker: String,
    bars: Vec<Bar>,
}

#[derive(Serialize)]
struct ComparisonResponse {
    currency: Currency,
    assets: Vec<ComparisonEntry>,
}

async fn comparison(
    State(state): State<Arc<AppState>>,
    query: Result<Query<ComparisonQuery>, QueryRejection>,
) -> ApiResult<Json<ComparisonResponse>> {
    let Query(query) = query?;
    let config = state.config_snapshot();
    let currency = resolve_currency(&config, query.currency.as_deref())?;

    let mut entries = Vec::with_capacity(config.assets.len());
    for asset in &config.assets {
        let series = load(&state, asset, config.start_date, currency).await?;
        entries.push(ComparisonEntry {
            asset: asset.label.clone(),
            ticker: asset.ticker.clone(),
            bars: series.bars().to_vec(),
        });
    }

    Ok(Json(ComparisonResponse {
        currency,
        assets: entries,
    }))
}

// =============================================================================
// Report (PDF download)
// =============================================================================

async fn report(
    State(state): State<Arc<AppState>>,
    query: Result<Query<SelectionQuery>, QueryRejection>,
) -> ApiResult<Response> {
    let Query(query) = query?;
    let config = state.config_snapshot();
    let (asset, currency) = resolve_selection(&config, &query.asset, query.currency.as_deref())?;
    let series = load(&state, &asset, config.start_date, currency).await?;

    let readings = latest_readings(&series, config.indicators)?;
    let pdf = render_report(
        &asset.label,
        currency,
        series.tail(config.report_rows),
        &readings,
    )
    .map_err(ApiError::Internal)?;

    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{REPORT_FILENAME}\""),
            ),
        ],
        pdf,
    )
        .into_response())
}

// =============================================================================
// Indicator defaults (sidebar settings)
// =============================================================================

async fn set_indicator_defaults(
    State(state): State<Arc<AppState>>,
    update: Result<Json<IndicatorOverrides>, JsonRejection>,
) -> ApiResult<Json<IndicatorParams>> {
    let Json(update) = update?;
    let params = state.update_indicator_defaults(&update)?;
    Ok(Json(params))
}
