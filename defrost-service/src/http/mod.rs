//! Report endpoint serving repeated queries from the memoized table.

use std::{net::SocketAddr, sync::Arc};

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::{
    config::AppConfig,
    loader::{LoadError, LoaderCache},
    report::{build_report, parse_date, Report, ReportError, ReportMode, ReportRequest},
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub cache: Arc<Mutex<LoaderCache>>,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        Self {
            config: Arc::new(config),
            cache: Arc::new(Mutex::new(LoaderCache::new())),
        }
    }
}

/// API error response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    pub code: String,
    pub message: String,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

#[derive(Debug)]
pub enum AppError {
    /// Invalid query parameters.
    BadRequest(String),
    /// None of the configured exports could be loaded.
    NoData(String),
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, ApiError::new("BAD_REQUEST", msg)),
            AppError::NoData(msg) => (StatusCode::SERVICE_UNAVAILABLE, ApiError::new("NO_DATA", msg)),
            AppError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ApiError::new("INTERNAL_ERROR", msg),
            ),
        };

        (status, Json(error)).into_response()
    }
}

impl From<LoadError> for AppError {
    fn from(err: LoadError) -> Self {
        AppError::NoData(err.to_string())
    }
}

impl From<ReportError> for AppError {
    fn from(err: ReportError) -> Self {
        match err {
            ReportError::EmptyTable => AppError::NoData(err.to_string()),
            _ => AppError::BadRequest(err.to_string()),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ReportQuery {
    pub start: Option<String>,
    pub end: Option<String>,
    pub delta: Option<f64>,
    #[serde(default)]
    pub mode: ReportMode,
    /// Comma-separated zone names.
    pub zone: Option<String>,
}

impl ReportQuery {
    fn into_request(self) -> Result<ReportRequest, AppError> {
        let date = |field: &str, value: Option<String>| {
            value
                .map(|v| {
                    parse_date(&v).map_err(|e| AppError::BadRequest(format!("invalid {field} '{v}': {e}")))
                })
                .transpose()
        };

        Ok(ReportRequest {
            start: date("start", self.start)?,
            end: date("end", self.end)?,
            delta_k: self.delta,
            mode: self.mode,
            zones: self
                .zone
                .map(|z| {
                    z.split(',')
                        .map(str::trim)
                        .filter(|s| !s.is_empty())
                        .map(String::from)
                        .collect()
                })
                .unwrap_or_default(),
        })
    }
}

pub async fn report_handler(
    State(state): State<AppState>,
    Query(query): Query<ReportQuery>,
) -> Result<Json<Report>, AppError> {
    metrics::counter!("report_requests_total").increment(1);
    let request = query.into_request()?;

    let loaded = {
        let mut cache = state.cache.lock().await;
        cache
            .get_or_load(&state.config.zones, &state.config.csv_options())
            .await?
    };

    let report = build_report(
        &loaded,
        &state.config.zones(),
        &state.config.engine(),
        state.config.temperature.default_delta_k,
        &request,
    )?;

    Ok(Json(report))
}

async fn health() -> &'static str {
    "ok"
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/report", get(report_handler))
        .route("/health", get(health))
        .with_state(state)
}

pub async fn serve(bind_addr: &str, state: AppState) -> anyhow::Result<()> {
    let addr: SocketAddr = bind_addr
        .parse()
        .map_err(|e| anyhow::anyhow!("invalid server.bind_addr '{bind_addr}': {e}"))?;

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "report server listening");
    axum::serve(listener, router(state).into_make_service()).await?;
    Ok(())
}
