//! HTTP request handlers for the screener API.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{NaiveDate, Utc};
use common::{StrategyKind, Symbol};
use tracing::{info, warn};

use crate::api::models::{ErrorResponse, HealthResponse};
use crate::error::ScreenError;
use crate::request::{ScreenRequest, ScreenResponse, StrategyRequest, StrategyResponse};
use crate::screener::Screener;

type ApiError = (StatusCode, Json<ErrorResponse>);

/// Shared state for screener API handlers.
pub struct ApiState {
    pub screener: Arc<Screener>,
    /// Fixed evaluation date; today (UTC) when unset
    pub as_of: Option<NaiveDate>,
}

impl ApiState {
    pub fn new(screener: Arc<Screener>) -> Self {
        Self {
            screener,
            as_of: None,
        }
    }

    pub fn with_as_of(mut self, as_of: NaiveDate) -> Self {
        self.as_of = Some(as_of);
        self
    }

    fn as_of(&self) -> NaiveDate {
        self.as_of.unwrap_or_else(|| Utc::now().date_naive())
    }
}

fn bad_request(e: impl std::fmt::Display) -> ApiError {
    (StatusCode::BAD_REQUEST, Json(ErrorResponse::new(e.to_string())))
}

fn screen_error(e: ScreenError) -> ApiError {
    let status = match e {
        ScreenError::MarketData(_) => StatusCode::BAD_GATEWAY,
        ScreenError::NoExpirations
        | ScreenError::NoExpirationsInRange
        | ScreenError::AllEvaluationsFailed(_) => StatusCode::NOT_FOUND,
    };
    (status, Json(ErrorResponse::new(e.to_string())))
}

/// GET /api/v1/screener/health
pub async fn health_handler(State(state): State<Arc<ApiState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        service: "screener".to_string(),
        provider: state.screener.provider_name().to_string(),
    })
}

/// POST /api/v1/screen
pub async fn screen(
    State(state): State<Arc<ApiState>>,
    Json(request): Json<ScreenRequest>,
) -> Result<Json<ScreenResponse>, ApiError> {
    let response = state
        .screener
        .screen(&request, state.as_of())
        .await
        .map_err(bad_request)?;
    info!(symbols = response.results.len(), "Screen request served");
    Ok(Json(response))
}

/// POST /api/v1/screen/:symbol/:strategy
pub async fn evaluate_strategy(
    State(state): State<Arc<ApiState>>,
    Path((symbol, strategy)): Path<(String, String)>,
    body: Option<Json<StrategyRequest>>,
) -> Result<Json<StrategyResponse>, ApiError> {
    let kind: StrategyKind = strategy.parse().map_err(|e: common::Error| {
        let valid = StrategyKind::ALL.iter().map(|k| k.as_str().to_string()).collect();
        (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new(e.to_string()).with_valid(valid)),
        )
    })?;

    let symbol = Symbol::new(symbol);
    if symbol.is_empty() {
        return Err(bad_request("symbol must not be blank"));
    }
    let request = body.map(|Json(r)| r).unwrap_or_default();
    request.validate().map_err(bad_request)?;

    let screener = &state.screener;
    let config = screener
        .evaluation()
        .with_selection(request.otm_percent, request.spread_width);
    let max_days = request.max_days.unwrap_or(screener.settings().max_days);

    let ranking = screener
        .evaluate_strategy(&symbol, kind, max_days, &config, state.as_of())
        .await
        .map_err(|e| {
            warn!(symbol = %symbol, strategy = kind.as_str(), error = %e, "Strategy evaluation failed");
            screen_error(e)
        })?;

    Ok(Json(StrategyResponse {
        symbol: symbol.0,
        strategy: kind,
        strategies: ranking.candidates,
    }))
}
