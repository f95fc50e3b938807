//! Axum route definitions for the screener API.

use std::sync::Arc;

use axum::http::Method;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::api::handlers::{self, ApiState};

/// Create all screener routes.
///
/// # Routes
///
/// - `POST /api/v1/screen` - Screen and rank a list of symbols
/// - `POST /api/v1/screen/:symbol/:strategy` - Every candidate of one strategy
/// - `GET /api/v1/screener/health` - Liveness and provider name
pub fn screener_routes(state: Arc<ApiState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);

    Router::new()
        .route("/api/v1/screen", post(handlers::screen))
        .route(
            "/api/v1/screen/:symbol/:strategy",
            post(handlers::evaluate_strategy),
        )
        .route("/api/v1/screener/health", get(handlers::health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::screener::{Screener, ScreenerSettings};
    use crate::strategies::fixtures::{as_of, chain_for, date, underlying};
    use crate::types::EvaluationConfig;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use market_data::StaticMarketData;
    use serde_json::Value;
    use tower::ServiceExt;

    fn app() -> Router {
        let provider = StaticMarketData::new()
            .with_chain("TEST", chain_for(date(2024, 1, 22)))
            .with_underlying(underlying());
        let screener = Screener::new(
            Arc::new(provider),
            EvaluationConfig::default(),
            ScreenerSettings::default(),
        );
        screener_routes(Arc::new(ApiState::new(Arc::new(screener)).with_as_of(as_of())))
    }

    fn post_json(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn send(request: Request<Body>) -> (StatusCode, Value) {
        let response = app().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_health() {
        let request = Request::builder()
            .uri("/api/v1/screener/health")
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["provider"], "static");
    }

    #[tokio::test]
    async fn test_screen() {
        let (status, body) = send(post_json("/api/v1/screen", r#"{"symbols": "test", "top_n": 3}"#)).await;
        assert_eq!(status, StatusCode::OK);
        let results = body["results"].as_array().unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0]["symbol"], "TEST");
        assert_eq!(results[0]["strategies"].as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_screen_rejects_empty_symbols() {
        let (status, body) = send(post_json("/api/v1/screen", r#"{"symbols": []}"#)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn test_screen_rejects_weights_not_summing_to_one() {
        let body = r#"{"symbols": ["TEST"], "weights": {"probability": 1, "roi": 1, "risk": 1}}"#;
        let (status, body) = send(post_json("/api/v1/screen", body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("sum to 1.0"));
    }

    #[tokio::test]
    async fn test_single_strategy() {
        let (status, body) = send(post_json(
            "/api/v1/screen/test/bull_put",
            r#"{"otm_percent": 2.5}"#,
        ))
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["strategy"], "bull_put_spread");
        assert_eq!(body["strategies"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_strategy_lists_valid_names() {
        let (status, body) = send(post_json("/api/v1/screen/test/straddle", "{}")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let valid = body["valid"].as_array().unwrap();
        assert_eq!(valid.len(), 7);
        assert!(valid.iter().any(|v| v == "iron_condor"));
    }

    #[tokio::test]
    async fn test_unknown_symbol_is_bad_gateway() {
        let (status, body) = send(post_json("/api/v1/screen/nope/long_call", "{}")).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert!(body["error"]
            .as_str()
            .unwrap()
            .starts_with("failed to fetch market data"));
    }
}
