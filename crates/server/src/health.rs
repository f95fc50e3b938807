//! Health check endpoints

use axum::{extract::State, response::Json, routing::get, Router};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;

/// Health check status
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub service: String,
    pub version: String,
    pub timestamp: String,
    pub uptime_seconds: u64,
    /// Market data provider the service screens against
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
}

/// Shared state for health checks
#[derive(Debug, Clone)]
pub struct HealthState {
    pub service_name: String,
    pub provider: Option<String>,
    pub start_time: Instant,
}

impl HealthState {
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            provider: None,
            start_time: Instant::now(),
        }
    }

    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    pub fn status(&self) -> HealthStatus {
        HealthStatus {
            status: "ok".to_string(),
            service: self.service_name.clone(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            timestamp: Utc::now().to_rfc3339(),
            uptime_seconds: self.uptime_seconds(),
            provider: self.provider.clone(),
        }
    }
}

/// Health check handler for HTTP
pub async fn health_handler(State(state): State<Arc<HealthState>>) -> Json<HealthStatus> {
    Json(state.status())
}

/// Create health check router
pub fn health_routes(state: Arc<HealthState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .with_state(state)
}
