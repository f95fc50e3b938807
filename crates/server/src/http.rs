//! Axum HTTP server for the screener API

use async_trait::async_trait;
use axum::{routing::get, Router};
use parking_lot::RwLock;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::config::ServerConfig;
use crate::error::{Result, ServerError};
use crate::health::{health_routes, HealthState};
use crate::traits::Server;

/// Serves the screener routes next to `/` and `/health`.
///
/// Clones share the bound address, so a clone kept before
/// [`ServerExt::spawn`](crate::ServerExt::spawn) can report where the
/// listener ended up when the configured port is 0.
#[derive(Clone)]
pub struct HttpServer {
    config: ServerConfig,
    router: Router,
    bound_addr: Arc<RwLock<Option<SocketAddr>>>,
}

impl HttpServer {
    pub fn with_api(config: ServerConfig, api: Router, health: Arc<HealthState>) -> Self {
        let router = Router::new()
            .route("/", get(|| async { "Stratify HTTP Server" }))
            .merge(health_routes(health))
            .merge(api);
        Self {
            config,
            router,
            bound_addr: Arc::new(RwLock::new(None)),
        }
    }

    async fn bind(&self) -> Result<TcpListener> {
        let addr = self
            .config
            .http_addr()
            .ok_or_else(|| ServerError::ConfigError("HTTP port not configured".into()))??;
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| ServerError::bind(addr.to_string(), e))?;
        let local = listener.local_addr()?;
        *self.bound_addr.write() = Some(local);
        Ok(listener)
    }
}

#[async_trait]
impl Server for HttpServer {
    fn name(&self) -> &str {
        "http"
    }

    fn address(&self) -> Option<SocketAddr> {
        *self.bound_addr.read()
    }

    async fn run(&self, shutdown: CancellationToken) -> Result<()> {
        let listener = self.bind().await?;
        info!(server = self.name(), addr = ?self.address(), "Screener API listening");

        let served = axum::serve(listener, self.router.clone())
            .with_graceful_shutdown(async move { shutdown.cancelled().await })
            .await;
        *self.bound_addr.write() = None;

        served.map_err(|e| {
            error!(%e, "HTTP server stopped with an error");
            ServerError::Io(e)
        })?;
        info!("Screener API stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::ServerExt;
    use std::time::Duration;

    fn server(api: Router) -> HttpServer {
        let health = Arc::new(HealthState::new("stratify").with_provider("static"));
        HttpServer::with_api(ServerConfig::http_only("127.0.0.1", 0), api, health)
    }

    async fn wait_for_bind(server: &HttpServer) -> SocketAddr {
        for _ in 0..50 {
            if let Some(addr) = server.address() {
                return addr;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        panic!("server never bound");
    }

    #[tokio::test]
    async fn test_serves_api_and_health() {
        let api = Router::new().route("/api/v1/ping", get(|| async { "pong" }));
        let server = server(api);
        let watcher = server.clone();
        let (handle, token) = server.spawn();
        let addr = wait_for_bind(&watcher).await;

        let pong = reqwest::get(format!("http://{}/api/v1/ping", addr))
            .await
            .unwrap()
            .text()
            .await
            .unwrap();
        assert_eq!(pong, "pong");

        let health: serde_json::Value = reqwest::get(format!("http://{}/health", addr))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(health["service"], "stratify");
        assert_eq!(health["provider"], "static");

        token.cancel();
        let stopped = tokio::time::timeout(Duration::from_secs(5), handle).await;
        assert!(matches!(stopped, Ok(Ok(Ok(())))));
        assert!(watcher.address().is_none());
    }

    #[tokio::test]
    async fn test_missing_port_is_a_config_error() {
        let mut config = ServerConfig::default();
        config.http_port = None;
        let server = HttpServer::with_api(config, Router::new(), Arc::new(HealthState::new("x")));
        let result = server.run(CancellationToken::new()).await;
        assert!(matches!(result, Err(ServerError::ConfigError(_))));
    }
}
