//! Server infrastructure for Stratify
//!
//! This crate runs the screener's HTTP API with lifecycle management and
//! graceful shutdown.
//!
//! # Architecture
//!
//! Servers implement the [`Server`] trait, which provides a consistent
//! interface for running and monitoring them. The [`ServerExt`] trait
//! provides convenience methods like `spawn()` and `run_with_ctrl_c()`.
//!
//! Shutdown is a `CancellationToken` from `tokio_util`, cancelled on Ctrl+C.
//!
//! # Quick Start
//!
//! ```ignore
//! use server::{HttpServer, HealthState, ServerConfig, ServerExt};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ServerConfig::http_only("0.0.0.0", 8090);
//!     let health = Arc::new(HealthState::new("stratify"));
//!     let server = HttpServer::with_api(config, api_router, health);
//!     server.run_with_ctrl_c().await?;
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! - [`config`] - Bind configuration and default ports
//! - [`traits`] - `Server` and `ServerExt` traits
//! - [`http`] - HTTP server using Axum
//! - [`health`] - Health check endpoints
//! - [`shutdown`] - Ctrl+C handling

pub mod config;
pub mod error;
pub mod health;
pub mod http;
pub mod shutdown;
pub mod traits;

pub use config::{ports, ServerConfig};
pub use error::{Result, ServerError};
pub use health::{HealthState, HealthStatus};
pub use http::HttpServer;
pub use shutdown::{run_until_shutdown, ShutdownController};
pub use traits::{Server, ServerExt};
