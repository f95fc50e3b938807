//! HTTP API for the screener
//!
//! ## Modules
//!
//! - `handlers` - Axum handlers over a shared [`Screener`](crate::Screener)
//! - `models` - Error and health response bodies
//! - `routes` - Router with CORS and request tracing

pub mod handlers;
pub mod models;
pub mod routes;

pub use handlers::ApiState;
pub use routes::screener_routes;
