//! Observability infrastructure for Stratify
//!
//! This crate provides:
//! - Structured logging via tracing
//! - Prometheus metrics
//! - The screener metric set recorded by the strategy engine
//!
//! # Quick Start
//!
//! ```ignore
//! use observability::{init_logging, LogFormat};
//!
//! init_logging("stratify", LogFormat::Pretty)?;
//!
//! // Optional: expose /metrics for Prometheus
//! observability::metrics::init_metrics(9090)?;
//! ```

pub mod logging;
pub mod metrics;

pub use logging::{init_logging, LogFormat};
pub use metrics::{init_metrics, ScreenTimer, ScreenerMetrics};
