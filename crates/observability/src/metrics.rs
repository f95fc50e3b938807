//! Prometheus metrics infrastructure
//!
//! This module installs the Prometheus exporter and defines the metric set
//! recorded while screening. When no recorder is installed every call is a
//! no-op, so the engine can record unconditionally.

use metrics::{counter, gauge, histogram, Gauge, Histogram};
use std::net::SocketAddr;
use std::time::{Duration, Instant};

use metrics_exporter_prometheus::PrometheusBuilder;

/// Initialize the Prometheus metrics exporter
///
/// Starts an HTTP listener on the given port exposing `/metrics`.
pub fn init_metrics(port: u16) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("0.0.0.0:{}", port).parse()?;

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()?;

    tracing::info!(%addr, "Metrics server listening");
    Ok(())
}

/// Screening metrics
///
/// # Metrics
///
/// * `screener_evaluations_total{strategy}` - strategy/expiration combinations evaluated
/// * `screener_candidates_total{strategy}` - combinations that produced a candidate
/// * `screener_skips_total{reason}` - combinations skipped, by reason
/// * `screener_symbols_total{outcome}` - symbols screened, `ok` or `error`
/// * `screener_screen_duration_seconds` - wall time per symbol
/// * `screener_inflight_fetches` - chain fetches currently in flight
#[derive(Clone)]
pub struct ScreenerMetrics {
    screen_duration: Histogram,
    inflight_fetches: Gauge,
    scope: String,
}

impl ScreenerMetrics {
    /// Create the metric set; `scope` labels where screening runs ("cli", "api")
    pub fn new(scope: &str) -> Self {
        let scope = scope.to_string();
        Self {
            screen_duration: histogram!("screener_screen_duration_seconds", "scope" => scope.clone()),
            inflight_fetches: gauge!("screener_inflight_fetches", "scope" => scope.clone()),
            scope,
        }
    }

    pub fn record_evaluation(&self, strategy: &'static str) {
        counter!("screener_evaluations_total", "strategy" => strategy).increment(1);
    }

    pub fn record_candidate(&self, strategy: &'static str) {
        counter!("screener_candidates_total", "strategy" => strategy).increment(1);
    }

    pub fn record_skip(&self, reason: &'static str) {
        counter!("screener_skips_total", "reason" => reason).increment(1);
    }

    pub fn record_symbol(&self, ok: bool) {
        let outcome = if ok { "ok" } else { "error" };
        counter!("screener_symbols_total", "outcome" => outcome, "scope" => self.scope.clone())
            .increment(1);
    }

    pub fn record_duration(&self, duration: Duration) {
        self.screen_duration.record(duration.as_secs_f64());
    }

    pub fn fetch_started(&self) {
        self.inflight_fetches.increment(1.0);
    }

    pub fn fetch_finished(&self) {
        self.inflight_fetches.decrement(1.0);
    }

    pub fn scope(&self) -> &str {
        &self.scope
    }
}

impl Default for ScreenerMetrics {
    fn default() -> Self {
        Self::new("default")
    }
}

/// Records screening duration when dropped
///
/// ```ignore
/// let metrics = ScreenerMetrics::new("api");
/// {
///     let _timer = ScreenTimer::new(&metrics);
///     // ... screen a symbol ...
/// }
/// ```
pub struct ScreenTimer<'a> {
    metrics: &'a ScreenerMetrics,
    start: Instant,
}

impl<'a> ScreenTimer<'a> {
    pub fn new(metrics: &'a ScreenerMetrics) -> Self {
        Self {
            metrics,
            start: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

impl Drop for ScreenTimer<'_> {
    fn drop(&mut self) {
        self.metrics.record_duration(self.start.elapsed());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_without_recorder() {
        let metrics = ScreenerMetrics::new("test");
        assert_eq!(metrics.scope(), "test");
        metrics.record_evaluation("bull_put_spread");
        metrics.record_skip("no_pricing_data");
        metrics.record_symbol(true);
        metrics.fetch_started();
        metrics.fetch_finished();
    }

    #[test]
    fn test_timer_records_on_drop() {
        let metrics = ScreenerMetrics::new("test");
        let timer = ScreenTimer::new(&metrics);
        assert!(timer.elapsed() < Duration::from_secs(5));
        drop(timer);
    }
}
