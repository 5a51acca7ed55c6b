//! Metrics collection and exposition.
//!
//! # Metrics
//! - `capture_requests_total` (counter): capture attempts by method, status
//! - `capture_duration_seconds` (histogram): capture write latency
//! - `management_requests_total` (counter): management API hits by endpoint,
//!   status
//!
//! # Design Decisions
//! - Exporter runs on its own address, away from the capture surface, so
//!   scrapes are never captured as traffic

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter on `addr`. Failure is logged, not fatal:
/// the service works without metrics.
pub fn init_metrics(addr: SocketAddr) {
    let builder = PrometheusBuilder::new().with_http_listener(addr);
    match builder.install() {
        Ok(()) => tracing::info!(address = %addr, "metrics exporter listening"),
        Err(err) => tracing::error!(error = %err, "failed to install metrics exporter"),
    }
}

pub fn record_capture(method: &str, status: u16, start: Instant) {
    metrics::counter!(
        "capture_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    metrics::histogram!("capture_duration_seconds").record(start.elapsed().as_secs_f64());
}

pub fn record_api(endpoint: &'static str, status: u16) {
    metrics::counter!(
        "management_requests_total",
        "endpoint" => endpoint,
        "status" => status.to_string()
    )
    .increment(1);
}
