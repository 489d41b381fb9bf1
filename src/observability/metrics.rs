//! Metrics collection and exposition.
//!
//! # Metrics
//! - `edge_requests_total` (counter): requests by decision, status
//! - `edge_request_duration_seconds` (histogram): latency distribution
//! - `edge_resolution_failures_total` (counter): failed origin lookups by reason
//! - `edge_prefilter_total` (counter): requests answered before routing
//!
//! # Design Decisions
//! - Uses the `metrics` facade; Prometheus exporter installed by the binary
//! - Labels stay low-cardinality (no hosts, no paths)

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter with its own HTTP listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(decision: &'static str, status: u16, start_time: Instant) {
    counter!(
        "edge_requests_total",
        "decision" => decision,
        "status" => status.to_string()
    )
    .increment(1);
    histogram!("edge_request_duration_seconds", "decision" => decision)
        .record(start_time.elapsed().as_secs_f64());
}

pub fn record_resolution_failure(reason: &'static str) {
    counter!("edge_resolution_failures_total", "reason" => reason).increment(1);
}

pub fn record_prefilter(action: &'static str) {
    counter!("edge_prefilter_total", "action" => action).increment(1);
}
