//! Metrics collection and exposition.
//!
//! # Metrics
//! - `scan_gate_admissions_total` (counter): admission decisions by outcome
//! - `scan_gate_tracked_clients` (gauge): clients holding limiter state
//! - `scan_gate_evictions_total` (counter): clients removed by the sweeper
//! - `scan_gate_upstream_requests_total` (counter): forwarded requests by status
//! - `scan_gate_upstream_duration_seconds` (histogram): forwarding latency

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its scrape listener.
///
/// Must be called from inside a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_admission(allowed: bool) {
    let outcome = if allowed { "allowed" } else { "denied" };
    counter!("scan_gate_admissions_total", "outcome" => outcome).increment(1);
}

pub fn record_tracked_clients(count: usize) {
    gauge!("scan_gate_tracked_clients").set(count as f64);
}

pub fn record_evictions(count: usize) {
    counter!("scan_gate_evictions_total").increment(count as u64);
}

pub fn record_upstream(method: &str, status: u16, start: Instant) {
    counter!(
        "scan_gate_upstream_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    histogram!("scan_gate_upstream_duration_seconds").record(start.elapsed().as_secs_f64());
}
