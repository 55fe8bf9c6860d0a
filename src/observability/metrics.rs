//! Metrics collection and exposition.
//!
//! # Metrics
//! - `relay_operations_total` (counter): invocations by operation, outcome
//! - `relay_operation_duration_seconds` (histogram): invocation latency
//! - `relay_upstream_requests_total` (counter): SP-API attempts by method, status
//! - `relay_upstream_duration_seconds` (histogram): SP-API attempt latency
//! - `relay_retries_total` (counter): retries by cause
//! - `relay_captured_assets_total` (counter): asset records captured

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Start the Prometheus scrape endpoint.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint started"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to start metrics endpoint"),
    }
}

pub fn record_operation(operation: &str, outcome: &'static str, start: Instant) {
    counter!(
        "relay_operations_total",
        "operation" => operation.to_string(),
        "outcome" => outcome
    )
    .increment(1);
    histogram!("relay_operation_duration_seconds", "operation" => operation.to_string())
        .record(start.elapsed().as_secs_f64());
}

pub fn record_upstream(method: &str, status: Option<u16>, start: Instant) {
    let status = status.map(|s| s.to_string()).unwrap_or_else(|| "network".to_string());
    counter!(
        "relay_upstream_requests_total",
        "method" => method.to_string(),
        "status" => status
    )
    .increment(1);
    histogram!("relay_upstream_duration_seconds", "method" => method.to_string())
        .record(start.elapsed().as_secs_f64());
}

pub fn record_retry(status: Option<u16>) {
    let cause = match status {
        Some(429) => "throttled",
        Some(_) => "server_error",
        None => "network",
    };
    counter!("relay_retries_total", "cause" => cause).increment(1);
}

pub fn record_captured_assets(count: usize) {
    counter!("relay_captured_assets_total").increment(count as u64);
}
