//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_requests_total` (counter): requests by method, status
//! - `gateway_request_duration_seconds` (histogram): latency distribution
//! - `gateway_license_cache_total` (counter): license lookups by outcome (hit/miss)
//! - `gateway_license_catalog_fetch_total` (counter): catalog fetches by outcome
//! - `gateway_store_reconnects_total` (counter): connectivity gate reconnects by outcome

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its scrape listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(method: &str, status: u16, start: Instant) {
    let labels = [
        ("method", method.to_string()),
        ("status", status.to_string()),
    ];
    metrics::counter!("gateway_requests_total", &labels).increment(1);
    metrics::histogram!("gateway_request_duration_seconds", &labels)
        .record(start.elapsed().as_secs_f64());
}

pub fn record_license_cache(outcome: &'static str, count: usize) {
    metrics::counter!("gateway_license_cache_total", "outcome" => outcome).increment(count as u64);
}

pub fn record_catalog_fetch(outcome: &'static str) {
    metrics::counter!("gateway_license_catalog_fetch_total", "outcome" => outcome).increment(1);
}

pub fn record_store_reconnect(outcome: &'static str) {
    metrics::counter!("gateway_store_reconnects_total", "outcome" => outcome).increment(1);
}
