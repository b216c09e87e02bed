//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_requests_total` (counter): requests by route, status
//! - `gateway_request_duration_seconds` (histogram): time to response head
//! - `gateway_relays_total` (counter): finished relays by outcome
//! - `gateway_relay_bytes_total` (counter): bytes handed to clients
//!
//! Without an installed recorder every call is a no-op, so tests and
//! metrics-disabled deployments pay nothing.

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its scrape listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Record a finished request (up to the response head).
pub fn record_request(route: &'static str, status: u16, start: Instant) {
    let status = status.to_string();
    metrics::counter!("gateway_requests_total", "route" => route, "status" => status).increment(1);
    metrics::histogram!("gateway_request_duration_seconds", "route" => route)
        .record(start.elapsed().as_secs_f64());
}

/// Record a finished relay.
pub fn record_relay(outcome: &'static str, bytes: u64) {
    metrics::counter!("gateway_relays_total", "outcome" => outcome).increment(1);
    metrics::counter!("gateway_relay_bytes_total").increment(bytes);
}
