//! Metrics collection and exposition.
//!
//! # Metrics
//! - `customers_admin_requests_total` (counter): dispatched requests by method, status
//! - `customers_admin_request_duration_seconds` (histogram): dispatch latency
//! - `customers_admin_pass_through_total` (counter): handler errors served by the fallback
//! - `customers_admin_fallback_total` (counter): requests that reached the fallback
//!
//! # Design Decisions
//! - Recording is a no-op until a recorder is installed, so tests need no setup
//! - The Prometheus exporter is optional and owns its own listener

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus recorder and its scrape endpoint.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

pub fn record_request(method: &str, status: u16, start: Instant) {
    ::metrics::counter!(
        "customers_admin_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    ::metrics::histogram!(
        "customers_admin_request_duration_seconds",
        "method" => method.to_string()
    )
    .record(start.elapsed().as_secs_f64());
}

pub fn record_pass_through() {
    ::metrics::counter!("customers_admin_pass_through_total").increment(1);
}

pub fn record_fallback(kind: &'static str) {
    ::metrics::counter!("customers_admin_fallback_total", "kind" => kind).increment(1);
}
