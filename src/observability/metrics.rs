//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_requests_total` (counter): HTTP requests by endpoint, status
//! - `gateway_request_duration_seconds` (histogram): HTTP latency by endpoint
//! - `gateway_bridge_requests_total` (counter): bridge calls by outcome
//! - `gateway_bridge_duration_seconds` (histogram): bridge latency by outcome
//! - `gateway_broker_connect_attempts_total` (counter): by result
//! - `gateway_broker_connected` (gauge): 1=connected, 0=not
//!
//! Recording is a no-op until [`init_metrics`] installs the exporter.

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};
use std::net::SocketAddr;
use std::time::Instant;

/// Install the Prometheus recorder and serve it on `addr`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

pub fn record_request(endpoint: &'static str, status: u16, start: Instant) {
    counter!("gateway_requests_total", "endpoint" => endpoint, "status" => status.to_string())
        .increment(1);
    histogram!("gateway_request_duration_seconds", "endpoint" => endpoint)
        .record(start.elapsed().as_secs_f64());
}

pub fn record_bridge_outcome(outcome: &'static str, start: Instant) {
    counter!("gateway_bridge_requests_total", "outcome" => outcome).increment(1);
    histogram!("gateway_bridge_duration_seconds", "outcome" => outcome)
        .record(start.elapsed().as_secs_f64());
}

pub fn record_connect_attempt(success: bool) {
    let result = if success { "success" } else { "failure" };
    counter!("gateway_broker_connect_attempts_total", "result" => result).increment(1);
}

pub fn set_broker_connected(connected: bool) {
    gauge!("gateway_broker_connected").set(if connected { 1.0 } else { 0.0 });
}
