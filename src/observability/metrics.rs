//! Metrics collection and exposition.
//!
//! # Metrics
//! - `largeheaders_responses_inspected_total` (counter)
//! - `largeheaders_flagged_total` (counter): by reason
//! - `largeheaders_log_rotations_total` (counter)
//! - `largeheaders_log_write_failures_total` (counter)
//! - `largeheaders_requests_total` (counter): by method, status
//! - `largeheaders_request_duration_seconds` (histogram)
//!
//! # Design Decisions
//! - Recording without an installed exporter is a no-op
//! - Prometheus exporter is opt-in via config

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter listening on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint started"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_inspected() {
    counter!("largeheaders_responses_inspected_total").increment(1);
}

pub fn record_flagged(reason: &'static str) {
    counter!("largeheaders_flagged_total", "reason" => reason).increment(1);
}

pub fn record_log_rotation() {
    counter!("largeheaders_log_rotations_total").increment(1);
}

pub fn record_log_write_failure() {
    counter!("largeheaders_log_write_failures_total").increment(1);
}

pub fn record_request(method: &str, status: u16, start: Instant) {
    let method = method.to_string();
    let status = status.to_string();
    counter!("largeheaders_requests_total", "method" => method.clone(), "status" => status.clone())
        .increment(1);
    histogram!("largeheaders_request_duration_seconds", "method" => method, "status" => status)
        .record(start.elapsed().as_secs_f64());
}
