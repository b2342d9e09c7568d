//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_requests_total` (counter): requests by endpoint, method, status
//! - `gateway_request_duration_seconds` (histogram): latency by endpoint
//! - `gateway_errors_total` (counter): failures by endpoint and error kind
//!
//! # Design Decisions
//! - Labels are the flattened endpoint name, never the raw URL, to keep
//!   cardinality bounded
//! - The Prometheus listener is optional (`observability.metrics_enabled`)

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

pub const REQUESTS_TOTAL: &str = "gateway_requests_total";
pub const REQUEST_DURATION_SECONDS: &str = "gateway_request_duration_seconds";
pub const ERRORS_TOTAL: &str = "gateway_errors_total";

/// Record one finished request.
pub fn record_request(endpoint: &str, method: &str, status: u16, start: Instant) {
    counter!(
        REQUESTS_TOTAL,
        "endpoint" => endpoint.to_string(),
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);

    histogram!(REQUEST_DURATION_SECONDS, "endpoint" => endpoint.to_string())
        .record(start.elapsed().as_secs_f64());
}

/// Record one failure.
pub fn record_error(endpoint: &str, kind: &'static str) {
    counter!(ERRORS_TOTAL, "endpoint" => endpoint.to_string(), "kind" => kind).increment(1);
}

/// Install the global recorder and serve `/metrics` on `addr`.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}
