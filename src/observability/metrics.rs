//! Metrics collection and exposition.
//!
//! # Metrics
//! - `monitor_proxied_requests_total` (counter): proxied calls by method, status
//! - `monitor_upstream_duration_seconds` (histogram): upstream latency by method
//! - `monitor_problems_total` (counter): detected problems by kind, severity
//! - `monitor_storage_errors_total` (counter): failed storage operations

use std::net::SocketAddr;
use std::time::Duration;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{BuildError, Matcher, PrometheusBuilder};

use crate::monitor::model::{ProblemKind, Severity};

const UPSTREAM_DURATION: &str = "monitor_upstream_duration_seconds";

/// Install the Prometheus recorder with an HTTP listener on `addr`.
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .set_buckets_for_metric(
            Matcher::Full(UPSTREAM_DURATION.to_string()),
            &[0.05, 0.1, 0.25, 0.5, 1.0, 2.0, 5.0, 10.0],
        )?
        .install()?;

    tracing::info!(address = %addr, "Metrics endpoint started");
    Ok(())
}

/// Record one proxied call. `status` is 0 when the upstream call failed.
pub fn record_proxied_request(method: &str, status: u16, elapsed: Duration) {
    counter!(
        "monitor_proxied_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);

    histogram!(UPSTREAM_DURATION, "method" => method.to_string()).record(elapsed.as_secs_f64());
}

pub fn record_problem(kind: ProblemKind, severity: Severity) {
    counter!(
        "monitor_problems_total",
        "kind" => kind.as_str(),
        "severity" => severity.as_str()
    )
    .increment(1);
}

pub fn record_storage_error(operation: &'static str) {
    counter!("monitor_storage_errors_total", "operation" => operation).increment(1);
}
