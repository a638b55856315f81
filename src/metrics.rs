//! Prometheus metrics for request latency and upstream health.
//!
//! This module provides metrics for:
//! - HTTP request latency per matched route
//! - Store query latency per table or function
//! - Store failures by classification
//! - DoorLoop and Guesty requests by outcome

use std::time::Instant;

use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use tracing::debug;

use crate::error::StoreErrorKind;

// === Metric Name Constants ===

/// HTTP request latency metric name.
pub const METRIC_HTTP_REQUEST_LATENCY: &str = "http_request_latency_ms";
/// Store query latency metric name.
pub const METRIC_STORE_QUERY_LATENCY: &str = "store_query_latency_ms";
/// Store errors counter metric name.
pub const METRIC_STORE_ERRORS: &str = "store_errors_total";
/// DoorLoop requests counter metric name.
pub const METRIC_DOORLOOP_REQUESTS: &str = "doorloop_requests_total";
/// Guesty requests counter metric name.
pub const METRIC_GUESTY_REQUESTS: &str = "guesty_requests_total";
/// Property lookups with zero matches counter metric name.
pub const METRIC_UNMATCHED_LOOKUPS: &str = "property_lookups_unmatched_total";

/// Initialize all metric descriptions.
/// Call this once at startup to register metrics with descriptions.
pub fn init_metrics() {
    describe_histogram!(
        METRIC_HTTP_REQUEST_LATENCY,
        "HTTP request latency in milliseconds"
    );
    describe_histogram!(
        METRIC_STORE_QUERY_LATENCY,
        "Hosted store query latency in milliseconds"
    );

    describe_counter!(
        METRIC_STORE_ERRORS,
        "Total number of failed store calls by kind"
    );
    describe_counter!(
        METRIC_DOORLOOP_REQUESTS,
        "Total number of DoorLoop API requests by outcome"
    );
    describe_counter!(
        METRIC_GUESTY_REQUESTS,
        "Total number of Guesty API requests by outcome"
    );
    describe_counter!(
        METRIC_UNMATCHED_LOOKUPS,
        "Total number of property lookups that matched no units"
    );

    debug!("Metrics initialized");
}

/// Install the global Prometheus recorder and return its render handle.
pub fn install_prometheus() -> Result<PrometheusHandle, BuildError> {
    let handle = PrometheusBuilder::new().install_recorder()?;
    init_metrics();
    Ok(handle)
}

/// Record HTTP request latency.
pub fn record_http_latency(start: Instant, endpoint: &str, status: u16) {
    let latency_ms = start.elapsed().as_secs_f64() * 1000.0;
    histogram!(
        METRIC_HTTP_REQUEST_LATENCY,
        "endpoint" => endpoint.to_string(),
        "status" => status.to_string()
    )
    .record(latency_ms);
}

/// Record store query latency.
pub fn record_store_latency(start: Instant, target: &str) {
    let latency_ms = start.elapsed().as_secs_f64() * 1000.0;
    histogram!(METRIC_STORE_QUERY_LATENCY, "target" => target.to_string()).record(latency_ms);
}

/// Increment store error counter.
pub fn inc_store_errors(kind: StoreErrorKind) {
    counter!(METRIC_STORE_ERRORS, "kind" => kind.to_string()).increment(1);
}

/// Increment DoorLoop request counter.
pub fn inc_doorloop_requests(outcome: &'static str) {
    counter!(METRIC_DOORLOOP_REQUESTS, "outcome" => outcome).increment(1);
}

/// Increment Guesty request counter.
pub fn inc_guesty_requests(outcome: &'static str) {
    counter!(METRIC_GUESTY_REQUESTS, "outcome" => outcome).increment(1);
}

/// Increment unmatched lookup counter.
pub fn inc_unmatched_lookups() {
    counter!(METRIC_UNMATCHED_LOOKUPS).increment(1);
}

/// RAII guard for timing store calls.
/// Automatically records latency when dropped.
pub struct StoreTimer {
    start: Instant,
    target: String,
}

impl StoreTimer {
    /// Start timing a call against `target`.
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            start: Instant::now(),
            target: target.into(),
        }
    }
}

impl Drop for StoreTimer {
    fn drop(&mut self) {
        record_store_latency(self.start, &self.target);
    }
}
