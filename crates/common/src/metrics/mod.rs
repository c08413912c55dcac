//! Metrics and observability utilities
//!
//! Provides Prometheus metrics with SLO-aligned histograms
//! and standardized naming conventions.

use crate::db::models::{ArticleStatus, Verdict};
use metrics::{counter, describe_counter, describe_histogram, histogram, Unit};
use std::time::Instant;

/// Metrics prefix for all Symposium metrics
pub const METRICS_PREFIX: &str = "symposium";

/// SLO-aligned histogram buckets for request latency (in seconds)
/// Targets: P50 < 50ms, P99 < 150ms
pub const LATENCY_BUCKETS: &[f64] = &[
    0.001,  // 1ms
    0.005,  // 5ms
    0.010,  // 10ms
    0.025,  // 25ms
    0.050,  // 50ms - P50 target
    0.075,  // 75ms
    0.100,  // 100ms
    0.150,  // 150ms - P99 target
    0.250,  // 250ms
    0.500,  // 500ms
    1.000,  // 1s
    2.500,  // 2.5s
    5.000,  // 5s
    10.00,  // 10s
];

/// Register all metric descriptions
pub fn register_metrics() {
    // Request metrics
    describe_counter!(
        format!("{}_requests_total", METRICS_PREFIX),
        Unit::Count,
        "Total number of HTTP requests"
    );

    describe_histogram!(
        format!("{}_request_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "HTTP request latency in seconds"
    );

    // Review workflow metrics
    describe_counter!(
        format!("{}_evaluations_total", METRICS_PREFIX),
        Unit::Count,
        "Total evaluations recorded"
    );

    describe_counter!(
        format!("{}_status_transitions_total", METRICS_PREFIX),
        Unit::Count,
        "Total article status transitions"
    );

    describe_counter!(
        format!("{}_articles_submitted_total", METRICS_PREFIX),
        Unit::Count,
        "Total articles submitted"
    );

    describe_counter!(
        format!("{}_versions_submitted_total", METRICS_PREFIX),
        Unit::Count,
        "Total correction versions submitted"
    );

    // Upload metrics
    describe_counter!(
        format!("{}_files_stored_total", METRICS_PREFIX),
        Unit::Count,
        "Total files written to the store"
    );

    describe_histogram!(
        format!("{}_file_size_bytes", METRICS_PREFIX),
        Unit::Bytes,
        "Size of stored files in bytes"
    );

    tracing::info!("Metrics registered");
}

/// Helper to record request metrics
pub struct RequestMetrics {
    start: Instant,
    endpoint: String,
    method: String,
}

impl RequestMetrics {
    /// Start tracking a request
    pub fn start(method: &str, endpoint: &str) -> Self {
        Self {
            start: Instant::now(),
            endpoint: endpoint.to_string(),
            method: method.to_string(),
        }
    }

    /// Record request completion
    pub fn finish(self, status: u16) {
        let duration = self.start.elapsed().as_secs_f64();

        counter!(
            format!("{}_requests_total", METRICS_PREFIX),
            "method" => self.method.clone(),
            "endpoint" => self.endpoint.clone(),
            "status" => status.to_string()
        )
        .increment(1);

        histogram!(
            format!("{}_request_duration_seconds", METRICS_PREFIX),
            "method" => self.method,
            "endpoint" => self.endpoint
        )
        .record(duration);
    }
}

/// Helper to record a recorded evaluation, labeled by verdict
pub fn record_evaluation(verdict: Verdict) {
    counter!(
        format!("{}_evaluations_total", METRICS_PREFIX),
        "verdict" => verdict.as_str()
    )
    .increment(1);
}

/// Helper to record an article status transition
pub fn record_status_transition(from: ArticleStatus, to: ArticleStatus) {
    counter!(
        format!("{}_status_transitions_total", METRICS_PREFIX),
        "from" => from.as_str(),
        "to" => to.as_str()
    )
    .increment(1);
}

/// Helper to record a new article submission
pub fn record_article_submitted() {
    counter!(format!("{}_articles_submitted_total", METRICS_PREFIX)).increment(1);
}

/// Helper to record a correction version submission
pub fn record_version_submitted() {
    counter!(format!("{}_versions_submitted_total", METRICS_PREFIX)).increment(1);
}

/// Helper to record a file landing in the store
pub fn record_file_stored(size_bytes: usize) {
    counter!(format!("{}_files_stored_total", METRICS_PREFIX)).increment(1);
    histogram!(format!("{}_file_size_bytes", METRICS_PREFIX)).record(size_bytes as f64);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latency_buckets() {
        // Verify buckets are sorted and contain SLO targets
        let mut prev = 0.0;
        for &bucket in LATENCY_BUCKETS {
            assert!(bucket > prev);
            prev = bucket;
        }

        // P50 target (50ms) should be in buckets
        assert!(LATENCY_BUCKETS.contains(&0.050));
        // P99 target (150ms) should be in buckets
        assert!(LATENCY_BUCKETS.contains(&0.150));
    }

    #[test]
    fn test_request_metrics() {
        let metrics = RequestMetrics::start("POST", "/v1/evaluations");
        std::thread::sleep(std::time::Duration::from_millis(10));
        metrics.finish(201);
        // Just verify it runs without panic
    }
}
