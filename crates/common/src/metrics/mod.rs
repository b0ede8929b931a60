//! Metrics and observability utilities
//!
//! Provides Prometheus metrics with latency histograms
//! and standardized naming conventions.

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram, Unit};
use std::time::Instant;

/// Metrics prefix for all Citegraph metrics
pub const METRICS_PREFIX: &str = "citegraph";

/// Histogram buckets for request latency (in seconds)
pub const LATENCY_BUCKETS: &[f64] = &[
    0.001,  // 1ms
    0.005,  // 5ms
    0.010,  // 10ms
    0.025,  // 25ms
    0.050,  // 50ms
    0.100,  // 100ms
    0.250,  // 250ms
    0.500,  // 500ms
    1.000,  // 1s
    2.500,  // 2.5s
    5.000,  // 5s
    10.00,  // 10s
];

/// Buckets for upstream latency (bounded by the 10s client timeout)
pub const UPSTREAM_BUCKETS: &[f64] = &[
    0.050,  // 50ms
    0.100,  // 100ms
    0.250,  // 250ms
    0.500,  // 500ms
    1.000,  // 1s
    2.000,  // 2s
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

    // Upstream metrics
    describe_counter!(
        format!("{}_upstream_requests_total", METRICS_PREFIX),
        Unit::Count,
        "OpenAlex requests by endpoint and outcome"
    );

    describe_histogram!(
        format!("{}_upstream_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "OpenAlex request latency in seconds"
    );

    describe_counter!(
        format!("{}_rate_limit_waits_total", METRICS_PREFIX),
        Unit::Count,
        "Outbound calls that had to wait for the rate limiter"
    );

    describe_histogram!(
        format!("{}_rate_limit_wait_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "Time spent waiting for the outbound rate limiter"
    );

    // Cache metrics
    describe_counter!(
        format!("{}_cache_hits_total", METRICS_PREFIX),
        Unit::Count,
        "Total cache hits"
    );

    describe_counter!(
        format!("{}_cache_misses_total", METRICS_PREFIX),
        Unit::Count,
        "Total cache misses (absent or stale)"
    );

    describe_counter!(
        format!("{}_cache_write_failures_total", METRICS_PREFIX),
        Unit::Count,
        "Upstream records that could not be cached"
    );

    // Graph metrics
    describe_counter!(
        format!("{}_graph_builds_total", METRICS_PREFIX),
        Unit::Count,
        "Citation graphs built"
    );

    describe_gauge!(
        format!("{}_graph_nodes", METRICS_PREFIX),
        Unit::Count,
        "Nodes in the last built graph"
    );

    describe_gauge!(
        format!("{}_graph_edges", METRICS_PREFIX),
        Unit::Count,
        "Edges in the last built graph"
    );

    // Search metrics
    describe_counter!(
        format!("{}_search_queries_total", METRICS_PREFIX),
        Unit::Count,
        "Total number of search queries"
    );

    describe_gauge!(
        format!("{}_search_results_count", METRICS_PREFIX),
        Unit::Count,
        "Number of results returned from search"
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

/// Helper to record one OpenAlex call
pub fn record_upstream(endpoint: &str, outcome: &str, duration_secs: f64) {
    counter!(
        format!("{}_upstream_requests_total", METRICS_PREFIX),
        "endpoint" => endpoint.to_string(),
        "outcome" => outcome.to_string()
    )
    .increment(1);

    histogram!(
        format!("{}_upstream_duration_seconds", METRICS_PREFIX),
        "endpoint" => endpoint.to_string()
    )
    .record(duration_secs);
}

/// Helper to record a rate-limiter wait
pub fn record_rate_limit_wait(duration_secs: f64) {
    counter!(format!("{}_rate_limit_waits_total", METRICS_PREFIX)).increment(1);
    histogram!(format!("{}_rate_limit_wait_seconds", METRICS_PREFIX)).record(duration_secs);
}

/// Helper to record cache metrics
pub fn record_cache(hit: bool, kind: &str) {
    if hit {
        counter!(
            format!("{}_cache_hits_total", METRICS_PREFIX),
            "kind" => kind.to_string()
        )
        .increment(1);
    } else {
        counter!(
            format!("{}_cache_misses_total", METRICS_PREFIX),
            "kind" => kind.to_string()
        )
        .increment(1);
    }
}

/// Helper to record a record that failed to cache
pub fn record_cache_write_failure(kind: &str) {
    counter!(
        format!("{}_cache_write_failures_total", METRICS_PREFIX),
        "kind" => kind.to_string()
    )
    .increment(1);
}

/// Helper to record graph metrics
pub fn record_graph(depth: u8, nodes: usize, edges: usize) {
    counter!(
        format!("{}_graph_builds_total", METRICS_PREFIX),
        "depth" => depth.to_string()
    )
    .increment(1);

    gauge!(format!("{}_graph_nodes", METRICS_PREFIX)).set(nodes as f64);
    gauge!(format!("{}_graph_edges", METRICS_PREFIX)).set(edges as f64);
}

/// Helper to record search metrics
pub fn record_search(filtered: bool, result_count: usize) {
    let mode = if filtered { "filtered" } else { "plain" };

    counter!(
        format!("{}_search_queries_total", METRICS_PREFIX),
        "mode" => mode
    )
    .increment(1);

    gauge!(
        format!("{}_search_results_count", METRICS_PREFIX),
        "mode" => mode
    )
    .set(result_count as f64);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latency_buckets() {
        for buckets in [LATENCY_BUCKETS, UPSTREAM_BUCKETS] {
            let mut prev = 0.0;
            for &bucket in buckets {
                assert!(bucket > prev);
                prev = bucket;
            }
        }

        // Upstream calls time out at 10s
        assert_eq!(UPSTREAM_BUCKETS.last(), Some(&10.0));
    }

    #[test]
    fn test_request_metrics() {
        let metrics = RequestMetrics::start("GET", "/api/search");
        std::thread::sleep(std::time::Duration::from_millis(10));
        metrics.finish(200);
        // Without an installed recorder this is a no-op
    }
}
