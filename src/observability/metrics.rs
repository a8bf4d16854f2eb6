//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define routing metrics (per-cluster request counts, latency)
//! - Expose a Prometheus-compatible metrics endpoint
//!
//! # Metrics
//! - `multicluster_requests_total` (counter): routed requests by cluster, status
//! - `multicluster_request_duration_seconds` (histogram): routed round-trip latency by cluster
//! - `multicluster_cache_events_total` (counter): cache events by cache name, kind

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its scrape endpoint.
pub fn init_metrics(addr: SocketAddr) {
    let builder = PrometheusBuilder::new().with_http_listener(addr);
    if let Err(e) = builder.install() {
        tracing::error!(error = %e, "Failed to install metrics exporter");
    } else {
        tracing::info!(address = %addr, "Metrics endpoint started");
    }
}

/// Record one routed round trip.
pub fn record_route(cluster: &str, status: u16, started: Instant) {
    metrics::counter!(
        "multicluster_requests_total",
        "cluster" => cluster.to_string(),
        "status" => status.to_string(),
    )
    .increment(1);
    metrics::histogram!(
        "multicluster_request_duration_seconds",
        "cluster" => cluster.to_string(),
    )
    .record(started.elapsed().as_secs_f64());
}

/// Record one cache event delivered to handlers.
pub fn record_cache_event(cache: &str, kind: &'static str) {
    metrics::counter!(
        "multicluster_cache_events_total",
        "cache" => cache.to_string(),
        "kind" => kind,
    )
    .increment(1);
}
