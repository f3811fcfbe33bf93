//! Metrics collection and exposition.
//!
//! # Metrics
//! - `shadow_requests_total` (counter): requests by outcome
//!   (`shadowed`, `proxied`, `cache_hit`, `not_implemented`, `error`)
//! - `shadow_cache_hits_total`, `shadow_cache_misses_total` (counter)
//! - `shadow_cache_evictions_total`, `shadow_cache_rejected_total` (counter)
//! - `shadow_cache_bytes` (gauge): bytes held by the response cache
//! - `shadow_active_connections` (gauge): connections being served
//!
//! # Design Decisions
//! - Recording goes through the `metrics` facade; without an installed
//!   recorder every call is a no-op
//! - The Prometheus exporter is optional and owns its own listener

use std::net::SocketAddr;

use metrics::{counter, gauge};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its scrape listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(outcome: &'static str) {
    counter!("shadow_requests_total", "outcome" => outcome).increment(1);
}

pub fn record_cache_hit() {
    counter!("shadow_cache_hits_total").increment(1);
}

pub fn record_cache_miss() {
    counter!("shadow_cache_misses_total").increment(1);
}

pub fn record_cache_evictions(count: u64) {
    if count > 0 {
        counter!("shadow_cache_evictions_total").increment(count);
    }
}

pub fn record_cache_rejected() {
    counter!("shadow_cache_rejected_total").increment(1);
}

pub fn set_cache_bytes(bytes: u64) {
    gauge!("shadow_cache_bytes").set(bytes as f64);
}

pub fn set_active_connections(count: usize) {
    gauge!("shadow_active_connections").set(count as f64);
}
