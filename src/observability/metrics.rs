//! Metrics collection and exposition.
//!
//! # Metrics
//! - `proxy_requests_total` (counter): requests by proxy and outcome
//! - `proxy_probe_sequences_total` (counter): probe sequences by route, verdict
//! - `proxy_probe_attempts_total` (counter): connect attempts by route
//! - `proxy_instances_running` (gauge): listeners currently serving
//!
//! # Design Decisions
//! - Recording is a no-op until an exporter is installed
//! - Labels for proxy, route and outcome only; no per-path cardinality

use metrics::{counter, gauge};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};
use std::net::SocketAddr;

/// Request outcomes as recorded in `proxy_requests_total`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Redirected,
    NotFound,
    Unavailable,
    Forwarded,
    Failed,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Redirected => "redirected",
            Outcome::NotFound => "not_found",
            Outcome::Unavailable => "unavailable",
            Outcome::Forwarded => "forwarded",
            Outcome::Failed => "failed",
        }
    }
}

/// Install the Prometheus exporter with an HTTP scrape listener.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

pub fn record_request(proxy: &str, outcome: Outcome) {
    counter!(
        "proxy_requests_total",
        "proxy" => proxy.to_string(),
        "outcome" => outcome.as_str()
    )
    .increment(1);
}

pub fn record_probe(route: &str, available: bool, attempts: u32) {
    counter!(
        "proxy_probe_sequences_total",
        "route" => route.to_string(),
        "available" => if available { "true" } else { "false" }
    )
    .increment(1);
    counter!("proxy_probe_attempts_total", "route" => route.to_string())
        .increment(u64::from(attempts));
}

pub fn instance_started(proxy: &str) {
    gauge!("proxy_instances_running", "proxy" => proxy.to_string()).increment(1.0);
}

pub fn instance_stopped(proxy: &str) {
    gauge!("proxy_instances_running", "proxy" => proxy.to_string()).decrement(1.0);
}
