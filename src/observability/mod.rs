//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events via tracing)
//!     → metrics.rs (counters, gauges)
//!
//! Consumers:
//!     → stdout (pretty or JSON)
//!     → Metrics endpoint (Prometheus scrape), when configured
//! ```
//!
//! # Design Decisions
//! - Request ID (`x-request-id`) attached to every request log line
//! - Metrics are cheap (atomic increments)
//! - Logging never blocks request handling

pub mod logging;
pub mod metrics;
