//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Request matched to a route:
//!     → health gate asks retries.rs how long it may keep probing
//!     → each attempt bounded by the attempt timeout
//!     → budget exhausted: gate resolves "unavailable" (502)
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every probe attempt has a deadline
//! - Forwarded requests are never retried; only reachability is
//! - Unreachable backends are an expected outcome, not an error

pub mod retries;

pub use retries::{RetryPolicy, DEFAULT_ATTEMPT_TIMEOUT};
