//! Health checking subsystem.
//!
//! # Data Flow
//! ```text
//! Request matched to a route:
//!     → gate.rs (join in-flight probe or start one)
//!     → probe.rs (connect, retry on failure within budget)
//!     → shared verdict delivered to every waiting request
//!     → slot cleared; next request probes again
//! ```
//!
//! # Design Decisions
//! - Health is checked on demand, per request, not on a timer
//! - One probe sequence per route at a time
//! - No verdict outlives the sequence that produced it

pub mod gate;
pub mod probe;

pub use gate::{HealthGate, ProbeStats};
pub use probe::{ProbeOutcome, ProbeTarget};
