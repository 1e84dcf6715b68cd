//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request target (path + query)
//!     → router.rs (alias check, then route lookup)
//!     → matcher.rs (segment-boundary prefix checks)
//!     → Return: Redirect, Forward(route) or NotFound
//!
//! Route Compilation (at startup):
//!     RouteSpec (single port | named targets)
//!     → table.rs (normalise, sort longest path first)
//!     → Freeze as immutable Router
//! ```
//!
//! # Design Decisions
//! - Routes compiled at startup, immutable at runtime
//! - No regex in hot path (prefix matching only)
//! - Deterministic: same input always matches same route
//! - First match wins (ordered by path length)

pub mod matcher;
pub mod router;
pub mod table;

pub use router::{Resolution, Router};
pub use table::{Route, RouteTable};
