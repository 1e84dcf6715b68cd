//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Validate config → Load TLS for every instance → Start listeners
//!
//! Shutdown (shutdown.rs):
//!     Signal or instance failure → Close every listener → Join tasks
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger shutdown
//! ```
//!
//! # Design Decisions
//! - Listeners start last, after all certificates loaded
//! - Listener close is immediate; open WebSocket tunnels are abandoned

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
pub use startup::run;
