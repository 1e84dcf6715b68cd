//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! PEM files from configuration
//!     → tls.rs (read, sanity-check, build rustls config)
//!     → axum-server TLS acceptor (handshake per connection)
//!     → Hand off to HTTP layer
//! ```
//!
//! # Design Decisions
//! - TLS is always on: every instance serves HTTPS
//! - Certificate problems are startup errors, never per-request ones

pub mod tls;

pub use tls::{load_tls_config, tls_config_from_pem, TlsError};
