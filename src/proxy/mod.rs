//! Forwarding subsystem.
//!
//! # Data Flow
//! ```text
//! Matched, healthy request
//!     → headers.rs (scheme rewrites, hop-by-hop stripping)
//!     → hooks.rs (observe or adjust the outgoing head)
//!     → forwarder.rs (hyper client to http://hostname:port)
//!     → headers.rs / hooks.rs on the response head
//!     → Stream body back to client
//! ```

pub mod forwarder;
pub mod headers;
pub mod hooks;

pub use forwarder::{http_client, ForwardError, ForwardingProxy, HttpClient};
pub use hooks::{LoggingHooks, ProxyHooks};
