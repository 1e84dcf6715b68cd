//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TLS connection
//!     → server.rs (axum setup, middleware, request lifecycle)
//!     → request.rs (routing target, upgrade detection, request id)
//!     → [routing, health gate, forwarder]
//!     → response.rs (redirects and gateway errors produced locally)
//!     → websocket.rs (byte tunnel after a 101)
//! ```

pub mod request;
pub mod response;
pub mod server;
pub mod websocket;

pub use request::X_REQUEST_ID;
pub use server::ProxyInstance;
