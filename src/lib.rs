//! Local TLS termination proxy library.
//!
//! Terminates HTTPS for local development servers, routes requests by path
//! prefix, gates each relay on a bounded reachability probe and rewrites the
//! scheme-bearing headers that cross the HTTPS/HTTP boundary.

pub mod config;
pub mod error;
pub mod health;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod proxy;
pub mod resilience;
pub mod routing;

pub use config::{FileConfig, InstanceSettings, ProxyInstanceConfig};
pub use error::Error;
pub use http::ProxyInstance;
pub use lifecycle::Shutdown;
