//! Observation points around each relayed exchange.
//!
//! Hooks run synchronously, after the built-in header rewrites, at three
//! points: just before the request leaves for the backend, just after the
//! backend's response head arrives, and when the relay fails.

use axum::http::{request, response};

use crate::proxy::forwarder::ForwardError;

/// Callbacks invoked by a [`ForwardingProxy`](crate::proxy::ForwardingProxy).
pub trait ProxyHooks: Send + Sync + 'static {
    /// The request head about to be sent to the backend. May be modified.
    fn on_forward_request(&self, _route: &str, _request: &mut request::Parts) {}

    /// The backend's response head about to be sent to the client. May be modified.
    fn on_forward_response(&self, _route: &str, _response: &mut response::Parts) {}

    /// The relay failed before a response head was available.
    fn on_error(&self, _route: &str, _error: &ForwardError) {}
}

/// Default hooks: log each event.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingHooks;

impl ProxyHooks for LoggingHooks {
    fn on_forward_request(&self, route: &str, request: &mut request::Parts) {
        tracing::debug!(route = %route, method = %request.method, uri = %request.uri, "Relay started");
    }

    fn on_forward_response(&self, route: &str, response: &mut response::Parts) {
        tracing::debug!(route = %route, status = %response.status, "Backend responded");
    }

    fn on_error(&self, route: &str, error: &ForwardError) {
        tracing::warn!(route = %route, error = %error, "Relay failed");
    }
}
