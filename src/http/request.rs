//! Request inspection.
//!
//! # Responsibilities
//! - Extract the request target used for routing (path plus query)
//! - Detect WebSocket upgrade handshakes
//! - Read the correlation id attached by the request-id layer

use axum::http::header::{CONNECTION, UPGRADE};
use axum::http::{HeaderName, Request};

/// Correlation header set on every incoming request.
pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// The raw request target: path plus query string, `/` when absent.
pub fn request_target<B>(request: &Request<B>) -> &str {
    request
        .uri()
        .path_and_query()
        .map_or("/", |pq| pq.as_str())
}

/// True for an `Upgrade: websocket` handshake.
pub fn is_websocket_upgrade<B>(request: &Request<B>) -> bool {
    let headers = request.headers();

    let upgrade = headers
        .get(UPGRADE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.eq_ignore_ascii_case("websocket"));

    let connection = headers
        .get_all(CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .any(|token| token.trim().eq_ignore_ascii_case("upgrade"));

    upgrade && connection
}

/// Correlation id for log lines; `unknown` when the layer did not run.
pub fn request_id<B>(request: &Request<B>) -> String {
    request
        .headers()
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_string()
}
