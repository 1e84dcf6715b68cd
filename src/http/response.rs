//! Responses the proxy produces itself.
//!
//! # Design Decisions
//! - Plain-text bodies; the status line carries the meaning
//! - Failed upgrade handshakes get a bodiless reply and the connection closes

use axum::body::Body;
use axum::http::header::{CONNECTION, LOCATION};
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use std::any::Any;

/// `301 Moved Permanently` pointing at `location`.
pub fn redirect(location: &str) -> Response {
    match HeaderValue::from_str(location) {
        Ok(value) => (
            StatusCode::MOVED_PERMANENTLY,
            [(LOCATION, value)],
            format!("Redirecting to {location}"),
        )
            .into_response(),
        Err(_) => internal_error(),
    }
}

pub fn not_found() -> Response {
    (StatusCode::NOT_FOUND, "Not Found").into_response()
}

pub fn bad_gateway() -> Response {
    (StatusCode::BAD_GATEWAY, "Bad Gateway").into_response()
}

pub fn internal_error() -> Response {
    (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
}

/// Bare status line for an upgrade handshake that will not be completed.
pub fn status_line_only(status: StatusCode) -> Response {
    let mut response = Response::new(Body::empty());
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONNECTION, HeaderValue::from_static("close"));
    response
}

/// Converts a handler panic into `500`. The panic hook has already logged it.
pub fn panic_response(_payload: Box<dyn Any + Send + 'static>) -> Response {
    internal_error()
}
