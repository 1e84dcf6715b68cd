//! Header rewrites across the HTTPS/HTTP boundary.
//!
//! # Responsibilities
//! - Downgrade `origin` and `referer` schemes on the way to the backend
//! - Upgrade `location` and `access-control-allow-origin` on the way back
//! - Strip hop-by-hop headers from relayed plain requests and responses
//!
//! # Design Decisions
//! - Only a leading scheme literal is rewritten; hosts and ports pass through
//! - Scheme comparison is case-sensitive
//! - Values that are not valid UTF-8 are left untouched

use axum::http::header::{
    HeaderMap, HeaderName, HeaderValue, ACCESS_CONTROL_ALLOW_ORIGIN, CONNECTION, LOCATION,
    ORIGIN, REFERER, TE, TRAILER, TRANSFER_ENCODING, UPGRADE,
};

/// Headers meaningful only for a single transport hop.
pub const HOP_BY_HOP: [HeaderName; 7] = [
    CONNECTION,
    HeaderName::from_static("keep-alive"),
    HeaderName::from_static("proxy-connection"),
    TE,
    TRAILER,
    TRANSFER_ENCODING,
    UPGRADE,
];

/// Rewrite request headers before they reach the plaintext backend.
pub fn rewrite_request_headers(headers: &mut HeaderMap) {
    replace_scheme(headers, ORIGIN, "https:", "http:");
    replace_scheme(headers, REFERER, "https:", "http:");
}

/// Rewrite backend response headers before they reach the HTTPS client.
pub fn rewrite_response_headers(headers: &mut HeaderMap) {
    replace_scheme(headers, LOCATION, "http:", "https:");
    replace_scheme(headers, ACCESS_CONTROL_ALLOW_ORIGIN, "http:", "https:");
}

/// Remove hop-by-hop headers, including any named by `Connection`.
pub fn strip_hop_by_hop(headers: &mut HeaderMap) {
    let listed: Vec<HeaderName> = headers
        .get_all(CONNECTION)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .filter_map(|token| HeaderName::from_bytes(token.trim().as_bytes()).ok())
        .collect();

    for name in listed.iter().chain(HOP_BY_HOP.iter()) {
        headers.remove(name);
    }
}

fn replace_scheme(headers: &mut HeaderMap, name: HeaderName, from: &str, to: &str) {
    let rewritten = headers
        .get(&name)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix(from))
        .and_then(|rest| HeaderValue::from_str(&format!("{to}{rest}")).ok());

    if let Some(value) = rewritten {
        headers.insert(name, value);
    }
}
