//! Per-route forwarding to a plaintext backend.
//!
//! # Responsibilities
//! - Point the request at `http://{hostname}:{port}` keeping path and query
//! - Apply the boundary header rewrites in both directions
//! - Relay plain requests and WebSocket handshakes
//!
//! # Design Decisions
//! - Bodies stream through; nothing is buffered
//! - The backend hop is always HTTP/1.1
//! - Errors before the response head become [`ForwardError`]; errors while
//!   streaming the body are logged and abort the client connection

use axum::body::Body;
use axum::http::header::HOST;
use axum::http::uri::{Authority, InvalidUri};
use axum::http::{HeaderValue, Request, Response, StatusCode, Uri, Version};
use http_body_util::BodyExt;
use hyper_util::client::legacy::{connect::HttpConnector, Client};
use hyper_util::rt::TokioExecutor;
use std::sync::Arc;
use thiserror::Error;

use crate::health::ProbeTarget;
use crate::http::websocket;
use crate::proxy::headers;
use crate::proxy::hooks::ProxyHooks;

/// HTTP client shared by every route of an instance.
pub type HttpClient = Client<HttpConnector, Body>;

/// Build the backend client.
pub fn http_client() -> HttpClient {
    let mut connector = HttpConnector::new();
    connector.set_nodelay(true);
    Client::builder(TokioExecutor::new()).build(connector)
}

/// Failure to relay an exchange.
#[derive(Debug, Error)]
pub enum ForwardError {
    #[error("backend request failed: {0}")]
    Upstream(#[from] hyper_util::client::legacy::Error),

    #[error("invalid backend uri: {0}")]
    InvalidUri(#[from] InvalidUri),
}

impl ForwardError {
    /// Status reported to the client when nothing has been sent yet.
    pub fn status(&self) -> StatusCode {
        match self {
            ForwardError::Upstream(_) => StatusCode::BAD_GATEWAY,
            ForwardError::InvalidUri(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Transport primitive for one route.
pub struct ForwardingProxy {
    route: String,
    backend: ProbeTarget,
    client: HttpClient,
    hooks: Arc<dyn ProxyHooks>,
}

impl ForwardingProxy {
    pub fn new(
        route: impl Into<String>,
        backend: ProbeTarget,
        client: HttpClient,
        hooks: Arc<dyn ProxyHooks>,
    ) -> Self {
        Self {
            route: route.into(),
            backend,
            client,
            hooks,
        }
    }

    /// Relay a plain HTTP request and stream the backend's response back.
    pub async fn forward(&self, request: Request<Body>) -> Result<Response<Body>, ForwardError> {
        let (mut parts, body) = request.into_parts();

        let client_authority = parts.uri.authority().cloned();
        parts.uri = self.backend_uri(&parts.uri)?;
        parts.version = Version::HTTP_11;
        headers::strip_hop_by_hop(&mut parts.headers);
        headers::rewrite_request_headers(&mut parts.headers);
        ensure_host(&mut parts.headers, client_authority.as_ref());
        self.hooks.on_forward_request(&self.route, &mut parts);

        let response = self
            .client
            .request(Request::from_parts(parts, body))
            .await
            .map_err(|e| self.fail(e.into()))?;

        let (mut parts, body) = response.into_parts();
        headers::strip_hop_by_hop(&mut parts.headers);
        headers::rewrite_response_headers(&mut parts.headers);
        self.hooks.on_forward_response(&self.route, &mut parts);

        let route = self.route.clone();
        let body = body.map_err(move |e| {
            tracing::warn!(route = %route, error = %e, "Relay interrupted after response head was sent");
            e
        });

        Ok(Response::from_parts(parts, Body::new(body)))
    }

    /// Relay a WebSocket handshake; on `101` splice the two upgraded streams.
    ///
    /// A backend that declines the upgrade has its response passed through.
    pub async fn forward_upgrade(
        &self,
        mut request: Request<Body>,
    ) -> Result<Response<Body>, ForwardError> {
        let client_upgrade = hyper::upgrade::on(&mut request);
        let (mut parts, _body) = request.into_parts();

        let client_authority = parts.uri.authority().cloned();
        parts.uri = self.backend_uri(&parts.uri)?;
        parts.version = Version::HTTP_11;
        headers::rewrite_request_headers(&mut parts.headers);
        ensure_host(&mut parts.headers, client_authority.as_ref());
        self.hooks.on_forward_request(&self.route, &mut parts);

        let mut response = self
            .client
            .request(Request::from_parts(parts, Body::empty()))
            .await
            .map_err(|e| self.fail(e.into()))?;

        if response.status() != StatusCode::SWITCHING_PROTOCOLS {
            tracing::debug!(route = %self.route, status = %response.status(), "Backend declined upgrade");
            let (mut parts, body) = response.into_parts();
            headers::rewrite_response_headers(&mut parts.headers);
            self.hooks.on_forward_response(&self.route, &mut parts);
            return Ok(Response::from_parts(parts, Body::new(body)));
        }

        let backend_upgrade = hyper::upgrade::on(&mut response);
        websocket::spawn_tunnel(self.route.clone(), client_upgrade, backend_upgrade);

        let (mut parts, _body) = response.into_parts();
        headers::rewrite_response_headers(&mut parts.headers);
        self.hooks.on_forward_response(&self.route, &mut parts);
        Ok(Response::from_parts(parts, Body::empty()))
    }

    fn backend_uri(&self, original: &Uri) -> Result<Uri, ForwardError> {
        let path_and_query = original.path_and_query().map_or("/", |pq| pq.as_str());
        Ok(format!("http://{}{}", self.backend, path_and_query).parse()?)
    }

    fn fail(&self, error: ForwardError) -> ForwardError {
        self.hooks.on_error(&self.route, &error);
        error
    }
}

impl std::fmt::Debug for ForwardingProxy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ForwardingProxy")
            .field("route", &self.route)
            .field("backend", &self.backend)
            .finish()
    }
}

/// HTTP/2 clients carry the authority in the URI; HTTP/1.1 backends need `Host`.
fn ensure_host(headers: &mut axum::http::HeaderMap, authority: Option<&Authority>) {
    if headers.contains_key(HOST) {
        return;
    }
    if let Some(value) = authority.and_then(|a| HeaderValue::from_str(a.as_str()).ok()) {
        headers.insert(HOST, value);
    }
}
