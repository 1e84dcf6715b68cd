//! Proxy instance: one HTTPS listener in front of a set of routes.
//!
//! # Responsibilities
//! - Build the axum router and middleware stack for an instance
//! - Drive each request through redirect, route, health and forward stages
//! - Bind the TLS listener and stop it on shutdown
//!
//! # Data Flow
//! ```text
//! TLS connection (axum-server)
//!     → request id, trace span, panic guard (tower-http)
//!     → Router::resolve ── alias ──→ 301
//!                      └─ none ───→ 404
//!     → HealthGate::check_available ── unreachable ──→ 502
//!     → ForwardingProxy (plain relay or WebSocket tunnel)
//! ```

use axum::{
    body::Body,
    extract::State,
    http::{header::LOCATION, HeaderValue, Request, StatusCode},
    response::Response,
    Router,
};
use axum_server::tls_rustls::RustlsConfig;
use axum_server::Handle;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::broadcast;
use tower_http::{
    catch_panic::CatchPanicLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::config::InstanceSettings;
use crate::error::Error;
use crate::health::{HealthGate, ProbeTarget};
use crate::http::{request, response};
use crate::observability::metrics::{self, Outcome};
use crate::proxy::{http_client, ForwardingProxy, LoggingHooks, ProxyHooks};
use crate::routing::{Resolution, Router as RouteResolver};

/// Health gate and forwarder for one route, indexed like the route table.
struct RouteHandle {
    gate: HealthGate,
    forwarder: ForwardingProxy,
}

/// Shared, read-only state for one instance's handlers.
struct InstanceState {
    name: String,
    resolver: RouteResolver,
    routes: Vec<RouteHandle>,
}

/// One HTTPS listener serving a route table.
pub struct ProxyInstance {
    name: String,
    listen: SocketAddr,
    state: Arc<InstanceState>,
    handle: Handle,
}

impl ProxyInstance {
    /// Create an instance whose relays are observed by [`LoggingHooks`].
    pub fn new(settings: InstanceSettings) -> Self {
        Self::with_hooks(settings, Arc::new(LoggingHooks))
    }

    pub fn with_hooks(settings: InstanceSettings, hooks: Arc<dyn ProxyHooks>) -> Self {
        let client = http_client();

        let routes = settings
            .routes
            .iter()
            .map(|route| {
                let backend = ProbeTarget::new(settings.hostname.clone(), route.port());
                tracing::info!(
                    proxy = %settings.name,
                    route = %route.name(),
                    path = %route.path(),
                    backend = %backend,
                    aliases = ?route.aliases().collect::<Vec<_>>(),
                    "Route registered"
                );
                RouteHandle {
                    gate: HealthGate::new(route.name(), backend.clone(), settings.retry),
                    forwarder: ForwardingProxy::new(
                        route.name(),
                        backend,
                        client.clone(),
                        hooks.clone(),
                    ),
                }
            })
            .collect();

        let state = InstanceState {
            name: settings.name.clone(),
            resolver: RouteResolver::new(settings.routes),
            routes,
        };

        Self {
            name: settings.name,
            listen: settings.listen,
            state: Arc::new(state),
            handle: Handle::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Handle controlling the listener; `listening()` yields the bound address.
    pub fn handle(&self) -> Handle {
        self.handle.clone()
    }

    /// The axum application, without a listener.
    pub fn router(&self) -> Router {
        Router::new()
            .fallback(proxy_handler)
            .with_state(self.state.clone())
            .layer(CatchPanicLayer::custom(response::panic_response))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    /// Bind the configured address and serve until `shutdown` fires.
    pub async fn serve(
        self,
        tls: RustlsConfig,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), Error> {
        let listener = std::net::TcpListener::bind(self.listen).map_err(|source| Error::Bind {
            proxy: self.name.clone(),
            addr: self.listen,
            source,
        })?;
        self.serve_on(listener, tls, shutdown).await
    }

    /// Serve on an already bound listener until `shutdown` fires.
    pub async fn serve_on(
        self,
        listener: std::net::TcpListener,
        tls: RustlsConfig,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), Error> {
        let bind_error = |source| Error::Bind {
            proxy: self.name.clone(),
            addr: self.listen,
            source,
        };
        listener.set_nonblocking(true).map_err(bind_error)?;
        let addr = listener.local_addr().map_err(bind_error)?;

        let handle = self.handle.clone();
        tokio::spawn(async move {
            let _ = shutdown.recv().await;
            handle.shutdown();
        });

        let app = self.router();
        tracing::info!(proxy = %self.name, address = %addr, "Proxy instance listening");
        metrics::instance_started(&self.name);

        let result = axum_server::from_tcp_rustls(listener, tls)
            .handle(self.handle.clone())
            .serve(app.into_make_service())
            .await;

        metrics::instance_stopped(&self.name);
        match result {
            Ok(()) => {
                tracing::info!(proxy = %self.name, "Proxy instance closed");
                Ok(())
            }
            Err(source) => Err(Error::Serve {
                proxy: self.name.clone(),
                source,
            }),
        }
    }
}

impl std::fmt::Debug for ProxyInstance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProxyInstance")
            .field("name", &self.name)
            .field("listen", &self.listen)
            .field("routes", &self.state.routes.len())
            .finish()
    }
}

/// Request lifecycle for every method and path.
async fn proxy_handler(
    State(state): State<Arc<InstanceState>>,
    req: Request<Body>,
) -> Response {
    let request_id = request::request_id(&req);
    let upgrade = request::is_websocket_upgrade(&req);
    let target = request::request_target(&req).to_string();

    let index = match state.resolver.resolve(&target) {
        Resolution::Redirect { route, location } => {
            tracing::info!(
                request_id = %request_id,
                proxy = %state.name,
                route = state.resolver.route(route).map_or("", |r| r.name()),
                from = %target,
                to = %location,
                "Alias redirect"
            );
            metrics::record_request(&state.name, Outcome::Redirected);
            return if upgrade {
                upgrade_redirect(&location)
            } else {
                response::redirect(&location)
            };
        }
        Resolution::NotFound => {
            tracing::debug!(request_id = %request_id, proxy = %state.name, target = %target, "No route matched");
            metrics::record_request(&state.name, Outcome::NotFound);
            return early_exit(upgrade, StatusCode::NOT_FOUND);
        }
        Resolution::Forward { route } => route,
    };

    let Some(route) = state.routes.get(index) else {
        tracing::error!(request_id = %request_id, proxy = %state.name, index, "Resolved route has no handle");
        metrics::record_request(&state.name, Outcome::Failed);
        return early_exit(upgrade, StatusCode::INTERNAL_SERVER_ERROR);
    };

    if !route.gate.check_available().await {
        tracing::warn!(
            request_id = %request_id,
            proxy = %state.name,
            route = %route.gate.route(),
            backend = %route.gate.target(),
            "Backend unavailable"
        );
        metrics::record_request(&state.name, Outcome::Unavailable);
        return early_exit(upgrade, StatusCode::BAD_GATEWAY);
    }

    tracing::debug!(
        request_id = %request_id,
        proxy = %state.name,
        route = %route.gate.route(),
        upgrade,
        "Forwarding"
    );
    let result = if upgrade {
        route.forwarder.forward_upgrade(req).await
    } else {
        route.forwarder.forward(req).await
    };

    match result {
        Ok(response) => {
            metrics::record_request(&state.name, Outcome::Forwarded);
            response
        }
        Err(e) => {
            let status = e.status();
            if status == StatusCode::INTERNAL_SERVER_ERROR {
                tracing::error!(request_id = %request_id, proxy = %state.name, error = %e, "Relay failed unexpectedly");
            }
            metrics::record_request(&state.name, Outcome::Failed);
            early_exit(upgrade, status)
        }
    }
}

/// Canned reply for a request that will not be relayed.
fn early_exit(upgrade: bool, status: StatusCode) -> Response {
    match (upgrade, status) {
        (true, status) => response::status_line_only(status),
        (false, StatusCode::NOT_FOUND) => response::not_found(),
        (false, StatusCode::BAD_GATEWAY) => response::bad_gateway(),
        (false, _) => response::internal_error(),
    }
}

fn upgrade_redirect(location: &str) -> Response {
    let mut reply = response::status_line_only(StatusCode::MOVED_PERMANENTLY);
    if let Ok(value) = HeaderValue::from_str(location) {
        reply.headers_mut().insert(LOCATION, value);
    }
    reply
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ProxyInstanceConfig, TargetConfig};
    use http_body_util::BodyExt;
    use std::collections::BTreeMap;
    use tower::ServiceExt;

    fn instance(routes: &[(&str, &str, u16, &[&str])]) -> ProxyInstance {
        let targets: BTreeMap<String, TargetConfig> = routes
            .iter()
            .map(|(name, path, port, aliases)| {
                (
                    name.to_string(),
                    TargetConfig {
                        path: path.to_string(),
                        port: *port,
                        aliases: aliases.iter().map(|a| a.to_string()).collect(),
                    },
                )
            })
            .collect();
        let config = ProxyInstanceConfig {
            hostname: "127.0.0.1".to_string(),
            source: Some(1),
            targets: Some(targets),
            cert: Some("cert.pem".into()),
            key: Some("key.pem".into()),
            max_retry_ms: 100,
            retry_interval_ms: 20,
            ..Default::default()
        };
        ProxyInstance::new(InstanceSettings::from_config("test", &config).unwrap())
    }

    async fn call(instance: &ProxyInstance, request: Request<Body>) -> (StatusCode, String) {
        let response = instance.router().oneshot(request).await.unwrap();
        let status = response.status();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_alias_redirect() {
        let proxy = instance(&[("admin", "/admin", 1, &["/adm"])]);
        let response = proxy.router().oneshot(get("/adm/users?x=1")).await.unwrap();

        assert_eq!(response.status(), StatusCode::MOVED_PERMANENTLY);
        assert_eq!(response.headers()[LOCATION], "/admin/users?x=1");
        assert!(response.headers().contains_key("x-request-id"));
    }

    #[tokio::test]
    async fn test_unmatched_is_not_found() {
        let proxy = instance(&[("api", "/api", 1, &[])]);
        assert_eq!(
            call(&proxy, get("/other")).await,
            (StatusCode::NOT_FOUND, "Not Found".to_string())
        );
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_bad_gateway() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let proxy = instance(&[("api", "/api", port, &[])]);
        assert_eq!(
            call(&proxy, get("/api/x")).await,
            (StatusCode::BAD_GATEWAY, "Bad Gateway".to_string())
        );
    }

    #[tokio::test]
    async fn test_upgrade_early_exit_has_no_body() {
        let proxy = instance(&[("api", "/api", 1, &[])]);
        let request = Request::builder()
            .uri("/nowhere")
            .header("upgrade", "websocket")
            .header("connection", "Upgrade")
            .body(Body::empty())
            .unwrap();

        let response = proxy.router().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(response.headers()["connection"], "close");
    }
}
