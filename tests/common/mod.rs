//! Shared utilities for integration tests.
#![allow(dead_code)]

use axum::http::header::{ACCESS_CONTROL_ALLOW_ORIGIN, LOCATION};
use axum::http::{HeaderMap, Uri};
use axum::response::IntoResponse;
use futures_util::{SinkExt, StreamExt};
use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use local_tls_proxy::config::loader::{parse_config, ConfigFormat};
use local_tls_proxy::config::settings;
use local_tls_proxy::proxy::{LoggingHooks, ProxyHooks};
use local_tls_proxy::{FileConfig, InstanceSettings, ProxyInstance};

/// Start a raw TCP backend that answers every request with a fixed body.
pub async fn start_mock_backend(response: &'static str) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    serve_fixed(listener, response)
}

/// Same as [`start_mock_backend`] on a specific address.
pub async fn start_mock_backend_on(addr: SocketAddr, response: &'static str) -> SocketAddr {
    let listener = TcpListener::bind(addr).await.unwrap();
    serve_fixed(listener, response)
}

fn serve_fixed(listener: TcpListener, response: &'static str) -> SocketAddr {
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            tokio::spawn(async move {
                // Health probes connect and close without sending anything.
                let mut buf = [0u8; 4096];
                match socket.read(&mut buf).await {
                    Ok(0) | Err(_) => return,
                    Ok(_) => {}
                }
                let response_str = format!(
                    "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    response.len(),
                    response
                );
                let _ = socket.write_all(response_str.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    addr
}

/// Start a raw TCP backend that declares `Content-Length: 100` but closes
/// after sending `partial`.
pub async fn start_truncating_backend(partial: &'static str) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            tokio::spawn(async move {
                let mut buf = [0u8; 4096];
                match socket.read(&mut buf).await {
                    Ok(0) | Err(_) => return,
                    Ok(_) => {}
                }
                let head = "HTTP/1.1 200 OK\r\nContent-Length: 100\r\n\r\n";
                let _ = socket.write_all(head.as_bytes()).await;
                let _ = socket.write_all(partial.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    addr
}

/// Start an axum backend that echoes the request path and headers as JSON and
/// answers with plain-HTTP `location` and `access-control-allow-origin` values.
pub async fn start_echo_backend() -> SocketAddr {
    async fn echo(uri: Uri, headers: HeaderMap) -> impl IntoResponse {
        let headers: BTreeMap<String, String> = headers
            .iter()
            .map(|(name, value)| {
                (
                    name.to_string(),
                    value.to_str().unwrap_or_default().to_string(),
                )
            })
            .collect();
        let body = serde_json::json!({
            "path": uri.path_and_query().map(|pq| pq.as_str()).unwrap_or("/"),
            "headers": headers,
        });

        (
            [
                (LOCATION, "http://localhost:3000/x"),
                (ACCESS_CONTROL_ALLOW_ORIGIN, "http://localhost:5174"),
            ],
            body.to_string(),
        )
    }

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = axum::Router::new().fallback(echo);
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

/// Start a WebSocket backend that echoes text and binary messages.
pub async fn start_ws_echo_backend() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            tokio::spawn(async move {
                let Ok(mut ws) = tokio_tungstenite::accept_async(stream).await else {
                    return;
                };
                while let Some(Ok(msg)) = ws.next().await {
                    if (msg.is_text() || msg.is_binary()) && ws.send(msg).await.is_err() {
                        break;
                    }
                }
            });
        }
    });

    addr
}

/// A local port with nothing listening on it.
pub fn closed_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

/// Parse a TOML document and return the settings of its only proxy.
pub fn settings_from_toml(toml: &str) -> InstanceSettings {
    let config: FileConfig = parse_config(toml, ConfigFormat::Toml, Path::new("test.toml")).unwrap();
    settings::instances(&config).unwrap().remove(0)
}

/// Serve a proxy instance over plain HTTP on an ephemeral port.
pub async fn start_proxy(toml: &str) -> SocketAddr {
    start_proxy_with_hooks(toml, Arc::new(LoggingHooks)).await
}

pub async fn start_proxy_with_hooks(toml: &str, hooks: Arc<dyn ProxyHooks>) -> SocketAddr {
    let instance = ProxyInstance::with_hooks(settings_from_toml(toml), hooks);
    let app = instance.router();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

/// HTTP client that neither follows redirects nor checks certificates.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .danger_accept_invalid_certs(true)
        .no_proxy()
        .timeout(Duration::from_secs(10))
        .build()
        .unwrap()
}
