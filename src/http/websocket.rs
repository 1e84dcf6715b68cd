//! WebSocket tunnelling.
//!
//! # Data Flow
//! ```text
//! Client ←──── upgraded TLS stream ────→ Proxy ←──── upgraded TCP stream ────→ Backend
//! ```
//!
//! # Design Decisions
//! - Bytes are spliced, frames are never parsed
//! - Either side closing ends the tunnel
//! - The tunnel outlives the handler that answered the handshake

use hyper::upgrade::{OnUpgrade, Upgraded};
use hyper_util::rt::TokioIo;

/// Spawn the byte relay once both sides have switched protocols.
pub fn spawn_tunnel(route: String, client: OnUpgrade, backend: OnUpgrade) {
    tokio::spawn(async move {
        match tokio::try_join!(client, backend) {
            Ok((client, backend)) => relay(&route, client, backend).await,
            Err(e) => tracing::warn!(route = %route, error = %e, "WebSocket upgrade failed"),
        }
    });
}

async fn relay(route: &str, client: Upgraded, backend: Upgraded) {
    let mut client = TokioIo::new(client);
    let mut backend = TokioIo::new(backend);

    tracing::debug!(route = %route, "WebSocket tunnel open");
    match tokio::io::copy_bidirectional(&mut client, &mut backend).await {
        Ok((up, down)) => {
            tracing::debug!(route = %route, bytes_up = up, bytes_down = down, "WebSocket tunnel closed");
        }
        Err(e) => {
            tracing::debug!(route = %route, error = %e, "WebSocket tunnel reset");
        }
    }
}
