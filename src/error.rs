//! Process-level errors.

use std::net::SocketAddr;
use thiserror::Error;

use crate::config::ConfigError;
use crate::net::TlsError;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("proxy `{proxy}`: {source}")]
    Tls {
        proxy: String,
        #[source]
        source: TlsError,
    },

    #[error("proxy `{proxy}`: failed to bind {addr}: {source}")]
    Bind {
        proxy: String,
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("proxy `{proxy}`: listener failed: {source}")]
    Serve {
        proxy: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid metrics address `{address}`: {source}")]
    MetricsAddress {
        address: String,
        #[source]
        source: std::net::AddrParseError,
    },

    #[error("failed to install metrics exporter: {0}")]
    Metrics(#[from] metrics_exporter_prometheus::BuildError),

    #[error("instance task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}
