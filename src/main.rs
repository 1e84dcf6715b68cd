//! local-tls-proxy
//!
//! HTTPS termination in front of local plaintext development servers.
//!
//! # Architecture Overview
//!
//! ```text
//!                    ┌──────────────────────────────────────────────────────┐
//!                    │                 PROXY INSTANCE (per [proxies.*])      │
//!                    │                                                      │
//!   HTTPS client     │  ┌──────────┐   ┌─────────┐   ┌────────────┐         │
//!   ─────────────────┼─▶│ net::tls │──▶│  http   │──▶│  routing   │── 301 ──┼──▶
//!                    │  │ (rustls) │   │ server  │   │  router    │── 404 ──┼──▶
//!                    │  └──────────┘   └─────────┘   └─────┬──────┘         │
//!                    │                                     ▼                │
//!                    │                              ┌────────────┐          │
//!                    │                              │   health   │── 502 ───┼──▶
//!                    │                              │    gate    │          │
//!                    │                              └─────┬──────┘          │
//!                    │                                    ▼                 │
//!   HTTPS response   │                              ┌────────────┐          │  plain HTTP
//!   ◀────────────────┼──────────────────────────────│   proxy    │◀─────────┼──── backend
//!                    │                              │ forwarder  │          │  localhost:port
//!                    │                              └────────────┘          │
//!                    └──────────────────────────────────────────────────────┘
//! ```

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;

use local_tls_proxy::config::{load_config, ConfigError, FileConfig, LogFormat, ProxyInstanceConfig};
use local_tls_proxy::lifecycle::startup;
use local_tls_proxy::observability::logging;

/// Name of the proxy described by command-line flags.
const CLI_PROXY_NAME: &str = "default";

#[derive(Parser, Debug)]
#[command(name = "local-tls-proxy", version)]
#[command(about = "HTTPS termination proxy for local development servers", long_about = None)]
struct Cli {
    /// Configuration file (.toml or .json). Proxy flags are ignored when set.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Backend host.
    #[arg(long, default_value = "localhost")]
    hostname: String,

    /// HTTPS listen port. Defaults to target + 1000.
    #[arg(short, long)]
    source: Option<u16>,

    /// Backend port.
    #[arg(short, long)]
    target: Option<u16>,

    /// PEM certificate chain.
    #[arg(long)]
    cert: Option<PathBuf>,

    /// PEM private key.
    #[arg(long)]
    key: Option<PathBuf>,

    /// Log filter directive, e.g. `info` or `local_tls_proxy=debug`.
    #[arg(long)]
    log_level: Option<String>,

    /// Emit JSON log lines.
    #[arg(long)]
    log_json: bool,
}

impl Cli {
    fn file_config(&self) -> Result<FileConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => load_config(path)?,
            None => FileConfig::single(
                CLI_PROXY_NAME,
                ProxyInstanceConfig {
                    hostname: self.hostname.clone(),
                    source: self.source,
                    target: self.target,
                    cert: self.cert.clone(),
                    key: self.key.clone(),
                    ..Default::default()
                },
            ),
        };

        if let Some(level) = &self.log_level {
            config.logging.level = level.clone();
        }
        if self.log_json {
            config.logging.format = LogFormat::Json;
        }
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match cli.file_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("local-tls-proxy: {e}");
            return ExitCode::FAILURE;
        }
    };

    logging::init(&config.logging);
    logging::install_panic_hook();

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        proxies = config.proxies.len(),
        "local-tls-proxy starting"
    );

    if let Err(e) = startup::install_metrics(&config.metrics) {
        tracing::error!(error = %e, "Failed to start metrics exporter");
        return ExitCode::FAILURE;
    }

    match startup::run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Fatal");
            ExitCode::FAILURE
        }
    }
}
