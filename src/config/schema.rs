//! Configuration schema definitions.
//!
//! This module defines the on-disk configuration structure. All types derive
//! Serde traits so the same schema loads from TOML or JSON.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Root configuration: global settings plus one entry per proxy instance.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct FileConfig {
    /// Log output settings.
    pub logging: LoggingConfig,

    /// Optional Prometheus exporter.
    pub metrics: MetricsConfig,

    /// Proxy instances keyed by name.
    pub proxies: BTreeMap<String, ProxyInstanceConfig>,
}

impl FileConfig {
    /// Build a configuration holding a single named proxy.
    pub fn single(name: impl Into<String>, proxy: ProxyInstanceConfig) -> Self {
        let mut proxies = BTreeMap::new();
        proxies.insert(name.into(), proxy);
        Self {
            proxies,
            ..Self::default()
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive used when `RUST_LOG` is not set.
    pub level: String,

    /// Output format.
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "local_tls_proxy=info,tower_http=info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

/// Metrics exporter configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct MetricsConfig {
    /// Scrape endpoint bind address (e.g. "127.0.0.1:9464"). Disabled when unset.
    pub address: Option<String>,
}

/// One proxy instance: an HTTPS listener forwarding to HTTP backends.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProxyInstanceConfig {
    /// Backend host, also used when logging.
    #[serde(default = "default_hostname")]
    pub hostname: String,

    /// Listener interface.
    #[serde(default = "default_bind")]
    pub bind: String,

    /// HTTPS port. Defaults to `target + 1000` for single-target proxies.
    #[serde(default)]
    pub source: Option<u16>,

    /// Single backend port, served from `/`.
    #[serde(default)]
    pub target: Option<u16>,

    /// Path-routed backends keyed by target name.
    #[serde(default)]
    pub targets: Option<BTreeMap<String, TargetConfig>>,

    /// PEM certificate chain.
    #[serde(default)]
    pub cert: Option<PathBuf>,

    /// PEM private key.
    #[serde(default)]
    pub key: Option<PathBuf>,

    /// Total probe budget per request in milliseconds.
    #[serde(default = "default_max_retry_ms", alias = "maxRetryMs")]
    pub max_retry_ms: u64,

    /// Delay between probe attempts in milliseconds.
    #[serde(default = "default_retry_interval_ms", alias = "retryIntervalMs")]
    pub retry_interval_ms: u64,
}

impl Default for ProxyInstanceConfig {
    fn default() -> Self {
        Self {
            hostname: default_hostname(),
            bind: default_bind(),
            source: None,
            target: None,
            targets: None,
            cert: None,
            key: None,
            max_retry_ms: default_max_retry_ms(),
            retry_interval_ms: default_retry_interval_ms(),
        }
    }
}

/// A named path-routed backend.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct TargetConfig {
    /// Path prefix served by this backend.
    pub path: String,

    /// Backend port on `hostname`.
    pub port: u16,

    /// Alternate paths that redirect to `path`.
    #[serde(default)]
    pub aliases: Vec<String>,
}

/// Normalised shape of a proxy's backends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteSpec {
    /// One backend serving every path.
    Single(u16),
    /// Path-routed backends keyed by name.
    Named(BTreeMap<String, TargetConfig>),
}

fn default_hostname() -> String {
    "localhost".to_string()
}

fn default_bind() -> String {
    "0.0.0.0".to_string()
}

fn default_max_retry_ms() -> u64 {
    1000
}

fn default_retry_interval_ms() -> u64 {
    50
}
