//! Validated per-instance settings.
//!
//! Turns a raw [`ProxyInstanceConfig`] into the immutable values a proxy
//! instance runs with. Construction either succeeds completely or reports
//! every configuration problem at once.

use std::net::SocketAddr;
use std::path::PathBuf;

use crate::config::loader::ConfigError;
use crate::config::schema::{FileConfig, ProxyInstanceConfig};
use crate::config::validation::{
    required_path, resolve_listen_addr, resolve_route_spec, validate_instance,
};
use crate::resilience::RetryPolicy;
use crate::routing::RouteTable;

/// Immutable settings for one proxy instance.
#[derive(Debug)]
pub struct InstanceSettings {
    /// Proxy name from the configuration file.
    pub name: String,
    /// Backend host.
    pub hostname: String,
    /// HTTPS listener address.
    pub listen: SocketAddr,
    /// PEM certificate chain path.
    pub cert: PathBuf,
    /// PEM private key path.
    pub key: PathBuf,
    /// Health probe budget.
    pub retry: RetryPolicy,
    /// Routes sorted most-specific first.
    pub routes: RouteTable,
}

impl InstanceSettings {
    /// Validate and normalise one proxy entry.
    pub fn from_config(name: &str, config: &ProxyInstanceConfig) -> Result<Self, ConfigError> {
        let errors = validate_instance(name, config);
        if !errors.is_empty() {
            return Err(ConfigError::Validation(errors));
        }

        let single = |e| ConfigError::Validation(vec![e]);
        let spec = resolve_route_spec(name, config).map_err(single)?;

        Ok(Self {
            name: name.to_string(),
            hostname: config.hostname.clone(),
            listen: resolve_listen_addr(name, config).map_err(single)?,
            cert: required_path(name, "cert", config.cert.as_ref()).map_err(single)?,
            key: required_path(name, "key", config.key.as_ref()).map_err(single)?,
            retry: RetryPolicy::from_millis(config.max_retry_ms, config.retry_interval_ms),
            routes: RouteTable::from_spec(&spec),
        })
    }
}

/// Build settings for every proxy, collecting errors across all of them.
pub fn instances(config: &FileConfig) -> Result<Vec<InstanceSettings>, ConfigError> {
    let mut settings = Vec::with_capacity(config.proxies.len());
    let mut errors = Vec::new();

    for (name, proxy) in &config.proxies {
        match InstanceSettings::from_config(name, proxy) {
            Ok(s) => settings.push(s),
            Err(ConfigError::Validation(e)) => errors.extend(e),
            Err(other) => return Err(other),
        }
    }

    if errors.is_empty() {
        Ok(settings)
    } else {
        Err(ConfigError::Validation(errors))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_single_target_listens_on_target_plus_1000() {
        let config = ProxyInstanceConfig {
            target: Some(3000),
            cert: Some("c.pem".into()),
            key: Some("k.pem".into()),
            ..ProxyInstanceConfig::default()
        };

        let settings = InstanceSettings::from_config("app", &config).unwrap();
        assert_eq!(settings.listen.port(), 4000);
        assert_eq!(settings.routes.len(), 1);
        let route = settings.routes.iter().next().unwrap();
        assert_eq!(route.path(), "/");
        assert_eq!(route.port(), 3000);
        assert_eq!(settings.retry.max_retry, Duration::from_millis(1000));
        assert_eq!(settings.retry.interval, Duration::from_millis(50));
    }

    #[test]
    fn test_errors_collected_across_proxies() {
        let mut file = FileConfig::default();
        file.proxies.insert("a".into(), ProxyInstanceConfig::default());
        file.proxies.insert("b".into(), ProxyInstanceConfig::default());

        match instances(&file) {
            Err(ConfigError::Validation(errors)) => {
                assert!(errors.iter().any(|e| e.proxy == "a"));
                assert!(errors.iter().any(|e| e.proxy == "b"));
            }
            other => panic!("expected validation errors, got {other:?}"),
        }
    }
}
