//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Resolve optional fields into concrete values (source port, route shape)
//! - Check route rules: aliases, fallback uniqueness, ports
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Every error names the proxy and the offending field
//! - Runs before any listener is bound

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use thiserror::Error;

use crate::config::schema::{FileConfig, ProxyInstanceConfig, RouteSpec};

/// Offset applied to a single target port when `source` is omitted.
pub const DEFAULT_SOURCE_OFFSET: u16 = 1000;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("proxy `{proxy}`: `{field}` {message}")]
pub struct ValidationError {
    pub proxy: String,
    pub field: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(proxy: &str, field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            proxy: proxy.to_string(),
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Validate every proxy in the file.
pub fn validate_config(config: &FileConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.proxies.is_empty() {
        errors.push(ValidationError::new(
            "<config>",
            "proxies",
            "must define at least one proxy",
        ));
    }

    for (name, proxy) in &config.proxies {
        errors.extend(validate_instance(name, proxy));
    }

    if let Some(address) = &config.metrics.address {
        if address.parse::<SocketAddr>().is_err() {
            errors.push(ValidationError::new(
                "<config>",
                "metrics.address",
                format!("`{address}` is not a socket address"),
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Validate one proxy instance, returning every problem found.
pub fn validate_instance(name: &str, config: &ProxyInstanceConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if config.hostname.trim().is_empty() {
        errors.push(ValidationError::new(name, "hostname", "must not be empty"));
    }
    if let Err(e) = resolve_listen_addr(name, config) {
        errors.push(e);
    }
    if let Err(e) = required_path(name, "cert", config.cert.as_ref()) {
        errors.push(e);
    }
    if let Err(e) = required_path(name, "key", config.key.as_ref()) {
        errors.push(e);
    }
    if config.retry_interval_ms == 0 {
        errors.push(ValidationError::new(name, "retry_interval_ms", "must be greater than 0"));
    }

    match resolve_route_spec(name, config) {
        Ok(spec) => errors.extend(validate_routes(name, &spec)),
        Err(e) => errors.push(e),
    }

    errors
}

/// Pick the route shape. Exactly one of `target` / `targets` must be set.
pub fn resolve_route_spec(
    name: &str,
    config: &ProxyInstanceConfig,
) -> Result<RouteSpec, ValidationError> {
    match (config.target, &config.targets) {
        (Some(port), None) => Ok(RouteSpec::Single(port)),
        (None, Some(targets)) if targets.is_empty() => {
            Err(ValidationError::new(name, "targets", "must not be empty"))
        }
        (None, Some(targets)) => Ok(RouteSpec::Named(targets.clone())),
        (Some(_), Some(_)) => Err(ValidationError::new(
            name,
            "target",
            "cannot be combined with `targets`",
        )),
        (None, None) => Err(ValidationError::new(
            name,
            "target",
            "is required (or `targets`)",
        )),
    }
}

/// Resolve the HTTPS port, defaulting single-target proxies to `target + 1000`.
pub fn resolve_source(name: &str, config: &ProxyInstanceConfig) -> Result<u16, ValidationError> {
    match (config.source, config.target) {
        (Some(0), _) => Err(ValidationError::new(name, "source", "must be a non-zero port")),
        (Some(port), _) => Ok(port),
        (None, Some(target)) => target.checked_add(DEFAULT_SOURCE_OFFSET).ok_or_else(|| {
            ValidationError::new(
                name,
                "source",
                format!("is required because target {target} + {DEFAULT_SOURCE_OFFSET} overflows"),
            )
        }),
        (None, None) => Err(ValidationError::new(
            name,
            "source",
            "is required when `targets` is used",
        )),
    }
}

/// Resolve the listener socket address from `bind` and the source port.
pub fn resolve_listen_addr(
    name: &str,
    config: &ProxyInstanceConfig,
) -> Result<SocketAddr, ValidationError> {
    let ip: IpAddr = config.bind.parse().map_err(|_| {
        ValidationError::new(name, "bind", format!("`{}` is not an IP address", config.bind))
    })?;
    let port = resolve_source(name, config)?;
    Ok(SocketAddr::new(ip, port))
}

/// Require an optional path field.
pub fn required_path(
    name: &str,
    field: &str,
    value: Option<&PathBuf>,
) -> Result<PathBuf, ValidationError> {
    match value {
        Some(path) if !path.as_os_str().is_empty() => Ok(path.clone()),
        _ => Err(ValidationError::new(name, field, "is required")),
    }
}

/// Check route-level rules.
pub fn validate_routes(name: &str, spec: &RouteSpec) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    let targets = match spec {
        RouteSpec::Single(0) => {
            errors.push(ValidationError::new(name, "target", "must be a non-zero port"));
            return errors;
        }
        RouteSpec::Single(_) => return errors,
        RouteSpec::Named(targets) => targets,
    };

    let mut fallback: Option<&str> = None;
    let mut seen_aliases: HashMap<&str, &str> = HashMap::new();

    for (target, config) in targets {
        let field = |suffix: &str| format!("targets.{target}.{suffix}");

        if config.port == 0 {
            errors.push(ValidationError::new(name, field("port"), "must be a non-zero port"));
        }

        if config.path.is_empty() {
            errors.push(ValidationError::new(name, field("path"), "must not be empty"));
        } else if !config.path.starts_with('/') {
            tracing::warn!(proxy = %name, target = %target, path = %config.path, "Route path does not start with `/`");
        }

        if config.path == "/" {
            if let Some(previous) = fallback {
                errors.push(ValidationError::new(
                    name,
                    field("path"),
                    format!("duplicates the `/` fallback already defined by `{previous}`"),
                ));
            } else {
                fallback = Some(target.as_str());
            }
        }

        for alias in &config.aliases {
            if alias.is_empty() {
                errors.push(ValidationError::new(name, field("aliases"), "must not contain an empty alias"));
                continue;
            }
            if alias != "/" && alias.ends_with('/') {
                errors.push(ValidationError::new(
                    name,
                    field("aliases"),
                    format!("alias `{alias}` must not end with `/`"),
                ));
            }
            if let Some(owner) = seen_aliases.insert(alias.as_str(), target.as_str()) {
                errors.push(ValidationError::new(
                    name,
                    field("aliases"),
                    format!("alias `{alias}` is already used by `{owner}`"),
                ));
            }
        }
    }

    for (target, config) in targets {
        if let Some(owner) = seen_aliases.get(config.path.as_str()) {
            errors.push(ValidationError::new(
                name,
                format!("targets.{owner}.aliases"),
                format!("alias `{}` shadows the path of `{target}`", config.path),
            ));
        }
    }

    errors
}
