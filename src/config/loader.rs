//! Configuration loading from disk.

use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::config::schema::FileConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {source}", path.display())]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("failed to parse {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("unsupported config format for {} (expected .toml or .json)", .0.display())]
    UnsupportedFormat(PathBuf),

    #[error("invalid configuration: {}", format_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn format_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Supported configuration file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Toml,
    Json,
}

impl ConfigFormat {
    /// Pick the format from a file extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => Some(Self::Toml),
            Some("json") => Some(Self::Json),
            _ => None,
        }
    }
}

/// Load and validate configuration from a TOML or JSON file.
pub fn load_config(path: &Path) -> Result<FileConfig, ConfigError> {
    let format = ConfigFormat::from_path(path)
        .ok_or_else(|| ConfigError::UnsupportedFormat(path.to_path_buf()))?;
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_config(&content, format, path)
}

/// Parse and validate configuration text. `origin` is only used in error messages.
pub fn parse_config(
    content: &str,
    format: ConfigFormat,
    origin: &Path,
) -> Result<FileConfig, ConfigError> {
    let config: FileConfig = match format {
        ConfigFormat::Toml => toml::from_str(content).map_err(|source| ConfigError::Toml {
            path: origin.to_path_buf(),
            source,
        })?,
        ConfigFormat::Json => serde_json::from_str(content).map_err(|source| ConfigError::Json {
            path: origin.to_path_buf(),
            source,
        })?,
    };

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::LogFormat;

    #[test]
    fn test_parse_toml_multi_target() {
        let toml = r#"
            [logging]
            format = "json"

            [proxies.web]
            source = 4443
            cert = "localhost.pem"
            key = "localhost-key.pem"
            max_retry_ms = 2000

            [proxies.web.targets.api]
            path = "/api"
            port = 3001
            aliases = ["/v1"]

            [proxies.web.targets.app]
            path = "/"
            port = 3000
        "#;

        let config = parse_config(toml, ConfigFormat::Toml, Path::new("test.toml")).unwrap();
        assert_eq!(config.logging.format, LogFormat::Json);

        let web = &config.proxies["web"];
        assert_eq!(web.hostname, "localhost");
        assert_eq!(web.max_retry_ms, 2000);
        assert_eq!(web.retry_interval_ms, 50);
        let targets = web.targets.as_ref().unwrap();
        assert_eq!(targets["api"].aliases, vec!["/v1".to_string()]);
    }

    #[test]
    fn test_parse_json_camel_case_aliases() {
        let json = r#"{
            "proxies": {
                "app": {
                    "target": 3000,
                    "cert": "c.pem",
                    "key": "k.pem",
                    "maxRetryMs": 500,
                    "retryIntervalMs": 25
                }
            }
        }"#;

        let config = parse_config(json, ConfigFormat::Json, Path::new("test.json")).unwrap();
        let app = &config.proxies["app"];
        assert_eq!(app.max_retry_ms, 500);
        assert_eq!(app.retry_interval_ms, 25);
        assert_eq!(app.source, None);
    }

    #[test]
    fn test_validation_failure_names_proxy_and_field() {
        let toml = r#"
            [proxies.broken]
            target = 3000
            cert = "c.pem"
        "#;

        let err = parse_config(toml, ConfigFormat::Toml, Path::new("x.toml")).unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid configuration: proxy `broken`: `key` is required"
        );
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(ConfigFormat::from_path(Path::new("a.toml")), Some(ConfigFormat::Toml));
        assert_eq!(ConfigFormat::from_path(Path::new("a.json")), Some(ConfigFormat::Json));
        assert_eq!(ConfigFormat::from_path(Path::new("a.yaml")), None);
    }
}
