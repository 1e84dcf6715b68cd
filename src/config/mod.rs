//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML/JSON) or CLI flags
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks, all errors at once)
//!     → settings.rs (normalise into InstanceSettings + RouteTable)
//!     → one ProxyInstance per settings entry
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; route tables are never rebuilt at runtime
//! - Optional fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod settings;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{FileConfig, LogFormat, LoggingConfig, ProxyInstanceConfig, RouteSpec, TargetConfig};
pub use settings::InstanceSettings;
pub use validation::ValidationError;
