//! Service configuration: TOML file, `PHRASEREEL_*` environment overrides,
//! validation and a secret-free view for the API.

mod loader;
mod types;
mod validate;

pub use loader::{load_config, load_config_from_str};
pub use types::*;
pub use validate::validate_config;

use thiserror::Error;

/// Errors raised while loading or checking the configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    /// Malformed TOML, wrong value types or a bad environment override.
    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    /// Parsed fine but unusable (missing credential, zero capacity, ...).
    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}
