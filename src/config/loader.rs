//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use crate::config::schema::ShadowConfig;
use crate::config::validation::{validate_config, ValidatedConfig, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load configuration from a TOML file without validating it.
pub fn load_config(path: &Path) -> Result<ShadowConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config: ShadowConfig = toml::from_str(&content)?;
    Ok(config)
}

impl ShadowConfig {
    /// Validate and normalize this configuration.
    pub fn validate(&self) -> Result<ValidatedConfig, ConfigError> {
        validate_config(self).map_err(ConfigError::Validation)
    }
}
