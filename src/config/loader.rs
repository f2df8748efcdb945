//! Configuration loading from disk and the environment.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::ProxyConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", format_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn format_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load a configuration from a TOML file, apply environment overrides, and
/// validate it.
pub fn load_config(path: &Path) -> Result<ProxyConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config: ProxyConfig = toml::from_str(&content)?;
    finish(config)
}

/// Build the default configuration (the `/api/kb` namespace), apply
/// environment overrides, and validate it. Used when no config file is given.
pub fn default_config() -> Result<ProxyConfig, ConfigError> {
    finish(ProxyConfig::default())
}

fn finish(mut config: ProxyConfig) -> Result<ProxyConfig, ConfigError> {
    apply_env_overrides(&mut config);
    normalize(&mut config);
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Resolve `base_url_env` overrides. A set, non-empty environment variable
/// wins over the file value.
fn apply_env_overrides(config: &mut ProxyConfig) {
    for upstream in &mut config.upstreams {
        if let Some(var) = &upstream.base_url_env {
            match std::env::var(var) {
                Ok(value) if !value.is_empty() => {
                    tracing::debug!(
                        upstream = %upstream.name,
                        env_var = %var,
                        "Base URL overridden from environment"
                    );
                    upstream.base_url = value;
                }
                _ => {}
            }
        }
    }
}

/// Trim trailing slashes from base URLs so path joining stays unambiguous.
fn normalize(config: &mut ProxyConfig) {
    for upstream in &mut config.upstreams {
        while upstream.base_url.ends_with('/') {
            upstream.base_url.pop();
        }
    }
}
