//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check upstream base URLs are non-empty, parseable, http(s)
//! - Check path prefixes are well-formed and unique
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ProxyConfig → Result<(), Vec<ValidationError>>
//! - Runs at startup, before any request is served; a missing base URL is
//!   fatal here rather than a per-request surprise

use std::collections::HashSet;

use thiserror::Error;
use url::Url;

use crate::config::schema::ProxyConfig;

/// A single semantic problem found in the configuration.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("no upstreams configured; at least one forwarded namespace is required")]
    NoUpstreams,

    #[error("upstream has an empty name")]
    EmptyName,

    #[error("upstream '{name}': path prefix '{prefix}' must start with '/' and be more than '/'")]
    BadPathPrefix { name: String, prefix: String },

    #[error("upstream '{name}': path prefix '{prefix}' must not end with '/'")]
    TrailingSlashPrefix { name: String, prefix: String },

    #[error("duplicate path prefix '{prefix}'")]
    DuplicatePrefix { prefix: String },

    #[error("upstream '{name}': base URL is not set{hint}")]
    MissingBaseUrl { name: String, hint: String },

    #[error("upstream '{name}': base URL '{url}' is not a valid URL: {source}")]
    UnparseableBaseUrl {
        name: String,
        url: String,
        source: url::ParseError,
    },

    #[error("upstream '{name}': base URL '{url}' must use the http or https scheme")]
    BadScheme { name: String, url: String },
}

/// Validate a configuration, returning every error found.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.upstreams.is_empty() {
        errors.push(ValidationError::NoUpstreams);
    }

    let mut seen_prefixes = HashSet::new();
    for upstream in &config.upstreams {
        if upstream.name.is_empty() {
            errors.push(ValidationError::EmptyName);
        }

        if !upstream.path_prefix.starts_with('/') || upstream.path_prefix == "/" {
            errors.push(ValidationError::BadPathPrefix {
                name: upstream.name.clone(),
                prefix: upstream.path_prefix.clone(),
            });
        } else if upstream.path_prefix.ends_with('/') {
            errors.push(ValidationError::TrailingSlashPrefix {
                name: upstream.name.clone(),
                prefix: upstream.path_prefix.clone(),
            });
        }

        if !seen_prefixes.insert(upstream.path_prefix.clone()) {
            errors.push(ValidationError::DuplicatePrefix {
                prefix: upstream.path_prefix.clone(),
            });
        }

        if upstream.base_url.is_empty() {
            let hint = match &upstream.base_url_env {
                Some(var) => format!(" (set it in the config file or via ${})", var),
                None => String::new(),
            };
            errors.push(ValidationError::MissingBaseUrl {
                name: upstream.name.clone(),
                hint,
            });
            continue;
        }

        match Url::parse(&upstream.base_url) {
            Ok(url) => {
                if url.scheme() != "http" && url.scheme() != "https" {
                    errors.push(ValidationError::BadScheme {
                        name: upstream.name.clone(),
                        url: upstream.base_url.clone(),
                    });
                }
            }
            Err(source) => {
                errors.push(ValidationError::UnparseableBaseUrl {
                    name: upstream.name.clone(),
                    url: upstream.base_url.clone(),
                    source,
                });
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
