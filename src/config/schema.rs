//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the forwarding gateway.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProxyConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Forwarded namespaces, one per upstream service.
    pub upstreams: Vec<UpstreamConfig>,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            listener: ListenerConfig::default(),
            upstreams: vec![UpstreamConfig::knowledge_base()],
            timeouts: TimeoutConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// A forwarded namespace: requests under `path_prefix` are relayed to
/// `base_url` with the prefix stripped.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UpstreamConfig {
    /// Upstream identifier for logging.
    pub name: String,

    /// Inbound path prefix to mount (e.g., "/api/kb"). Must start with "/"
    /// and carry no trailing slash.
    pub path_prefix: String,

    /// Upstream base URL (e.g., "http://localhost:8000"). May be empty when
    /// `base_url_env` is set and expected to be present in the environment.
    #[serde(default)]
    pub base_url: String,

    /// Environment variable that overrides `base_url` when set at load time.
    #[serde(default)]
    pub base_url_env: Option<String>,
}

impl UpstreamConfig {
    /// The default knowledge-base namespace: `/api/kb` forwarded to a local
    /// backend, overridable via the `KB_URL` environment variable.
    pub fn knowledge_base() -> Self {
        Self {
            name: "kb".to_string(),
            path_prefix: "/api/kb".to_string(),
            base_url: "http://localhost:8000".to_string(),
            base_url_env: Some("KB_URL".to_string()),
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    /// 0 disables the timeout; a proxied call then runs for as long as the
    /// underlying HTTP client allows.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 0 }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` takes
    /// precedence when set.
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}
