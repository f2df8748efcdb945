//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → loader.rs (environment overrides for base URLs)
//!     → validation.rs (semantic checks)
//!     → ProxyConfig (validated, immutable)
//!     → injected into HttpServer at construction
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded
//! - All fields have defaults to allow minimal configs
//! - Base URLs may come from the environment, but are resolved exactly once
//!   at load time; a namespace whose URL cannot be resolved fails startup
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{default_config, load_config, ConfigError};
pub use schema::ListenerConfig;
pub use schema::ProxyConfig;
pub use schema::TimeoutConfig;
pub use schema::UpstreamConfig;
