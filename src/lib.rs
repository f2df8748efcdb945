//! kb-gateway: a stateless forwarding proxy for AI knowledge-base backends.
//!
//! Bridges same-origin API namespaces (e.g. `/api/kb/...`) to external
//! HTTP services: relays GET and POST, streams multipart upload bodies,
//! filters transport-incompatible headers, and normalizes malformed
//! upstream responses into JSON envelopes.

pub mod config;
pub mod http;
pub mod observability;

pub use config::ProxyConfig;
pub use http::HttpServer;
