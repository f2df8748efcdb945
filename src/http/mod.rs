//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, namespace mounting, middleware)
//!     → headers.rs (strip host / content-length / connection)
//!     → forward.rs (rebuild upstream URL, relay method + body)
//!     → envelope.rs (classify upstream reply, synthesize JSON fallbacks)
//!     → Send to client
//! ```

pub mod envelope;
pub mod forward;
pub mod headers;
pub mod server;

pub use forward::{ForwardState, UpstreamTarget};
pub use server::HttpServer;
