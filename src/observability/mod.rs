//! Observability subsystem.
//!
//! # Design Decisions
//! - Structured logging via tracing; request IDs flow through all events
//! - Log level configurable via config and environment
//! - Logs are the only observable surface; the gateway keeps no metrics

pub mod logging;
