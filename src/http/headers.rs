//! Inbound header filtering.
//!
//! # Responsibilities
//! - Drop headers that must not be relayed upstream
//! - Preserve everything else untouched, including repeated values
//!
//! # Design Decisions
//! - Exactly three names are dropped: `host` (would misroute upstream
//!   virtual-host/TLS resolution), `content-length` (invalid once the body
//!   is re-framed, especially for streamed bodies), and `connection`
//!   (hop-by-hop)
//! - Matching is case-insensitive; the http crate normalizes header names
//!   to lowercase, so comparing against the named constants suffices

use axum::http::header::{HeaderMap, HeaderName, CONNECTION, CONTENT_LENGTH, HOST};

/// True for header names that must not be forwarded upstream.
fn is_dropped(name: &HeaderName) -> bool {
    name == &HOST || name == &CONTENT_LENGTH || name == &CONNECTION
}

/// Copy every inbound header except `host`, `content-length` and
/// `connection` into a fresh outbound header set.
pub fn filter_headers(headers: &HeaderMap) -> HeaderMap {
    let mut out = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        if !is_dropped(name) {
            out.append(name.clone(), value.clone());
        }
    }
    out
}
