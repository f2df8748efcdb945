//! Upstream response classification and synthesized JSON envelopes.
//!
//! The multipart upload path promises JSON to its callers, but backends have
//! been observed answering with plain text (for example a bare success
//! message, or an HTML error page). Rather than relay a mismatched
//! content type, the upstream body is classified into one of three outcomes
//! and non-JSON bodies are wrapped in a synthesized envelope. Success or
//! failure is inferred solely from the upstream HTTP status.

use axum::{
    body::Body,
    http::{header::CONTENT_TYPE, StatusCode},
    response::{IntoResponse, Response},
};
use serde_json::json;

/// Error message for an upstream that could not be reached at all.
pub const CONNECT_ERROR: &str = "Failed to connect to knowledge base service";

/// Message for a non-JSON body on a 2xx upload response.
pub const NON_JSON_SUCCESS_MESSAGE: &str =
    "File upload processed, backend returned non-JSON success.";

/// Error message for a non-JSON body on a failed upload response.
pub const UPLOAD_FAILED_ERROR: &str = "Upload failed on backend";

/// Upstream text embedded in an envelope is capped at this many characters.
pub const DETAIL_LIMIT: usize = 200;

/// What the upstream actually sent back, as far as relaying is concerned.
#[derive(Debug)]
pub enum UpstreamOutcome {
    /// Body parses as JSON (or is empty); relay it verbatim.
    Json(StatusCode, String),
    /// Non-JSON body on a 2xx status; wrap in a success envelope.
    NonJsonSuccess(String),
    /// Non-JSON body on a non-2xx status; wrap in an error envelope,
    /// preserving the upstream status.
    NonJsonFailure(StatusCode, String),
}

/// Classify an upstream response body.
///
/// An empty or whitespace-only body counts as JSON and is relayed verbatim.
pub fn classify(status: StatusCode, body: String) -> UpstreamOutcome {
    let trimmed = body.trim();
    if trimmed.is_empty() || serde_json::from_str::<serde_json::Value>(trimmed).is_ok() {
        UpstreamOutcome::Json(status, body)
    } else if status.is_success() {
        UpstreamOutcome::NonJsonSuccess(body)
    } else {
        UpstreamOutcome::NonJsonFailure(status, body)
    }
}

impl IntoResponse for UpstreamOutcome {
    fn into_response(self) -> Response {
        match self {
            UpstreamOutcome::Json(status, body) => {
                (status, [(CONTENT_TYPE, "application/json")], body).into_response()
            }
            UpstreamOutcome::NonJsonSuccess(body) => synthesized(
                StatusCode::OK,
                json!({
                    "success": true,
                    "message": NON_JSON_SUCCESS_MESSAGE,
                    "details": truncate_details(&body),
                }),
            ),
            UpstreamOutcome::NonJsonFailure(status, body) => synthesized(
                status,
                json!({
                    "error": UPLOAD_FAILED_ERROR,
                    "details": truncate_details(&body),
                }),
            ),
        }
    }
}

/// Build a locally synthesized JSON response.
pub fn synthesized(status: StatusCode, value: serde_json::Value) -> Response {
    (
        status,
        [(CONTENT_TYPE, "application/json")],
        Body::from(value.to_string()),
    )
        .into_response()
}

/// First [`DETAIL_LIMIT`] characters of `text`, never split mid-codepoint.
pub fn truncate_details(text: &str) -> &str {
    match text.char_indices().nth(DETAIL_LIMIT) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
