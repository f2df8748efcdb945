//! Request forwarding core.
//!
//! # Responsibilities
//! - Reconstruct the upstream URL from the inbound path and query
//! - Forward GET (no body) and POST (multipart stream or buffered JSON)
//! - Relay upstream status, body and content type back to the caller
//! - Normalize transport failures into synthesized JSON envelopes
//!
//! # Design Decisions
//! - Exactly one upstream attempt per inbound request; no retries
//! - Multipart bodies are relayed as a byte stream, never buffered in full
//! - JSON POST bodies are small and buffered before re-sending
//! - A dropped inbound connection drops this handler's future, which
//!   cancels the in-flight upstream call

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{
        header::{HeaderMap, HeaderValue, CONTENT_TYPE},
        Method, Request, StatusCode,
    },
    response::{IntoResponse, Response},
};
use http_body_util::BodyExt;
use hyper_util::client::legacy::{connect::HttpConnector, Client};
use serde_json::json;
use thiserror::Error;

use crate::http::envelope::{self, CONNECT_ERROR};
use crate::http::headers::filter_headers;

/// Shared hyper client used for all upstream calls.
pub type HttpClient = Client<HttpConnector, Body>;

/// A validated upstream namespace target.
#[derive(Debug)]
pub struct UpstreamTarget {
    /// Upstream identifier for logging.
    pub name: String,
    /// Base URL without trailing slash, validated at startup.
    pub base_url: String,
    /// Mounted namespace prefix (e.g. "/api/kb"), stripped from the inbound
    /// path before the upstream URL is rebuilt.
    pub path_prefix: String,
}

/// Per-namespace state injected into the forwarding handler.
#[derive(Clone)]
pub struct ForwardState {
    pub client: HttpClient,
    pub upstream: Arc<UpstreamTarget>,
}

/// Transport-level forwarding failure. All variants surface to the caller
/// as a 500 with a synthesized JSON envelope.
#[derive(Debug, Error)]
pub enum ForwardError {
    #[error("invalid outbound request: {0}")]
    Request(#[from] axum::http::Error),

    #[error(transparent)]
    Connect(#[from] hyper_util::client::legacy::Error),

    #[error("failed to read upstream body: {0}")]
    UpstreamBody(#[source] hyper::Error),

    #[error("failed to read inbound body: {0}")]
    InboundBody(#[source] axum::Error),
}

/// Catch-all forwarding handler for one namespace.
pub async fn handle(State(state): State<ForwardState>, request: Request<Body>) -> Response {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_string();

    tracing::debug!(
        request_id = %request_id,
        upstream = %state.upstream.name,
        method = %request.method(),
        path = %request.uri().path(),
        "Forwarding request"
    );

    if *request.method() == Method::GET {
        forward_get(&state, request, &request_id).await
    } else if *request.method() == Method::POST {
        forward_post(&state, request, &request_id).await
    } else {
        // Unreachable through the router (GET/POST only), kept total.
        StatusCode::METHOD_NOT_ALLOWED.into_response()
    }
}

async fn forward_get(state: &ForwardState, request: Request<Body>, request_id: &str) -> Response {
    let url = build_upstream_url(
        &state.upstream.base_url,
        forwarded_path(request.uri().path(), &state.upstream.path_prefix),
        request.uri().query(),
    );
    let headers = filter_headers(request.headers());

    match send_upstream(&state.client, Method::GET, &url, headers, Body::empty()).await {
        Ok(reply) => relay(reply),
        Err(err) => {
            tracing::error!(
                request_id = %request_id,
                upstream = %state.upstream.name,
                url = %url,
                error = %err,
                "GET forward failed"
            );
            envelope::synthesized(
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": CONNECT_ERROR }),
            )
        }
    }
}

async fn forward_post(state: &ForwardState, request: Request<Body>, request_id: &str) -> Response {
    // Query strings are not relayed for POST.
    let url = build_upstream_url(
        &state.upstream.base_url,
        forwarded_path(request.uri().path(), &state.upstream.path_prefix),
        None,
    );

    let is_multipart = request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("multipart/form-data"));

    let result = if is_multipart {
        forward_multipart(state, request, &url).await
    } else {
        forward_json(state, request, &url).await
    };

    match result {
        Ok(response) => response,
        Err(err) => {
            let details = transport_error_details(&err);
            tracing::error!(
                request_id = %request_id,
                upstream = %state.upstream.name,
                url = %url,
                multipart = is_multipart,
                error = %details,
                "POST forward failed"
            );
            envelope::synthesized(
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": CONNECT_ERROR, "details": details }),
            )
        }
    }
}

/// Multipart branch: relay the inbound byte stream as the outbound body so
/// large uploads never sit fully in memory here. The filtered header set is
/// forwarded as-is, which keeps the original multipart boundary header.
async fn forward_multipart(
    state: &ForwardState,
    request: Request<Body>,
    url: &str,
) -> Result<Response, ForwardError> {
    let (parts, body) = request.into_parts();
    let headers = filter_headers(&parts.headers);

    let reply = send_upstream(&state.client, Method::POST, url, headers, body).await?;
    Ok(envelope::classify(reply.status, reply.body).into_response())
}

/// JSON branch: buffer the inbound body, then re-send it with only a
/// `Content-Type: application/json` header. All other inbound headers are
/// dropped for this branch.
async fn forward_json(
    state: &ForwardState,
    request: Request<Body>,
    url: &str,
) -> Result<Response, ForwardError> {
    let bytes = axum::body::to_bytes(request.into_body(), usize::MAX)
        .await
        .map_err(ForwardError::InboundBody)?;

    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

    let reply = send_upstream(&state.client, Method::POST, url, headers, Body::from(bytes)).await?;
    Ok(relay(reply))
}

/// What came back from the upstream, fully read.
struct UpstreamReply {
    status: StatusCode,
    content_type: Option<HeaderValue>,
    body: String,
}

/// Issue one upstream request and read the response body to completion.
async fn send_upstream(
    client: &HttpClient,
    method: Method,
    url: &str,
    headers: HeaderMap,
    body: Body,
) -> Result<UpstreamReply, ForwardError> {
    let mut builder = Request::builder().method(method).uri(url);
    if let Some(outbound) = builder.headers_mut() {
        *outbound = headers;
    }
    let request = builder.body(body)?;

    let response = client.request(request).await?;
    let (parts, body) = response.into_parts();
    let bytes = body
        .collect()
        .await
        .map_err(ForwardError::UpstreamBody)?
        .to_bytes();

    Ok(UpstreamReply {
        status: parts.status,
        content_type: parts.headers.get(CONTENT_TYPE).cloned(),
        body: String::from_utf8_lossy(&bytes).into_owned(),
    })
}

/// Relay an upstream reply verbatim: its status, its body text, and its
/// content type (defaulting to `application/json` when it declared none).
fn relay(reply: UpstreamReply) -> Response {
    let content_type = reply
        .content_type
        .unwrap_or_else(|| HeaderValue::from_static("application/json"));
    (reply.status, [(CONTENT_TYPE, content_type)], reply.body).into_response()
}

/// Inbound path with the namespace prefix removed. The router mounts each
/// namespace under its prefix, so an unmatched prefix means the path was
/// already stripped upstream of here.
fn forwarded_path<'a>(uri_path: &'a str, prefix: &str) -> &'a str {
    uri_path.strip_prefix(prefix).unwrap_or(uri_path)
}

/// `base + path (+ "?" + query)`. `base` carries no trailing slash and
/// `path` keeps its leading slash, so the join is byte-exact.
fn build_upstream_url(base: &str, path: &str, query: Option<&str>) -> String {
    match query {
        Some(query) => format!("{base}{path}?{query}"),
        None => format!("{base}{path}"),
    }
}

/// Full error-chain message for the synthesized envelope. Some HTTP client
/// runtimes refuse to stream a request body unless half-duplex streaming is
/// declared; when that cause shows up in the chain, call it out directly so
/// operators do not chase a generic network error.
fn transport_error_details(err: &ForwardError) -> String {
    let mut message = err.to_string();
    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        let cause_text = cause.to_string();
        if !message.contains(&cause_text) {
            message.push_str(": ");
            message.push_str(&cause_text);
        }
        source = cause.source();
    }

    if message.contains("duplex") {
        format!(
            "{message}. This usually means the HTTP client did not declare \
             half-duplex streaming for a streamed request body."
        )
    } else {
        message
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forwarded_path_strips_the_namespace_prefix_once() {
        assert_eq!(
            forwarded_path("/api/kb/knowledgebase", "/api/kb"),
            "/knowledgebase"
        );
        // Already-stripped paths pass through unchanged.
        assert_eq!(forwarded_path("/knowledgebase", "/api/kb"), "/knowledgebase");
        assert_eq!(
            forwarded_path("/api/kb/index/docs/42", "/api/kb"),
            "/index/docs/42"
        );
    }

    #[test]
    fn upstream_url_joins_base_path_and_query() {
        assert_eq!(
            build_upstream_url("http://kb.internal:8000", "/knowledgebase", Some("limit=5")),
            "http://kb.internal:8000/knowledgebase?limit=5"
        );
    }

    #[test]
    fn upstream_url_without_query() {
        assert_eq!(
            build_upstream_url("http://kb.internal:8000", "/upload-file", None),
            "http://kb.internal:8000/upload-file"
        );
    }

    #[test]
    fn upstream_url_keeps_nested_segments() {
        assert_eq!(
            build_upstream_url("http://localhost:8000", "/index/docs/42", None),
            "http://localhost:8000/index/docs/42"
        );
    }

    #[test]
    fn duplex_failures_get_an_explicit_hint() {
        let io = std::io::Error::other("duplex option is required when sending a body");
        let err = ForwardError::InboundBody(axum::Error::new(io));

        let details = transport_error_details(&err);
        assert!(details.contains("duplex option is required"));
        assert!(details.contains("half-duplex streaming"));
    }

    #[test]
    fn ordinary_failures_have_no_duplex_hint() {
        let io = std::io::Error::other("connection refused");
        let err = ForwardError::InboundBody(axum::Error::new(io));

        let details = transport_error_details(&err);
        assert!(details.contains("connection refused"));
        assert!(!details.contains("half-duplex"));
    }
}
