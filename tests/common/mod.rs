//! Shared utilities for integration testing.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::broadcast;

use kb_gateway::config::ProxyConfig;
use kb_gateway::http::HttpServer;

/// One inbound request as seen by a mock upstream.
#[derive(Debug, Clone)]
pub struct ReceivedRequest {
    /// Raw head: request line plus header lines.
    pub head: String,
    /// Raw body bytes (chunked framing included, for streamed uploads).
    pub body: Vec<u8>,
}

impl ReceivedRequest {
    /// The request line, e.g. `GET /knowledgebase?limit=5 HTTP/1.1`.
    pub fn request_line(&self) -> &str {
        self.head.lines().next().unwrap_or("")
    }

    /// True when a header line for `name` is present (case-insensitive).
    pub fn has_header(&self, name: &str) -> bool {
        self.header_value(name).is_some()
    }

    /// Value of the first header line for `name` (case-insensitive).
    pub fn header_value(&self, name: &str) -> Option<String> {
        let prefix = format!("{}:", name.to_lowercase());
        self.head
            .lines()
            .skip(1)
            .find(|line| line.to_lowercase().starts_with(&prefix))
            .map(|line| line[prefix.len()..].trim().to_string())
    }
}

/// Fixed response a mock upstream sends back.
#[derive(Debug, Clone)]
pub struct MockResponse {
    pub status: u16,
    pub content_type: Option<&'static str>,
    pub body: String,
}

/// Start a mock upstream on an ephemeral port. The responder closure sees
/// every received request and picks the reply.
pub async fn start_mock_upstream<F>(respond: F) -> SocketAddr
where
    F: Fn(ReceivedRequest) -> MockResponse + Send + Sync + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let respond = Arc::new(respond);

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let respond = respond.clone();
                    tokio::spawn(async move {
                        if let Some(request) = read_request(&mut socket).await {
                            let response = respond(request);
                            write_response(&mut socket, &response).await;
                        }
                    });
                }
                Err(_) => break,
            }
        }
    });

    addr
}

/// Spawn a gateway on an ephemeral port. The returned sender stops it.
pub async fn spawn_gateway(config: ProxyConfig) -> (SocketAddr, broadcast::Sender<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);

    let server = HttpServer::new(config);
    tokio::spawn(async move {
        let _ = server.run(listener, shutdown_rx).await;
    });

    (addr, shutdown_tx)
}

/// An `http://...` base URL guaranteed to refuse connections: bind an
/// ephemeral port, note it, and close the listener again.
pub async fn unreachable_base() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}

/// Read one request: head, then body per Content-Length or chunked framing.
async fn read_request(socket: &mut TcpStream) -> Option<ReceivedRequest> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    let head_end = loop {
        if let Some(pos) = find_subslice(&buf, b"\r\n\r\n") {
            break pos;
        }
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
    };

    let head = String::from_utf8_lossy(&buf[..head_end]).into_owned();
    let mut body = buf[head_end + 4..].to_vec();
    let head_lower = head.to_lowercase();

    if let Some(length) = content_length(&head_lower) {
        while body.len() < length {
            let n = socket.read(&mut chunk).await.ok()?;
            if n == 0 {
                break;
            }
            body.extend_from_slice(&chunk[..n]);
        }
    } else if head_lower.contains("transfer-encoding: chunked") {
        // Read until the zero-length terminal chunk.
        while find_subslice(&body, b"0\r\n\r\n").is_none() {
            let n = socket.read(&mut chunk).await.ok()?;
            if n == 0 {
                break;
            }
            body.extend_from_slice(&chunk[..n]);
        }
    }

    Some(ReceivedRequest { head, body })
}

async fn write_response(socket: &mut TcpStream, response: &MockResponse) {
    let status_text = match response.status {
        200 => "OK",
        201 => "Created",
        400 => "Bad Request",
        404 => "Not Found",
        500 => "Internal Server Error",
        502 => "Bad Gateway",
        503 => "Service Unavailable",
        _ => "OK",
    };

    let mut head = format!(
        "HTTP/1.1 {} {}\r\nContent-Length: {}\r\nConnection: close\r\n",
        response.status,
        status_text,
        response.body.len()
    );
    if let Some(content_type) = response.content_type {
        head.push_str(&format!("Content-Type: {}\r\n", content_type));
    }
    head.push_str("\r\n");

    let _ = socket.write_all(head.as_bytes()).await;
    let _ = socket.write_all(response.body.as_bytes()).await;
    let _ = socket.shutdown().await;
}

fn content_length(head_lower: &str) -> Option<usize> {
    head_lower
        .lines()
        .find_map(|line| line.strip_prefix("content-length:"))
        .and_then(|value| value.trim().parse().ok())
}

fn find_subslice(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}
