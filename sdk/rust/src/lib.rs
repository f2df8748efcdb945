//! Minimal Rust client for a kb-gateway deployment.
//!
//! Wraps the three request shapes the gateway forwards: plain GETs, JSON
//! question POSTs, and multipart file uploads.

use reqwest::{multipart, Client, Response};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct AskRequest {
    pub question: String,
}

pub struct GatewayClient {
    client: Client,
    gateway_url: String,
}

impl GatewayClient {
    pub fn new(gateway_url: &str) -> Self {
        Self {
            client: Client::new(),
            gateway_url: gateway_url.trim_end_matches('/').to_string(),
        }
    }

    /// GET a forwarded endpoint, e.g. `/api/kb/knowledgebase?limit=5`.
    pub async fn get(&self, path: &str) -> Result<Response, reqwest::Error> {
        self.client
            .get(format!("{}{}", self.gateway_url, path))
            .send()
            .await
    }

    /// Ask a question through a namespace's `/ask` endpoint (JSON POST).
    pub async fn ask(&self, prefix: &str, question: &str) -> Result<Response, reqwest::Error> {
        self.client
            .post(format!("{}{}/ask", self.gateway_url, prefix))
            .json(&AskRequest {
                question: question.to_string(),
            })
            .send()
            .await
    }

    /// Upload a file through a namespace's `/upload-file` endpoint
    /// (multipart POST).
    pub async fn upload_file(
        &self,
        prefix: &str,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<Response, reqwest::Error> {
        let part = multipart::Part::bytes(bytes).file_name(file_name.to_string());
        let form = multipart::Form::new().part("file", part);
        self.client
            .post(format!("{}{}/upload-file", self.gateway_url, prefix))
            .multipart(form)
            .send()
            .await
    }
}
