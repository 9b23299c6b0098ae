//! Chat backend client: one JSON POST per message.

use std::collections::BTreeMap;

use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use serde_json::Value;
use someta_core::{Error, Result};
use someta_relay::BackendPayload;
use tracing::debug;

/// Posts `{message, screenshot}` to the chat endpoint and returns the
/// `response` text. Never retries.
pub struct BackendClient {
    client: Client,
    endpoint: String,
    max_body_bytes: usize,
}

impl BackendClient {
    pub fn new(endpoint: impl Into<String>, max_body_bytes: usize) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.into(),
            max_body_bytes,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub async fn send(
        &self,
        payload: &BackendPayload,
        headers: &BTreeMap<String, String>,
    ) -> Result<String> {
        // the upstream limit covers the whole body, not just the image
        let body = serde_json::to_vec(payload)?;
        if body.len() > self.max_body_bytes {
            return Err(Error::Backend(format!(
                "Request body is {} bytes, limit is {}",
                body.len(),
                self.max_body_bytes
            )));
        }

        debug!(
            "POST {} ({} bytes, screenshot: {})",
            self.endpoint,
            body.len(),
            payload.screenshot.is_some()
        );

        let mut request = self.client.post(&self.endpoint);
        if !headers
            .keys()
            .any(|name| name.eq_ignore_ascii_case("content-type"))
        {
            request = request.header(CONTENT_TYPE, "application/json");
        }
        for (name, value) in headers {
            request = request.header(name.as_str(), value.as_str());
        }

        let response = request
            .body(body)
            .send()
            .await
            .map_err(|e| Error::Http(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Backend(format!("API error {}: {}", status, body)));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| Error::Backend(format!("Invalid response body: {}", e)))?;

        body.get("response")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| Error::Backend("Response body has no `response` text".into()))
    }
}
