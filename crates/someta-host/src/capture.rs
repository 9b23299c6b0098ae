//! Visible-tab capture through the Chrome DevTools Protocol.

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use someta_core::{Error, Result};
use tokio_tungstenite::tungstenite::Message;
use tracing::debug;

/// Captures the visible area of a tab as a data URI.
#[async_trait]
pub trait TabCapturer: Send + Sync {
    async fn capture_visible(&self, tab_id: &str) -> Result<String>;
}

/// Used when no DevTools endpoint is configured.
pub struct UnavailableCapturer;

#[async_trait]
impl TabCapturer for UnavailableCapturer {
    async fn capture_visible(&self, _tab_id: &str) -> Result<String> {
        Err(Error::Capture(
            "Screen capture is unavailable: no DevTools endpoint configured".into(),
        ))
    }
}

/// Entry from `GET /json/list`.
#[derive(Debug, Deserialize)]
struct TargetInfo {
    id: String,
    #[serde(rename = "type")]
    target_type: String,
    #[serde(rename = "webSocketDebuggerUrl")]
    ws_url: Option<String>,
}

const CAPTURE_REQUEST_ID: u64 = 1;

/// Tab ids are DevTools target ids.
pub struct CdpCapturer {
    client: Client,
    endpoint: String,
}

impl CdpCapturer {
    /// `endpoint` is the DevTools HTTP address, e.g. `http://127.0.0.1:9222`.
    pub fn new(endpoint: &str) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.trim_end_matches('/').to_string(),
        }
    }

    async fn debugger_url(&self, tab_id: &str) -> Result<String> {
        let url = format!("{}/json/list", self.endpoint);
        let targets: Vec<TargetInfo> = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::Capture(format!("DevTools unreachable at {}: {}", url, e)))?
            .json()
            .await
            .map_err(|e| Error::Capture(format!("Bad target list: {}", e)))?;

        let target = targets
            .into_iter()
            .find(|t| t.id == tab_id && t.target_type == "page")
            .ok_or_else(|| Error::Capture(format!("No page target for tab {}", tab_id)))?;

        target
            .ws_url
            .ok_or_else(|| Error::Capture(format!("Tab {} is attached to another debugger", tab_id)))
    }
}

#[async_trait]
impl TabCapturer for CdpCapturer {
    async fn capture_visible(&self, tab_id: &str) -> Result<String> {
        let ws_url = self.debugger_url(tab_id).await?;
        debug!("Capturing tab {} via {}", tab_id, ws_url);

        let (mut ws, _) = tokio_tungstenite::connect_async(&ws_url)
            .await
            .map_err(|e| Error::Capture(format!("WebSocket: {}", e)))?;

        let command = json!({
            "id": CAPTURE_REQUEST_ID,
            "method": "Page.captureScreenshot",
            "params": { "format": "png" },
        });
        ws.send(Message::Text(command.to_string().into()))
            .await
            .map_err(|e| Error::Capture(format!("WebSocket send: {}", e)))?;

        while let Some(msg) = ws.next().await {
            match msg {
                Ok(Message::Text(text)) => {
                    let Ok(reply) = serde_json::from_str::<Value>(&text) else {
                        debug!("Skipping non-JSON DevTools frame");
                        continue;
                    };
                    // events share the socket; only our reply carries the id
                    if reply["id"].as_u64() != Some(CAPTURE_REQUEST_ID) {
                        continue;
                    }
                    let _ = ws.close(None).await;
                    return screenshot_data_url(&reply);
                }
                Ok(Message::Close(_)) => break,
                Err(e) => return Err(Error::Capture(format!("WebSocket: {}", e))),
                _ => {}
            }
        }

        Err(Error::Capture(
            "DevTools closed the connection before replying".into(),
        ))
    }
}

/// Turn a `Page.captureScreenshot` reply into a PNG data URI.
fn screenshot_data_url(reply: &Value) -> Result<String> {
    if let Some(error) = reply.get("error") {
        let msg = error["message"].as_str().unwrap_or("Unknown DevTools error");
        return Err(Error::Capture(msg.to_string()));
    }
    match reply["result"]["data"].as_str() {
        Some(data) if !data.trim().is_empty() => Ok(format!("data:image/png;base64,{}", data)),
        _ => Err(Error::Capture("Screenshot payload is empty".into())),
    }
}
