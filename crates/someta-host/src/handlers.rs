//! Host-side relay handlers.

use std::sync::Arc;

use async_trait::async_trait;
use someta_relay::{ActionHandler, RelayRequest, RelayResponse};
use someta_settings::SettingsStore;
use tracing::warn;

use crate::backend::BackendClient;
use crate::capture::TabCapturer;

/// `sendToBackend` → one POST to the chat endpoint.
pub struct BackendHandler {
    pub backend: Arc<BackendClient>,
    pub settings: Arc<SettingsStore>,
}

#[async_trait]
impl ActionHandler for BackendHandler {
    async fn handle(&self, origin: Option<&str>, request: RelayRequest) -> RelayResponse {
        let payload = match request.backend_payload() {
            Ok(p) => p,
            Err(e) => return RelayResponse::failure(format!("Invalid sendToBackend payload: {}", e)),
        };
        let headers = request
            .headers()
            .unwrap_or_else(|| self.settings.get().request_headers());

        match self.backend.send(&payload, &headers).await {
            Ok(text) => RelayResponse::with_data(text),
            Err(e) => {
                warn!("Backend request from {:?} failed: {}", origin, e);
                RelayResponse::failure(e.to_string())
            }
        }
    }
}

/// `takeScreenshot` → capture the tab the request came from.
pub struct ScreenshotHandler {
    pub capturer: Arc<dyn TabCapturer>,
}

#[async_trait]
impl ActionHandler for ScreenshotHandler {
    async fn handle(&self, origin: Option<&str>, _request: RelayRequest) -> RelayResponse {
        let Some(tab_id) = origin else {
            return RelayResponse::failure("Screenshot requests must come from a tab");
        };

        match self.capturer.capture_visible(tab_id).await {
            Ok(data_url) => RelayResponse::with_data_url(data_url),
            Err(e) => {
                warn!("Capture of tab {} failed: {}", tab_id, e);
                RelayResponse::failure(e.to_string())
            }
        }
    }
}
