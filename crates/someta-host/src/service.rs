//! Host service: relay handlers, tab activation, injection fallback.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use someta_core::{Error, Result};
use someta_relay::{RelayAction, RelayError, RelayListener, RelayRequest};
use someta_settings::SettingsStore;
use tracing::{info, warn};

use crate::backend::BackendClient;
use crate::capture::TabCapturer;
use crate::handlers::{BackendHandler, ScreenshotHandler};
use crate::tabs::TabRegistry;

/// Puts a page context into a tab so it can answer relay messages.
#[async_trait]
pub trait ContentInjector: Send + Sync {
    async fn inject(&self, tab_id: &str) -> Result<()>;
}

/// How an activation reached the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Activation {
    /// An existing page listener answered.
    Delivered,
    /// The page context had to be injected first.
    Injected,
}

/// The privileged side of the relay.
pub struct HostService {
    settings: Arc<SettingsStore>,
    backend: Arc<BackendClient>,
    capturer: Arc<dyn TabCapturer>,
    tabs: Arc<TabRegistry>,
    injector: Arc<dyn ContentInjector>,
    inject_delay: Duration,
}

impl HostService {
    pub fn new(
        settings: Arc<SettingsStore>,
        backend: Arc<BackendClient>,
        capturer: Arc<dyn TabCapturer>,
        tabs: Arc<TabRegistry>,
        injector: Arc<dyn ContentInjector>,
        inject_delay: Duration,
    ) -> Self {
        Self {
            settings,
            backend,
            capturer,
            tabs,
            injector,
            inject_delay,
        }
    }

    /// Listener answering `sendToBackend` and `takeScreenshot`.
    pub fn listener(&self) -> RelayListener {
        RelayListener::new()
            .on(
                RelayAction::SendToBackend,
                Arc::new(BackendHandler {
                    backend: self.backend.clone(),
                    settings: self.settings.clone(),
                }),
            )
            .on(
                RelayAction::TakeScreenshot,
                Arc::new(ScreenshotHandler {
                    capturer: self.capturer.clone(),
                }),
            )
    }

    pub fn tabs(&self) -> &Arc<TabRegistry> {
        &self.tabs
    }

    /// Send `activateWidget` to a tab. When nothing listens there, inject
    /// the page context, wait, and send once more.
    pub async fn activate_tab(&self, tab_id: &str) -> Result<Activation> {
        match self.send_activation(tab_id).await {
            Ok(()) => Ok(Activation::Delivered),
            Err(RelayError::NoResponder) => {
                info!("No page listener in tab {}, injecting", tab_id);
                self.tabs.remove(tab_id);
                self.injector.inject(tab_id).await?;
                tokio::time::sleep(self.inject_delay).await;

                self.send_activation(tab_id).await.map_err(|e| {
                    warn!("Activation of tab {} failed after injection: {}", tab_id, e);
                    Error::from(e)
                })?;
                Ok(Activation::Injected)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Activate on page load when the user opted in.
    pub async fn tab_loaded(&self, tab_id: &str) -> Result<Option<Activation>> {
        if !self.settings.get().auto_activate {
            return Ok(None);
        }
        self.activate_tab(tab_id).await.map(Some)
    }

    /// Forget a closed tab's listener.
    pub fn tab_closed(&self, tab_id: &str) -> bool {
        self.tabs.remove(tab_id)
    }

    async fn send_activation(&self, tab_id: &str) -> std::result::Result<(), RelayError> {
        let sender = self.tabs.get(tab_id).ok_or(RelayError::NoResponder)?;
        let response = sender.send(RelayRequest::activate_widget()).await?;
        if !response.success {
            warn!(
                "Tab {} declined activation: {}",
                tab_id,
                response.error.as_deref().unwrap_or("no reason given")
            );
        }
        Ok(())
    }
}
