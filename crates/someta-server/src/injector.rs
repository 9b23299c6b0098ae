//! Page-context injection: builds a widget controller for a tab and
//! connects its listener.

use std::sync::Arc;

use async_trait::async_trait;
use someta_core::Result;
use someta_host::{ContentInjector, TabRegistry};
use someta_relay::RelaySender;
use someta_settings::SettingsStore;
use someta_widget::{PageRegistry, WidgetController};
use tracing::info;

const PAGE_RELAY_BUFFER: usize = 16;

pub struct WidgetInjector {
    host_relay: RelaySender,
    settings: Arc<SettingsStore>,
    tabs: Arc<TabRegistry>,
    pages: Arc<PageRegistry>,
}

impl WidgetInjector {
    pub fn new(
        host_relay: RelaySender,
        settings: Arc<SettingsStore>,
        tabs: Arc<TabRegistry>,
        pages: Arc<PageRegistry>,
    ) -> Self {
        Self {
            host_relay,
            settings,
            tabs,
            pages,
        }
    }
}

#[async_trait]
impl ContentInjector for WidgetInjector {
    async fn inject(&self, tab_id: &str) -> Result<()> {
        let controller = Arc::new(WidgetController::new(
            tab_id,
            &self.host_relay,
            self.settings.clone(),
        ));
        let (page_relay, page_rx) = someta_relay::channel(PAGE_RELAY_BUFFER);
        controller.listener().spawn(page_rx);

        self.tabs.register(tab_id, page_relay);
        self.pages.insert(controller);
        info!("Injected page context into tab {}", tab_id);
        Ok(())
    }
}
