//! Shared application state.

use std::sync::Arc;

use someta_core::SometaConfig;
use someta_host::{BackendClient, CdpCapturer, HostService, TabCapturer, TabRegistry, UnavailableCapturer};
use someta_relay::RelaySender;
use someta_settings::SettingsStore;
use someta_widget::PageRegistry;
use tracing::info;

use crate::injector::WidgetInjector;

const HOST_RELAY_BUFFER: usize = 64;

/// Shared application state accessible from all route handlers.
pub struct AppState {
    pub config: SometaConfig,
    pub settings: Arc<SettingsStore>,
    pub host: HostService,
    /// Page scripts reach the host through this sender.
    pub host_relay: RelaySender,
    pub pages: Arc<PageRegistry>,
}

impl AppState {
    /// Wire the host context and start its relay listener. Must run inside
    /// a tokio runtime.
    pub fn new(config: SometaConfig) -> Self {
        let settings = Arc::new(SettingsStore::open(&config.data_paths.settings_file));
        let backend = Arc::new(BackendClient::new(
            config.backend_url.clone(),
            config.max_body_bytes,
        ));
        let capturer: Arc<dyn TabCapturer> = match &config.cdp_url {
            Some(url) => {
                info!("Screen capture via DevTools at {}", url);
                Arc::new(CdpCapturer::new(url))
            }
            None => {
                info!("No DevTools endpoint set; screenshots are disabled");
                Arc::new(UnavailableCapturer)
            }
        };

        let tabs = Arc::new(TabRegistry::new());
        let pages = Arc::new(PageRegistry::new());

        let (host_relay, host_rx) = someta_relay::channel(HOST_RELAY_BUFFER);
        let host_relay = host_relay.with_timeout(config.relay_timeout);

        let injector = Arc::new(WidgetInjector::new(
            host_relay.clone(),
            settings.clone(),
            tabs.clone(),
            pages.clone(),
        ));
        let host = HostService::new(
            settings.clone(),
            backend,
            capturer,
            tabs,
            injector,
            config.inject_delay,
        );
        host.listener().spawn(host_rx);

        Self {
            config,
            settings,
            host,
            host_relay,
            pages,
        }
    }

    /// Drop everything known about a closed tab.
    pub fn forget_tab(&self, tab_id: &str) -> bool {
        let had_listener = self.host.tab_closed(tab_id);
        let had_page = self.pages.remove(tab_id).is_some();
        had_listener || had_page
    }
}
