//! Page listeners per tab.

use std::collections::HashMap;

use parking_lot::RwLock;
use someta_relay::RelaySender;
use tracing::debug;

/// Where the host finds each tab's page-context listener.
#[derive(Default)]
pub struct TabRegistry {
    listeners: RwLock<HashMap<String, RelaySender>>,
}

impl TabRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, tab_id: &str, sender: RelaySender) {
        self.listeners.write().insert(tab_id.to_string(), sender);
        debug!("Registered page listener for tab {}", tab_id);
    }

    /// The tab's listener, if it is still connected.
    pub fn get(&self, tab_id: &str) -> Option<RelaySender> {
        self.listeners
            .read()
            .get(tab_id)
            .filter(|s| s.is_connected())
            .cloned()
    }

    pub fn remove(&self, tab_id: &str) -> bool {
        self.listeners.write().remove(tab_id).is_some()
    }

    pub fn tabs(&self) -> Vec<String> {
        let mut tabs: Vec<String> = self.listeners.read().keys().cloned().collect();
        tabs.sort();
        tabs
    }
}
