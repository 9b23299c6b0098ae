//! Page contexts per tab.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::controller::WidgetController;

/// Live page contexts, keyed by tab id.
#[derive(Default)]
pub struct PageRegistry {
    pages: RwLock<HashMap<String, Arc<WidgetController>>>,
}

impl PageRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces whatever page the tab had before.
    pub fn insert(&self, controller: Arc<WidgetController>) {
        self.pages
            .write()
            .insert(controller.tab_id().to_string(), controller);
    }

    pub fn get(&self, tab_id: &str) -> Option<Arc<WidgetController>> {
        self.pages.read().get(tab_id).cloned()
    }

    pub fn remove(&self, tab_id: &str) -> Option<Arc<WidgetController>> {
        self.pages.write().remove(tab_id)
    }

    pub fn len(&self) -> usize {
        self.pages.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.read().is_empty()
    }
}
