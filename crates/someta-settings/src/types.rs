//! Settings types: keys match the persisted storage layout.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Where the widget was last dropped, in page pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WidgetPosition {
    pub x: f64,
    pub y: f64,
}

/// Persisted widget settings.
///
/// Missing keys fall back to their defaults, so a partial or older file
/// still loads.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default, rename = "apiKey")]
    pub api_key: String,
    #[serde(default, rename = "startMinimized")]
    pub start_minimized: bool,
    #[serde(default, rename = "darkMode")]
    pub dark_mode: bool,
    #[serde(default, rename = "autoActivate")]
    pub auto_activate: bool,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        rename = "widgetPosition"
    )]
    pub widget_position: Option<WidgetPosition>,
}

impl Settings {
    /// `Bearer <apiKey>`, or `None` when no key is stored.
    pub fn authorization(&self) -> Option<String> {
        let key = self.api_key.trim();
        if key.is_empty() {
            None
        } else {
            Some(format!("Bearer {}", key))
        }
    }

    /// Header set sent with every backend request.
    pub fn request_headers(&self) -> BTreeMap<String, String> {
        let mut headers = BTreeMap::new();
        headers.insert("Content-Type".to_string(), "application/json".to_string());
        if let Some(auth) = self.authorization() {
            headers.insert("Authorization".to_string(), auth);
        }
        headers
    }

    /// Apply an update, merging with the existing values.
    pub fn apply_update(&mut self, update: &SettingsUpdate) {
        if let Some(k) = &update.api_key {
            self.api_key = k.trim().to_string();
        }
        if let Some(v) = update.start_minimized {
            self.start_minimized = v;
        }
        if let Some(v) = update.dark_mode {
            self.dark_mode = v;
        }
        if let Some(v) = update.auto_activate {
            self.auto_activate = v;
        }
    }

    /// Public view for the settings editor (key masked).
    pub fn to_response(&self) -> SettingsResponse {
        SettingsResponse {
            api_key_configured: self.authorization().is_some(),
            start_minimized: self.start_minimized,
            dark_mode: self.dark_mode,
            auto_activate: self.auto_activate,
            widget_position: self.widget_position,
        }
    }
}

/// Partial update from the settings editor.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SettingsUpdate {
    #[serde(rename = "apiKey")]
    pub api_key: Option<String>,
    #[serde(rename = "startMinimized")]
    pub start_minimized: Option<bool>,
    #[serde(rename = "darkMode")]
    pub dark_mode: Option<bool>,
    #[serde(rename = "autoActivate")]
    pub auto_activate: Option<bool>,
}

/// Settings as returned over HTTP.
#[derive(Debug, Clone, Serialize)]
pub struct SettingsResponse {
    #[serde(rename = "apiKeyConfigured")]
    pub api_key_configured: bool,
    #[serde(rename = "startMinimized")]
    pub start_minimized: bool,
    #[serde(rename = "darkMode")]
    pub dark_mode: bool,
    #[serde(rename = "autoActivate")]
    pub auto_activate: bool,
    #[serde(skip_serializing_if = "Option::is_none", rename = "widgetPosition")]
    pub widget_position: Option<WidgetPosition>,
}
