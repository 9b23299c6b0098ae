//! Settings persistence: read defaults, merge, overwrite.

use std::path::{Path, PathBuf};

use parking_lot::RwLock;
use someta_core::Result;
use tracing::{info, warn};

use crate::types::{Settings, SettingsUpdate, WidgetPosition};

/// JSON-file backed settings shared by every context.
///
/// Writes replace the whole file; concurrent writers resolve as last
/// write wins.
pub struct SettingsStore {
    path: PathBuf,
    current: RwLock<Settings>,
}

impl SettingsStore {
    /// Load settings from `path`, or start from defaults if the file is
    /// missing or unreadable.
    pub fn open(path: &Path) -> Self {
        let settings = match std::fs::read_to_string(path) {
            Ok(data) => serde_json::from_str(&data).unwrap_or_else(|e| {
                warn!("Ignoring unreadable settings at {}: {}", path.display(), e);
                Settings::default()
            }),
            Err(_) => Settings::default(),
        };

        Self {
            path: path.to_path_buf(),
            current: RwLock::new(settings),
        }
    }

    /// Snapshot of the current settings.
    pub fn get(&self) -> Settings {
        self.current.read().clone()
    }

    /// Merge an update from the settings editor and persist it.
    pub fn update(&self, update: &SettingsUpdate) -> Result<Settings> {
        let mut current = self.current.write();
        current.apply_update(update);
        self.save(&current)?;
        info!("Settings updated");
        Ok(current.clone())
    }

    /// Record where the widget was dragged to.
    pub fn set_widget_position(&self, position: WidgetPosition) -> Result<()> {
        let mut current = self.current.write();
        current.widget_position = Some(position);
        self.save(&current)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn save(&self, settings: &Settings) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(settings)?;
        std::fs::write(&self.path, json)?;
        Ok(())
    }
}
