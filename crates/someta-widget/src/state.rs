//! Widget instance state.

use serde::Serialize;
use someta_settings::{Settings, WidgetPosition};
use uuid::Uuid;

use crate::message::{Message, Transcript};

/// Lifecycle as seen from the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WidgetPhase {
    /// Never opened on this page.
    Hidden,
    Normal,
    Minimized,
    /// Closed; the next activation starts a fresh instance.
    Closed,
}

/// One open widget. Closing drops it, log included.
#[derive(Debug, Clone)]
pub struct Widget {
    pub id: Uuid,
    pub phase: WidgetPhase,
    /// Hidden for the duration of a screen capture.
    pub capturing: bool,
    pub position: Option<WidgetPosition>,
    pub dark_mode: bool,
    pub transcript: Transcript,
}

impl Widget {
    pub fn new(settings: &Settings) -> Self {
        Self {
            id: Uuid::new_v4(),
            phase: if settings.start_minimized {
                WidgetPhase::Minimized
            } else {
                WidgetPhase::Normal
            },
            capturing: false,
            position: settings.widget_position,
            dark_mode: settings.dark_mode,
            transcript: Transcript::default(),
        }
    }

    pub fn minimize(&mut self) {
        self.phase = WidgetPhase::Minimized;
    }

    pub fn restore(&mut self) {
        self.phase = WidgetPhase::Normal;
    }

    pub fn toggle_minimized(&mut self) {
        self.phase = match self.phase {
            WidgetPhase::Minimized => WidgetPhase::Normal,
            _ => WidgetPhase::Minimized,
        };
    }

    pub fn snapshot(&self) -> WidgetSnapshot {
        WidgetSnapshot {
            id: Some(self.id),
            phase: self.phase,
            visible: !self.capturing,
            position: self.position,
            dark_mode: self.dark_mode,
            pending: self.transcript.is_pending(),
            messages: self.transcript.visible(),
        }
    }
}

/// Serializable view of a page's widget.
#[derive(Debug, Clone, Serialize)]
pub struct WidgetSnapshot {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    pub phase: WidgetPhase,
    pub visible: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<WidgetPosition>,
    #[serde(rename = "darkMode")]
    pub dark_mode: bool,
    pub pending: bool,
    pub messages: Vec<Message>,
}

impl WidgetSnapshot {
    /// Snapshot for a page without an open widget.
    pub fn absent(phase: WidgetPhase) -> Self {
        Self {
            id: None,
            phase,
            visible: false,
            position: None,
            dark_mode: false,
            pending: false,
            messages: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_widget_follows_settings() {
        let settings = Settings {
            start_minimized: true,
            dark_mode: true,
            widget_position: Some(WidgetPosition { x: 5.0, y: 6.0 }),
            ..Default::default()
        };
        let widget = Widget::new(&settings);
        assert_eq!(widget.phase, WidgetPhase::Minimized);
        assert!(widget.dark_mode);
        assert_eq!(widget.position, Some(WidgetPosition { x: 5.0, y: 6.0 }));
        assert!(widget.transcript.is_empty());
    }

    #[test]
    fn test_toggle() {
        let mut widget = Widget::new(&Settings::default());
        assert_eq!(widget.phase, WidgetPhase::Normal);
        widget.toggle_minimized();
        assert_eq!(widget.phase, WidgetPhase::Minimized);
        widget.toggle_minimized();
        assert_eq!(widget.phase, WidgetPhase::Normal);
    }

    #[test]
    fn test_snapshot_hides_while_capturing() {
        let mut widget = Widget::new(&Settings::default());
        widget.capturing = true;
        let snap = widget.snapshot();
        assert!(!snap.visible);
        assert_eq!(snap.id, Some(widget.id));
    }
}
