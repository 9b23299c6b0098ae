//! Chat messages and the widget's message log.

use serde::{Deserialize, Serialize};

/// Shown while a backend request is outstanding.
pub const THINKING_TEXT: &str = "Thinking...";

/// Shown for any failed backend round trip.
pub const BACKEND_ERROR_TEXT: &str = "Error: Could not get a response. Please try again.";

/// Shown when the tab could not be captured.
pub const SCREENSHOT_ERROR_TEXT: &str = "Error: Could not take screenshot. Please try again.";

/// Sent to the backend together with a fresh screenshot.
pub const SCREENSHOT_PROMPT: &str = "I need help with this math problem:";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Assistant,
    System,
}

/// One entry in the chat log. Never mutated once appended.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Message {
    pub sender: Sender,
    pub text: String,
    /// Data URI of an attached image.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(rename = "createdAt")]
    pub created_at: String,
}

impl Message {
    fn new(sender: Sender, text: impl Into<String>, image: Option<String>) -> Self {
        Self {
            sender,
            text: text.into(),
            image,
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Sender::User, text, None)
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(Sender::Assistant, text, None)
    }

    pub fn system(text: impl Into<String>) -> Self {
        Self::new(Sender::System, text, None)
    }

    /// Screenshot preview, shown as a system entry.
    pub fn image(data_url: impl Into<String>) -> Self {
        Self::new(Sender::System, "Screenshot", Some(data_url.into()))
    }
}

/// Append-only log plus at most one transient "Thinking..." placeholder
/// that renders after the committed messages.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    messages: Vec<Message>,
    placeholder: Option<Message>,
}

impl Transcript {
    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub fn begin_pending(&mut self) {
        self.placeholder = Some(Message::system(THINKING_TEXT));
    }

    /// Drop the placeholder. Returns whether one was shown.
    pub fn end_pending(&mut self) -> bool {
        self.placeholder.take().is_some()
    }

    pub fn is_pending(&self) -> bool {
        self.placeholder.is_some()
    }

    /// Committed messages only.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// What the widget shows: committed messages, then the placeholder.
    pub fn visible(&self) -> Vec<Message> {
        self.messages
            .iter()
            .chain(self.placeholder.iter())
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
