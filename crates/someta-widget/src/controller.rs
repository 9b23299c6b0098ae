//! Page-context controller: owns the widget for one tab and drives the
//! send and screenshot flows through the relay.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use someta_core::{Error, Result};
use someta_relay::{
    ActionHandler, BackendPayload, RelayAction, RelayListener, RelayRequest, RelayResponse,
    RelaySender,
};
use someta_settings::{SettingsStore, WidgetPosition};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::message::{Message, BACKEND_ERROR_TEXT, SCREENSHOT_ERROR_TEXT, SCREENSHOT_PROMPT};
use crate::state::{Widget, WidgetPhase, WidgetSnapshot};

#[derive(Default)]
struct PageState {
    widget: Option<Widget>,
    closed: bool,
}

/// Clears the in-flight flag when the request finishes, however it ends.
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

pub struct WidgetController {
    tab_id: String,
    host: RelaySender,
    settings: Arc<SettingsStore>,
    state: RwLock<PageState>,
    in_flight: AtomicBool,
}

impl WidgetController {
    /// `host` reaches the host context; requests are tagged with `tab_id`.
    pub fn new(tab_id: &str, host: &RelaySender, settings: Arc<SettingsStore>) -> Self {
        Self {
            tab_id: tab_id.to_string(),
            host: host.with_origin(tab_id),
            settings,
            state: RwLock::new(PageState::default()),
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn tab_id(&self) -> &str {
        &self.tab_id
    }

    /// Page-side listener answering `activateWidget`.
    pub fn listener(self: &Arc<Self>) -> RelayListener {
        RelayListener::new().on(RelayAction::ActivateWidget, self.clone())
    }

    // ---------------------------------------------------------------
    // Lifecycle
    // ---------------------------------------------------------------

    /// Open the widget. Returns `false` if one is already open.
    pub fn activate(&self) -> bool {
        let mut state = self.state.write();
        if state.widget.is_some() {
            return false;
        }
        let widget = Widget::new(&self.settings.get());
        info!("Widget {} opened in tab {}", widget.id, self.tab_id);
        state.widget = Some(widget);
        state.closed = false;
        true
    }

    pub fn minimize(&self) -> Result<WidgetPhase> {
        self.update_open(|w| w.minimize())
    }

    pub fn restore(&self) -> Result<WidgetPhase> {
        self.update_open(|w| w.restore())
    }

    pub fn toggle_minimized(&self) -> Result<WidgetPhase> {
        self.update_open(|w| w.toggle_minimized())
    }

    /// Remove the widget and its log. Returns `false` if none was open.
    pub fn close(&self) -> bool {
        let mut state = self.state.write();
        match state.widget.take() {
            Some(widget) => {
                info!("Widget {} closed in tab {}", widget.id, self.tab_id);
                state.closed = true;
                true
            }
            None => false,
        }
    }

    /// Record a drag end and remember it for the next page.
    pub fn move_to(&self, position: WidgetPosition) -> Result<()> {
        {
            let mut state = self.state.write();
            let widget = state.widget.as_mut().ok_or(Error::NotActive)?;
            widget.position = Some(position);
        }
        self.settings.set_widget_position(position)
    }

    pub fn snapshot(&self) -> WidgetSnapshot {
        let state = self.state.read();
        match &state.widget {
            Some(widget) => widget.snapshot(),
            None if state.closed => WidgetSnapshot::absent(WidgetPhase::Closed),
            None => WidgetSnapshot::absent(WidgetPhase::Hidden),
        }
    }

    // ---------------------------------------------------------------
    // Flows
    // ---------------------------------------------------------------

    /// User message → backend → exactly one assistant or error message.
    /// Returns the message appended for the reply.
    pub async fn send_message(&self, text: &str) -> Result<Message> {
        let text = text.trim();
        if text.is_empty() {
            return Err(Error::InvalidInput("Message is empty".into()));
        }
        let _in_flight = self.begin_request()?;

        let id = {
            let mut state = self.state.write();
            let widget = state.widget.as_mut().ok_or(Error::NotActive)?;
            widget.transcript.push(Message::user(text));
            widget.id
        };

        self.ask_backend(id, BackendPayload::text(text)).await
    }

    /// Hide → capture → show. A capture is followed by a backend round trip
    /// with the image; a failed capture only adds an error message.
    pub async fn take_screenshot(&self) -> Result<Message> {
        let _in_flight = self.begin_request()?;

        let id = {
            let mut state = self.state.write();
            let widget = state.widget.as_mut().ok_or(Error::NotActive)?;
            widget.capturing = true;
            widget.id
        };

        let result = self.host.send(RelayRequest::take_screenshot()).await;
        self.with_widget(id, |w| w.capturing = false);

        let data_url = match result {
            Ok(RelayResponse {
                success: true,
                data_url: Some(url),
                ..
            }) => url,
            Ok(response) => {
                warn!(
                    "Screenshot failed in tab {}: {}",
                    self.tab_id,
                    response.error.as_deref().unwrap_or("no image returned")
                );
                return self.append(id, Message::system(SCREENSHOT_ERROR_TEXT));
            }
            Err(e) => {
                warn!("Screenshot relay failed in tab {}: {}", self.tab_id, e);
                return self.append(id, Message::system(SCREENSHOT_ERROR_TEXT));
            }
        };

        self.append(id, Message::image(data_url.clone()))?;
        self.ask_backend(id, BackendPayload::with_screenshot(SCREENSHOT_PROMPT, data_url))
            .await
    }

    async fn ask_backend(&self, id: Uuid, payload: BackendPayload) -> Result<Message> {
        self.with_widget(id, |w| w.transcript.begin_pending())
            .ok_or(Error::NotActive)?;

        let headers = self.settings.get().request_headers();
        let reply = match self
            .host
            .send(RelayRequest::send_to_backend(&payload, headers))
            .await
        {
            Ok(response) if response.success => match response.data_text() {
                Some(text) => Message::assistant(text),
                None => {
                    warn!("Backend reply for tab {} carried no text", self.tab_id);
                    Message::system(BACKEND_ERROR_TEXT)
                }
            },
            Ok(response) => {
                warn!(
                    "Backend error for tab {}: {}",
                    self.tab_id,
                    response.error.as_deref().unwrap_or("unknown")
                );
                Message::system(BACKEND_ERROR_TEXT)
            }
            Err(e) => {
                warn!("Backend relay failed for tab {}: {}", self.tab_id, e);
                Message::system(BACKEND_ERROR_TEXT)
            }
        };

        let appended = self.with_widget(id, |w| {
            w.transcript.end_pending();
            w.transcript.push(reply.clone());
        });
        if appended.is_none() {
            debug!("Dropping reply for closed widget {}", id);
            return Err(Error::NotActive);
        }
        Ok(reply)
    }

    // ---------------------------------------------------------------
    // Helpers
    // ---------------------------------------------------------------

    fn begin_request(&self) -> Result<InFlight<'_>> {
        if self.in_flight.swap(true, Ordering::SeqCst) {
            return Err(Error::Busy);
        }
        Ok(InFlight(&self.in_flight))
    }

    fn update_open(&self, f: impl FnOnce(&mut Widget)) -> Result<WidgetPhase> {
        let mut state = self.state.write();
        let widget = state.widget.as_mut().ok_or(Error::NotActive)?;
        f(widget);
        Ok(widget.phase)
    }

    /// Run `f` on the widget only if instance `id` is still the open one.
    fn with_widget<R>(&self, id: Uuid, f: impl FnOnce(&mut Widget) -> R) -> Option<R> {
        let mut state = self.state.write();
        state.widget.as_mut().filter(|w| w.id == id).map(f)
    }

    fn append(&self, id: Uuid, message: Message) -> Result<Message> {
        self.with_widget(id, |w| w.transcript.push(message.clone()))
            .ok_or(Error::NotActive)?;
        Ok(message)
    }
}

#[async_trait]
impl ActionHandler for WidgetController {
    async fn handle(&self, _origin: Option<&str>, _request: RelayRequest) -> RelayResponse {
        if !self.activate() {
            debug!("Widget already open in tab {}", self.tab_id);
        }
        RelayResponse::ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::{Sender, THINKING_TEXT};
    use parking_lot::Mutex;
    use someta_settings::SettingsUpdate;
    use std::time::Duration;

    /// Stand-in for the host's backend handler.
    struct FakeBackend {
        reply: RelayResponse,
        delay: Duration,
        seen: Mutex<Vec<RelayRequest>>,
    }

    #[async_trait]
    impl ActionHandler for FakeBackend {
        async fn handle(&self, _origin: Option<&str>, request: RelayRequest) -> RelayResponse {
            self.seen.lock().push(request);
            tokio::time::sleep(self.delay).await;
            self.reply.clone()
        }
    }

    struct FakeCapture(RelayResponse);

    #[async_trait]
    impl ActionHandler for FakeCapture {
        async fn handle(&self, origin: Option<&str>, _request: RelayRequest) -> RelayResponse {
            assert_eq!(origin, Some("tab-1"));
            self.0.clone()
        }
    }

    struct Page {
        controller: Arc<WidgetController>,
        backend: Arc<FakeBackend>,
        settings: Arc<SettingsStore>,
        _dir: tempfile::TempDir,
    }

    fn page_with(backend_reply: RelayResponse, capture: RelayResponse, delay: Duration) -> Page {
        let dir = tempfile::tempdir().unwrap();
        let settings = Arc::new(SettingsStore::open(&dir.path().join("settings.json")));
        let backend = Arc::new(FakeBackend {
            reply: backend_reply,
            delay,
            seen: Mutex::new(Vec::new()),
        });
        let (tx, rx) = someta_relay::channel(8);
        RelayListener::new()
            .on(RelayAction::SendToBackend, backend.clone())
            .on(RelayAction::TakeScreenshot, Arc::new(FakeCapture(capture)))
            .spawn(rx);
        let controller = Arc::new(WidgetController::new("tab-1", &tx, settings.clone()));
        Page {
            controller,
            backend,
            settings,
            _dir: dir,
        }
    }

    fn page(backend_reply: RelayResponse) -> Page {
        page_with(
            backend_reply,
            RelayResponse::with_data_url("data:image/png;base64,AA"),
            Duration::ZERO,
        )
    }

    fn senders(controller: &WidgetController) -> Vec<Sender> {
        controller
            .snapshot()
            .messages
            .into_iter()
            .map(|m| m.sender)
            .collect()
    }

    #[tokio::test]
    async fn test_send_renders_assistant_reply() {
        let p = page(RelayResponse::with_data("42"));
        p.controller.activate();

        let reply = p.controller.send_message("what is 6*7?").await.unwrap();
        assert_eq!(reply.sender, Sender::Assistant);
        assert_eq!(reply.text, "42");

        let snap = p.controller.snapshot();
        assert!(!snap.pending);
        assert_eq!(senders(&p.controller), vec![Sender::User, Sender::Assistant]);
        assert!(snap.messages.iter().all(|m| m.text != THINKING_TEXT));
    }

    #[tokio::test]
    async fn test_send_failure_renders_fixed_error() {
        let p = page(RelayResponse::failure("API error 500"));
        p.controller.activate();

        let reply = p.controller.send_message("hi").await.unwrap();
        assert_eq!(reply.sender, Sender::System);
        assert_eq!(reply.text, "Error: Could not get a response. Please try again.");
        assert_eq!(senders(&p.controller), vec![Sender::User, Sender::System]);
    }

    #[tokio::test]
    async fn test_send_carries_headers_from_settings() {
        let p = page(RelayResponse::with_data("ok"));
        p.settings
            .update(&SettingsUpdate {
                api_key: Some("X".into()),
                ..Default::default()
            })
            .unwrap();
        p.controller.activate();
        p.controller.send_message("hi").await.unwrap();

        let seen = p.backend.seen.lock();
        let headers = seen[0].headers().unwrap();
        assert_eq!(headers.get("Authorization").map(String::as_str), Some("Bearer X"));
        assert_eq!(seen[0].backend_payload().unwrap(), BackendPayload::text("hi"));
    }

    #[tokio::test]
    async fn test_unanswered_backend_renders_error() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Arc::new(SettingsStore::open(&dir.path().join("settings.json")));
        let (tx, rx) = someta_relay::channel(8);
        // host listening, but nothing handles sendToBackend
        RelayListener::new().spawn(rx);
        let controller = WidgetController::new("tab-1", &tx, settings);
        controller.activate();

        let reply = controller.send_message("hi").await.unwrap();
        assert_eq!(reply.text, BACKEND_ERROR_TEXT);
        assert_eq!(controller.snapshot().messages.len(), 2);
    }

    #[tokio::test]
    async fn test_placeholder_while_waiting_and_busy() {
        let p = page_with(
            RelayResponse::with_data("done"),
            RelayResponse::with_data_url("data:x"),
            Duration::from_millis(150),
        );
        p.controller.activate();

        let controller = p.controller.clone();
        let first = tokio::spawn(async move { controller.send_message("slow").await });
        tokio::time::sleep(Duration::from_millis(40)).await;

        let snap = p.controller.snapshot();
        assert!(snap.pending);
        assert_eq!(snap.messages.last().unwrap().text, THINKING_TEXT);

        let err = p.controller.send_message("again").await.unwrap_err();
        assert!(matches!(err, Error::Busy));
        let err = p.controller.take_screenshot().await.unwrap_err();
        assert!(matches!(err, Error::Busy));

        first.await.unwrap().unwrap();
        assert_eq!(senders(&p.controller), vec![Sender::User, Sender::Assistant]);
        // flag released
        p.controller.send_message("next").await.unwrap();
    }

    #[tokio::test]
    async fn test_screenshot_success_adds_image_then_reply() {
        let p = page(RelayResponse::with_data("looks like algebra"));
        p.controller.activate();

        let reply = p.controller.take_screenshot().await.unwrap();
        assert_eq!(reply.text, "looks like algebra");

        let snap = p.controller.snapshot();
        assert!(snap.visible);
        assert_eq!(snap.messages.len(), 2);
        assert_eq!(snap.messages[0].image.as_deref(), Some("data:image/png;base64,AA"));
        assert_eq!(snap.messages[0].sender, Sender::System);
        assert_eq!(snap.messages[1].sender, Sender::Assistant);

        let seen = p.backend.seen.lock();
        assert_eq!(seen.len(), 1);
        let payload = seen[0].backend_payload().unwrap();
        assert_eq!(payload.message, "I need help with this math problem:");
        assert_eq!(payload.screenshot.as_deref(), Some("data:image/png;base64,AA"));
    }

    #[tokio::test]
    async fn test_screenshot_failure_skips_backend() {
        let p = page_with(
            RelayResponse::with_data("unused"),
            RelayResponse::failure("capture denied"),
            Duration::ZERO,
        );
        p.controller.activate();

        let reply = p.controller.take_screenshot().await.unwrap();
        assert_eq!(reply.text, "Error: Could not take screenshot. Please try again.");

        let snap = p.controller.snapshot();
        assert!(snap.visible);
        assert_eq!(snap.messages.len(), 1);
        assert_eq!(snap.messages[0].sender, Sender::System);
        assert!(p.backend.seen.lock().is_empty());
    }

    #[tokio::test]
    async fn test_activation_is_idempotent() {
        let p = page(RelayResponse::with_data("a"));
        assert!(p.controller.activate());
        p.controller.send_message("hi").await.unwrap();
        let before = p.controller.snapshot();

        assert!(!p.controller.activate());
        let after = p.controller.snapshot();
        assert_eq!(before.id, after.id);
        assert_eq!(before.messages, after.messages);
    }

    #[tokio::test]
    async fn test_close_and_reopen_starts_fresh() {
        let p = page(RelayResponse::with_data("a"));
        assert_eq!(p.controller.snapshot().phase, WidgetPhase::Hidden);
        p.controller.activate();
        p.controller.send_message("hi").await.unwrap();
        let first_id = p.controller.snapshot().id;

        assert!(p.controller.close());
        assert!(!p.controller.close());
        assert_eq!(p.controller.snapshot().phase, WidgetPhase::Closed);
        assert!(matches!(p.controller.minimize(), Err(Error::NotActive)));

        p.controller.activate();
        let snap = p.controller.snapshot();
        assert_ne!(snap.id, first_id);
        assert!(snap.messages.is_empty());
    }

    #[tokio::test]
    async fn test_close_mid_flight_drops_reply() {
        let p = page_with(
            RelayResponse::with_data("late"),
            RelayResponse::with_data_url("data:x"),
            Duration::from_millis(100),
        );
        p.controller.activate();

        let controller = p.controller.clone();
        let pending = tokio::spawn(async move { controller.send_message("q").await });
        tokio::time::sleep(Duration::from_millis(20)).await;
        p.controller.close();
        p.controller.activate();

        let err = pending.await.unwrap().unwrap_err();
        assert!(matches!(err, Error::NotActive));
        assert!(p.controller.snapshot().messages.is_empty());
    }

    #[tokio::test]
    async fn test_minimize_restore_and_start_minimized() {
        let p = page(RelayResponse::with_data("a"));
        p.settings
            .update(&SettingsUpdate {
                start_minimized: Some(true),
                ..Default::default()
            })
            .unwrap();
        p.controller.activate();
        assert_eq!(p.controller.snapshot().phase, WidgetPhase::Minimized);
        assert_eq!(p.controller.restore().unwrap(), WidgetPhase::Normal);
        assert_eq!(p.controller.minimize().unwrap(), WidgetPhase::Minimized);
        assert_eq!(p.controller.toggle_minimized().unwrap(), WidgetPhase::Normal);
    }

    #[tokio::test]
    async fn test_inactive_and_blank_input() {
        let p = page(RelayResponse::with_data("a"));
        assert!(matches!(
            p.controller.send_message("hi").await,
            Err(Error::NotActive)
        ));
        p.controller.activate();
        assert!(matches!(
            p.controller.send_message("   ").await,
            Err(Error::InvalidInput(_))
        ));
        assert!(p.backend.seen.lock().is_empty());
    }

    #[tokio::test]
    async fn test_move_persists_position() {
        let p = page(RelayResponse::with_data("a"));
        let pos = WidgetPosition { x: 120.0, y: 48.0 };
        assert!(p.controller.move_to(pos).is_err());

        p.controller.activate();
        p.controller.move_to(pos).unwrap();
        assert_eq!(p.controller.snapshot().position, Some(pos));
        assert_eq!(p.settings.get().widget_position, Some(pos));
    }

    #[tokio::test]
    async fn test_page_listener_activates_widget() {
        let p = page(RelayResponse::with_data("a"));
        let (tx, rx) = someta_relay::channel(4);
        p.controller.listener().spawn(rx);

        let response = tx.send(RelayRequest::activate_widget()).await.unwrap();
        assert_eq!(response, RelayResponse::ok());
        let again = tx.send(RelayRequest::activate_widget()).await.unwrap();
        assert!(again.success);
        assert_eq!(p.controller.snapshot().phase, WidgetPhase::Normal);
    }
}
