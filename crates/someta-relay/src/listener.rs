//! Action dispatch on the receiving side of a relay.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::bridge::{Envelope, RelayReceiver};
use crate::types::{RelayAction, RelayRequest, RelayResponse};

/// Handles one relay action.
#[async_trait]
pub trait ActionHandler: Send + Sync {
    async fn handle(&self, origin: Option<&str>, request: RelayRequest) -> RelayResponse;
}

/// Handlers keyed by action. Requests for actions without a handler are
/// dropped unanswered.
#[derive(Clone, Default)]
pub struct RelayListener {
    handlers: HashMap<RelayAction, Arc<dyn ActionHandler>>,
}

impl RelayListener {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for `action`, replacing any previous one.
    pub fn on(mut self, action: RelayAction, handler: Arc<dyn ActionHandler>) -> Self {
        self.handlers.insert(action, handler);
        self
    }

    pub fn handles(&self, action: RelayAction) -> bool {
        self.handlers.contains_key(&action)
    }

    /// Run one envelope through its handler and send the reply.
    pub async fn dispatch(&self, envelope: Envelope) {
        let Envelope {
            origin,
            request,
            responder,
        } = envelope;

        let Some(handler) = self.handlers.get(&request.action) else {
            debug!("Ignoring relay action {} from {:?}", request.action, origin);
            return;
        };

        let action = request.action;
        let response = handler.handle(origin.as_deref(), request).await;
        if !responder.respond(response) {
            warn!("Caller stopped waiting for {} reply", action);
        }
    }

    /// Serve `receiver` until every sender is gone. Each request runs in its
    /// own task, so replies may complete out of order.
    pub fn spawn(self, mut receiver: RelayReceiver) -> JoinHandle<()> {
        let listener = Arc::new(self);
        tokio::spawn(async move {
            while let Some(envelope) = receiver.recv().await {
                let listener = listener.clone();
                tokio::spawn(async move {
                    listener.dispatch(envelope).await;
                });
            }
            debug!("Relay listener stopped");
        })
    }
}
