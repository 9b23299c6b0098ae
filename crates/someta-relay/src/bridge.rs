//! Relay channel: request envelopes with a one-shot reply each.

use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tracing::trace;

use crate::error::RelayError;
use crate::types::{RelayRequest, RelayResponse};

/// Create a connected sender/receiver pair.
pub fn channel(buffer: usize) -> (RelaySender, RelayReceiver) {
    let (tx, rx) = mpsc::channel(buffer.max(1));
    (
        RelaySender {
            tx,
            origin: None,
            timeout: None,
        },
        RelayReceiver { rx },
    )
}

/// Calling side of the relay. Cheap to clone; every clone targets the same
/// listener.
#[derive(Clone)]
pub struct RelaySender {
    tx: mpsc::Sender<Envelope>,
    origin: Option<String>,
    timeout: Option<Duration>,
}

impl RelaySender {
    /// Tag outgoing requests with the tab they come from.
    pub fn with_origin(&self, origin: impl Into<String>) -> Self {
        Self {
            origin: Some(origin.into()),
            ..self.clone()
        }
    }

    /// Stop waiting for a reply after `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn origin(&self) -> Option<&str> {
        self.origin.as_deref()
    }

    /// Whether a listener still holds the receiving end.
    pub fn is_connected(&self) -> bool {
        !self.tx.is_closed()
    }

    /// Deliver `request` and wait for its single reply.
    pub async fn send(&self, request: RelayRequest) -> Result<RelayResponse, RelayError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        let action = request.action;
        let envelope = Envelope {
            origin: self.origin.clone(),
            request,
            responder: Responder { tx: reply_tx },
        };

        self.tx
            .send(envelope)
            .await
            .map_err(|_| RelayError::NoResponder)?;
        trace!("relay sent {} from {:?}", action, self.origin);

        match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, reply_rx).await {
                Ok(Ok(response)) => Ok(response),
                Ok(Err(_)) => Err(RelayError::Unanswered),
                Err(_) => Err(RelayError::Timeout(limit)),
            },
            None => reply_rx.await.map_err(|_| RelayError::Unanswered),
        }
    }
}

/// Listening side of the relay.
pub struct RelayReceiver {
    rx: mpsc::Receiver<Envelope>,
}

impl RelayReceiver {
    pub async fn recv(&mut self) -> Option<Envelope> {
        self.rx.recv().await
    }
}

/// One delivered request plus the means to answer it.
pub struct Envelope {
    pub origin: Option<String>,
    pub request: RelayRequest,
    pub responder: Responder,
}

/// Consumed by the single reply. Dropping it unanswered tells the caller
/// nobody will respond.
pub struct Responder {
    tx: oneshot::Sender<RelayResponse>,
}

impl Responder {
    /// Returns `false` if the caller stopped waiting.
    pub fn respond(self, response: RelayResponse) -> bool {
        self.tx.send(response).is_ok()
    }
}
