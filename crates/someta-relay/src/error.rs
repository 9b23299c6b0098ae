//! Relay transport errors.

use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RelayError {
    /// Nothing is listening on the other side of the channel.
    #[error("Receiving end does not exist")]
    NoResponder,

    /// The listener received the request but dropped it without replying.
    #[error("Request was not answered")]
    Unanswered,

    #[error("No response within {0:?}")]
    Timeout(Duration),
}

impl From<RelayError> for someta_core::Error {
    fn from(e: RelayError) -> Self {
        someta_core::Error::Relay(e.to_string())
    }
}
