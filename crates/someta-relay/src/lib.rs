//! Relay bridge between the page context and the host context.
//!
//! Requests are tagged with an action and carry an opaque payload; each
//! one gets at most one reply over a one-shot channel. Neither side shares
//! memory with the other.

pub mod bridge;
pub mod error;
pub mod listener;
pub mod types;

pub use bridge::{channel, Envelope, RelayReceiver, RelaySender, Responder};
pub use error::RelayError;
pub use listener::{ActionHandler, RelayListener};
pub use types::*;
