//! Host context: the privileged side of the relay.
//!
//! Owns the only outbound network call (the chat backend) and tab capture,
//! and activates page contexts, injecting them when a tab has none.

pub mod backend;
pub mod capture;
pub mod handlers;
pub mod service;
pub mod tabs;

pub use backend::BackendClient;
pub use capture::{CdpCapturer, TabCapturer, UnavailableCapturer};
pub use service::{Activation, ContentInjector, HostService};
pub use tabs::TabRegistry;
