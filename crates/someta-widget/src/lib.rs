//! Page context: the in-page chat widget.
//!
//! A [`WidgetController`] owns at most one widget per tab. Every backend or
//! capture request goes through the host over the relay; the page itself
//! makes no network calls.

pub mod controller;
pub mod message;
pub mod registry;
pub mod state;

pub use controller::WidgetController;
pub use message::{Message, Sender, Transcript};
pub use registry::PageRegistry;
pub use state::{Widget, WidgetPhase, WidgetSnapshot};
