//! Persisted widget settings shared by the host, page, and editor roles.

pub mod store;
pub mod types;

pub use store::SettingsStore;
pub use types::*;
