//! Someta Core: shared error type and runtime configuration.

pub mod config;
pub mod error;

pub use config::{DataPaths, SometaConfig};
pub use error::{Error, Result};
