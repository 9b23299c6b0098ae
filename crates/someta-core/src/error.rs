//! Error types for Someta.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Relay error: {0}")]
    Relay(String),

    #[error("Capture error: {0}")]
    Capture(String),

    #[error("Backend error: {0}")]
    Backend(String),

    #[error("Widget is not active")]
    NotActive,

    #[error("A request is already in flight")]
    Busy,

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

pub type Result<T> = std::result::Result<T, Error>;
