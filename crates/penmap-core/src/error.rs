//! Error types for penmap

use thiserror::Error;

/// Main error type for penmap operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("failed to create uinput device: {0}")]
    UinputCreation(String),

    #[error("input injection error: {0}")]
    Input(String),

    #[error("input device error: {0}")]
    Device(String),

    #[error("settings error: {0}")]
    Settings(String),

    #[error("session channel closed")]
    ChannelClosed,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias using penmap's Error
pub type Result<T> = std::result::Result<T, Error>;
