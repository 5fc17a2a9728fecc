//! Error types for ticket-scanner.

use thiserror::Error;

/// Result type for ticket-scanner operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the scanner.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// The verification request could not be completed.
    #[error("network error: {0}")]
    Network(String),

    /// The verification endpoint answered with a body we could not parse.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// The decoder failed after it was started.
    #[error("decoder error: {0}")]
    Decoder(String),

    /// The decoder could not be started at all.
    #[error("camera unavailable: {0}")]
    CameraUnavailable(String),
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            Self::InvalidResponse(e.to_string())
        } else {
            Self::Network(e.to_string())
        }
    }
}

impl From<toml::de::Error> for Error {
    fn from(e: toml::de::Error) -> Self {
        Self::Config(e.to_string())
    }
}
