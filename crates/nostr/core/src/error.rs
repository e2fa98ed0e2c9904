//! Event model error types

use thiserror::Error;

/// Errors raised while building, hashing or signing events.
#[derive(Debug, Error)]
pub enum EventError {
    /// The operation needs a field that has not been assigned yet
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// Structural validation failed
    #[error("invalid event: {0}")]
    InvalidEvent(String),

    #[error("invalid hex: {0}")]
    InvalidHex(String),

    #[error("invalid secret key: {0}")]
    InvalidSecretKey(String),

    #[error("signing error: {0}")]
    Signing(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<hex::FromHexError> for EventError {
    fn from(err: hex::FromHexError) -> Self {
        EventError::InvalidHex(err.to_string())
    }
}

impl From<serde_json::Error> for EventError {
    fn from(err: serde_json::Error) -> Self {
        EventError::Serialization(err.to_string())
    }
}
