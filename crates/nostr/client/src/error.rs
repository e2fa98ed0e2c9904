//! Client error types

use thiserror::Error;

/// Client error type
#[derive(Error, Debug)]
pub enum ClientError {
    /// Event failed structural or signature checks; nothing was sent
    #[error("Invalid event: {0}")]
    InvalidEvent(String),

    /// Deadline elapsed with no terminating message
    #[error("Timeout error: {0}")]
    Timeout(String),

    /// Relay answered `["OK", <id>, false, <message>]`
    #[error("Relay rejected event {event_id}: {message}")]
    RelayRejected { event_id: String, message: String },

    /// Connection-level failure reading or writing
    #[error("Transport error: {0}")]
    Transport(String),

    /// Invalid URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// URL parse error
    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    /// Malformed relay message
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Client result type
pub type Result<T> = std::result::Result<T, ClientError>;
