//! Error types for the star-gazing tools

use thiserror::Error;

/// Result type alias for tool operations
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Every failure a tool call can surface to the client
#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid ISO 8601 datetime: {0}")]
    InvalidDateTime(String),

    #[error("Swiss Ephemeris error: {0}")]
    Ephemeris(String),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Upstream API error {status}: {body}")]
    Upstream { status: u16, body: String },

    #[error("Location not found: {0}")]
    LocationNotFound(String),

    #[error("Malformed upstream response: {0}")]
    MalformedResponse(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}
