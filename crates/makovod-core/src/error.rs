//! Error types for the mako VOD core
//!
//! One enum covers every failure the core can report. Callers usually
//! only care which family an error belongs to: transport failures are
//! retried by the client, everything else is terminal for the item.

use thiserror::Error;

/// Error type for all mako VOD operations
#[derive(Error, Debug)]
pub enum MakoError {
    /// HTTP request failed (network, timeout, body read)
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Server answered with a non-success status
    #[error("HTTP {status} from {url}")]
    HttpStatus { status: u16, url: String },

    /// Rate limited by server (HTTP 429)
    #[error("Rate limited - too many requests")]
    RateLimited,

    /// Expected HTML structure or embedded JSON was missing or malformed
    #[error("Failed to parse: {0}")]
    ParseError(String),

    /// Base64, cipher or padding failure
    #[error("Crypto failure: {0}")]
    CryptoError(String),

    /// A well-formed payload lacked a required field
    #[error("Missing field: {0}")]
    MissingField(String),

    /// Invalid URL format
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Cache file could not be read or written
    #[error("Cache I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// Cache document could not be (de)serialized
    #[error("Cache JSON invalid: {0}")]
    Json(#[from] serde_json::Error),
}

impl MakoError {
    /// Whether this error came from the network layer
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            MakoError::HttpError(_) | MakoError::HttpStatus { .. } | MakoError::RateLimited
        )
    }
}

/// Result type alias for mako VOD operations
pub type Result<T> = std::result::Result<T, MakoError>;
