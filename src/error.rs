//! Error types for nft-publish.

use thiserror::Error;

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while publishing or verifying assets.
#[derive(Debug, Error)]
pub enum Error {
    /// Local I/O failure (reading an image or manifest, writing config).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration could not be loaded or is invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// Request never produced a response (connect, timeout, body read).
    #[error("network error: {0}")]
    Network(String),

    /// Gateway answered with a non-2xx status.
    #[error("{uri} returned HTTP {status}")]
    Status {
        /// Requested locator.
        uri: String,
        /// HTTP status code.
        status: u16,
    },

    /// Gateway body was not valid JSON.
    #[error("invalid JSON from {uri}: {source}")]
    Json {
        /// Requested locator.
        uri: String,
        /// Parser error.
        #[source]
        source: serde_json::Error,
    },

    /// The upload step failed. Never retried.
    #[error("upload failed: {0}")]
    Upload(String),

    /// Local manifest file is not a usable JSON document.
    #[error("invalid manifest: {0}")]
    Manifest(String),
}

impl Error {
    /// Whether this error is a per-attempt failure that the poll loop absorbs.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Network(_) | Self::Status { .. } | Self::Json { .. }
        )
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Self::Network(e.to_string())
    }
}
