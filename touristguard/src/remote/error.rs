//! Errors constructing the API client.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RemoteError {
    /// The configured base URL is not an absolute http(s) URL.
    #[error("Invalid API base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    /// The HTTP client could not be built (TLS backend initialisation).
    #[error("Failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}
