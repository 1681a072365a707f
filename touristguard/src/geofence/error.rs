//! Error types for geofence refresh.

use thiserror::Error;

/// Errors that can occur when fetching the zone list.
///
/// A failed fetch never empties the active snapshot; these are reported to
/// the caller of `refresh()` and recorded in the store status.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// Network-level failure (connect, timeout, body read).
    #[error("HTTP request failed: {0}")]
    Http(String),

    /// Non-success status code from the remote source.
    #[error("Geofence source responded with HTTP {0}")]
    Status(u16),

    /// The response body could not be decoded as a zone list.
    #[error("Failed to parse geofence list: {0}")]
    Decode(String),
}
