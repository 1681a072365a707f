//! Tracking session errors.

use thiserror::Error;

use crate::location::SourceError;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// The Location Sample Source refused the registration.
    #[error("Failed to start location sampling: {0}")]
    Source(#[from] SourceError),

    /// The session supervisor task ended abnormally.
    #[error("Tracking session task failed: {0}")]
    Supervisor(String),
}
