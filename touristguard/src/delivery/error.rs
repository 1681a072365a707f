//! Delivery failure classification.

use thiserror::Error;

/// Outcome of a failed delivery attempt.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeliveryError {
    /// Network error, timeout, auth or 5xx. The envelope is retained and
    /// retried after backoff.
    #[error("Transient delivery failure: {0}")]
    Transient(String),

    /// The collector rejected the report (4xx other than auth). The envelope
    /// is discarded and counted.
    #[error("Collector rejected location report with HTTP {status}: {message}")]
    Permanent { status: u16, message: String },
}

impl DeliveryError {
    /// Returns true if the envelope should be retried.
    pub fn is_transient(&self) -> bool {
        matches!(self, DeliveryError::Transient(_))
    }
}
