//! Activation error taxonomy.
//!
//! Every variant is surfaced immediately to the caller; the messages are
//! meant to be shown to the person activating.

use thiserror::Error;

use crate::identity::{IdentityStoreError, IdentityToken};
use crate::permissions::PermissionScope;
use crate::session::SessionError;

#[derive(Debug, Error)]
pub enum ActivationError {
    /// The identifier was empty or whitespace-only.
    #[error("Digital ID must not be empty")]
    InvalidInput,

    /// The remote lookup does not know this identifier.
    #[error("Unknown digital ID '{0}'")]
    UnknownIdentity(IdentityToken),

    /// The remote lookup failed for a reason other than "unknown".
    #[error("Could not validate digital ID: {0}")]
    ValidationUnavailable(String),

    /// A required positioning permission was not granted.
    #[error("{scope} location permission was not granted")]
    PermissionDenied { scope: PermissionScope },

    /// Reading, writing or clearing the durable token failed.
    #[error(transparent)]
    IdentityStorage(#[from] IdentityStoreError),

    /// The tracking session could not be started.
    #[error("Failed to start tracking: {0}")]
    TrackingStartFailed(#[source] SessionError),
}

impl ActivationError {
    /// Returns true if the person can fix this by changing a device setting.
    pub fn is_permission(&self) -> bool {
        matches!(self, ActivationError::PermissionDenied { .. })
    }
}
