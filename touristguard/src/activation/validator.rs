//! Remote identity validation.

use std::future::Future;

use thiserror::Error;

use crate::identity::IdentityToken;

/// Profile details returned by a successful lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TouristProfile {
    /// Name for greeting text, when the profile carries one.
    pub display_name: Option<String>,
}

/// Why a lookup did not confirm the identity.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// The remote side has no such identity (404).
    #[error("identity not found")]
    Unknown,

    /// Any other failure: network, timeout, non-404 status.
    #[error("{0}")]
    Unavailable(String),
}

/// Lookup of an identity against the remote collector.
pub trait IdentityValidator: Send + Sync {
    fn validate(
        &self,
        token: &IdentityToken,
    ) -> impl Future<Output = Result<TouristProfile, ValidationError>> + Send;
}
