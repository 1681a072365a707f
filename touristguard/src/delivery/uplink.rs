//! The remote collector port.

use std::future::Future;

use super::error::DeliveryError;
use crate::identity::IdentityToken;
use crate::location::LocationSample;

/// Delivers one location report to the remote collector.
///
/// The update is an idempotent per-identity PATCH; the collector must treat
/// a repeated `(identity, captured_at)` as a duplicate.
pub trait LocationUplink: Send + Sync {
    fn send_location(
        &self,
        identity: &IdentityToken,
        sample: &LocationSample,
    ) -> impl Future<Output = Result<(), DeliveryError>> + Send;
}
