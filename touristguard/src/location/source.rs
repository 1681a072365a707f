//! The Location Sample Source port.
//!
//! Platform positioning callbacks may run on an execution context unrelated
//! to the rest of the process. Everything they produce crosses into the core
//! as a [`SourceEvent`] over an `mpsc` channel; nothing downstream is ever
//! invoked from the callback itself.

use std::fmt;
use std::future::Future;

use thiserror::Error;
use tokio::sync::mpsc;

use super::config::SamplingConfig;
use super::sample::LocationSample;
use crate::identity::IdentityToken;

/// Why background sampling can no longer be guaranteed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DegradeReason {
    /// Positioning permission was revoked at the OS level after activation.
    PermissionRevoked,
    /// The platform cannot sustain the configured cadence in the background.
    BackgroundUnavailable(String),
}

impl fmt::Display for DegradeReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PermissionRevoked => write!(f, "location permission revoked"),
            Self::BackgroundUnavailable(reason) => {
                write!(f, "background sampling unavailable: {}", reason)
            }
        }
    }
}

/// Events emitted by a running sampling registration.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceEvent {
    /// A new position fix, in production order.
    Sample(LocationSample),
    /// Capability degraded; samples may stop or slow until restored.
    Degraded(DegradeReason),
    /// Full capability is back.
    Restored,
}

/// A sampling registration: who is being tracked and at what cadence.
///
/// The identity is captured once here rather than re-read from storage by
/// the sampling callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    pub identity: IdentityToken,
    pub config: SamplingConfig,
}

/// Errors starting a sampling registration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SourceError {
    /// A registration is already active on this source.
    #[error("A location sampling registration is already active")]
    AlreadyRegistered,

    /// The platform refused the registration.
    #[error("Platform refused location registration: {0}")]
    Platform(String),
}

/// Scheduled positioning capability.
///
/// Implementations must keep producing samples while the host process is
/// backgrounded, or emit [`SourceEvent::Degraded`] when they cannot.
pub trait LocationSource: Send + Sync {
    /// Register for updates. Samples and capability signals are sent on
    /// `events` until [`stop_updates`](Self::stop_updates) is called or the
    /// receiver is dropped.
    fn start_updates(
        &self,
        registration: Registration,
        events: mpsc::Sender<SourceEvent>,
    ) -> impl Future<Output = Result<(), SourceError>> + Send;

    /// Cancel the active registration, if any, and wait until no further
    /// events will be sent.
    fn stop_updates(&self) -> impl Future<Output = ()> + Send;

    /// Number of live sampling registrations (0 or 1).
    fn active_registrations(&self) -> usize;
}
