//! Handle to a running tracking session.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::error::SessionError;
use super::state::SessionState;
use crate::activation::TouristProfile;
use crate::delivery::{DeliveryQueue, DeliveryStats, DrainReport};
use crate::geofence::ZoneClassification;
use crate::identity::IdentityToken;

/// Per-session counters shared with the supervisor task.
#[derive(Debug, Default)]
pub(crate) struct SessionCounters {
    pub samples: AtomicU64,
    pub classifications: AtomicU64,
    pub degradations: AtomicU64,
}

/// Point-in-time session statistics.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionStats {
    pub state: SessionState,
    /// Samples received from the source and queued for delivery.
    pub samples: u64,
    /// Samples classified against the geofence snapshot.
    pub classifications: u64,
    /// Times the session entered `Degraded`.
    pub degradations: u64,
    pub delivery: DeliveryStats,
    pub uptime: Duration,
}

/// Final report of a stopped session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSummary {
    pub identity: IdentityToken,
    pub stats: SessionStats,
    pub drain: DrainReport,
}

/// State shared between the handle and the supervisor task.
pub(crate) struct SessionShared {
    pub identity: IdentityToken,
    pub state: watch::Receiver<SessionState>,
    pub classifications: broadcast::Sender<ZoneClassification>,
    pub last_classification: Mutex<Option<ZoneClassification>>,
    pub queue: Arc<DeliveryQueue>,
    pub counters: SessionCounters,
    pub started_at: Instant,
}

impl SessionShared {
    pub fn stats(&self) -> SessionStats {
        SessionStats {
            state: *self.state.borrow(),
            samples: self.counters.samples.load(Ordering::Relaxed),
            classifications: self.counters.classifications.load(Ordering::Relaxed),
            degradations: self.counters.degradations.load(Ordering::Relaxed),
            delivery: self.queue.stats(),
            uptime: self.started_at.elapsed(),
        }
    }

    pub fn record_classification(&self, classification: ZoneClassification) {
        self.counters.classifications.fetch_add(1, Ordering::Relaxed);
        *self
            .last_classification
            .lock()
            .unwrap_or_else(|e| e.into_inner()) = Some(classification.clone());
        // No subscribers is fine; the result stays available via last_classification
        let _ = self.classifications.send(classification);
    }
}

#[derive(Default)]
struct StopState {
    supervisor: Option<JoinHandle<SessionSummary>>,
    summary: Option<SessionSummary>,
}

struct HandleInner {
    shared: Arc<SessionShared>,
    shutdown: CancellationToken,
    stop: tokio::sync::Mutex<StopState>,
}

/// Handle to a tracking session.
///
/// Cheap to clone; all clones refer to the same session. Dropping every
/// handle does not stop the session, call [`stop`](Self::stop).
#[derive(Clone)]
pub struct SessionHandle {
    inner: Arc<HandleInner>,
    profile: Option<TouristProfile>,
}

impl SessionHandle {
    pub(crate) fn new(
        shared: Arc<SessionShared>,
        shutdown: CancellationToken,
        supervisor: JoinHandle<SessionSummary>,
    ) -> Self {
        Self {
            inner: Arc::new(HandleInner {
                shared,
                shutdown,
                stop: tokio::sync::Mutex::new(StopState {
                    supervisor: Some(supervisor),
                    summary: None,
                }),
            }),
            profile: None,
        }
    }

    pub(crate) fn with_profile(mut self, profile: Option<TouristProfile>) -> Self {
        self.profile = profile;
        self
    }

    /// Identity this session reports for.
    pub fn identity(&self) -> &IdentityToken {
        &self.inner.shared.identity
    }

    /// Profile returned by identity validation, when it ran.
    pub fn profile(&self) -> Option<&TouristProfile> {
        self.profile.as_ref()
    }

    pub fn state(&self) -> SessionState {
        *self.inner.shared.state.borrow()
    }

    /// Receiver that observes every state change.
    pub fn watch_state(&self) -> watch::Receiver<SessionState> {
        self.inner.shared.state.clone()
    }

    /// Subscribe to local zone classifications.
    ///
    /// Results are informational; the session never raises alerts itself.
    pub fn subscribe_classifications(&self) -> broadcast::Receiver<ZoneClassification> {
        self.inner.shared.classifications.subscribe()
    }

    /// Most recent classification, if any sample has been classified.
    pub fn last_classification(&self) -> Option<ZoneClassification> {
        self.inner
            .shared
            .last_classification
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn stats(&self) -> SessionStats {
        self.inner.shared.stats()
    }

    pub fn delivery_stats(&self) -> DeliveryStats {
        self.inner.shared.queue.stats()
    }

    /// Returns true if both handles refer to the same session.
    pub fn same_session(&self, other: &SessionHandle) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Stop the session: cancel sampling, drain the backlog, return to `Idle`.
    ///
    /// Idempotent. Every call after the first returns the same summary.
    pub async fn stop(&self) -> Result<SessionSummary, SessionError> {
        let mut stop = self.inner.stop.lock().await;
        if let Some(summary) = &stop.summary {
            return Ok(summary.clone());
        }

        self.inner.shutdown.cancel();
        let Some(supervisor) = stop.supervisor.take() else {
            return Err(SessionError::Supervisor("session already torn down".to_string()));
        };

        match supervisor.await {
            Ok(summary) => {
                stop.summary = Some(summary.clone());
                Ok(summary)
            }
            Err(e) => Err(SessionError::Supervisor(e.to_string())),
        }
    }
}

impl std::fmt::Debug for SessionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionHandle")
            .field("identity", self.identity())
            .field("state", &self.state())
            .finish()
    }
}
