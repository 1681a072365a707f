//! Tracking Session Controller.
//!
//! Starts the Location Sample Source for one identity and runs a supervisor
//! task that forwards every sample to the Delivery Queue and, when enabled,
//! classifies it against the current geofence snapshot.
//!
//! # Task Layout
//!
//! ```text
//! LocationSource ──mpsc──► supervisor ──enqueue──► DeliveryQueue ◄── delivery worker ──► uplink
//!                              │
//!                              └──classify──► broadcast<ZoneClassification>
//! ```
//!
//! # Shutdown
//!
//! Stopping cancels the sampling registration, forwards any samples it had
//! already produced, stops the delivery worker and drains the backlog within
//! `drain_timeout`. Whatever cannot be delivered in that window is discarded
//! and counted as dropped before the session reaches `Idle`.

use std::sync::atomic::Ordering;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tokio::sync::{broadcast, mpsc, watch};
use tokio_util::sync::CancellationToken;

use super::error::SessionError;
use super::handle::{SessionCounters, SessionHandle, SessionShared, SessionSummary};
use super::state::{SessionEvent, SessionState};
use crate::delivery::{DeliveryConfig, DeliveryDispatcher, DeliveryQueue, LocationUplink};
use crate::geofence::{classify, SnapshotSource};
use crate::identity::IdentityToken;
use crate::location::{LocationSource, Registration, SamplingConfig, SourceEvent};

/// Default interval between session status log lines.
pub const DEFAULT_STATUS_INTERVAL: Duration = Duration::from_secs(60);

/// Capacity of the source event channel.
const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Capacity of the classification broadcast channel.
const CLASSIFICATION_CHANNEL_CAPACITY: usize = 16;

/// Session configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    pub sampling: SamplingConfig,
    pub delivery: DeliveryConfig,
    /// Classify each sample against the geofence snapshot.
    pub local_classification: bool,
    /// Interval of the debug status log. Zero is treated as one millisecond.
    pub status_interval: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        let sampling = SamplingConfig::default();
        Self {
            delivery: DeliveryConfig::for_sampling(&sampling),
            sampling,
            local_classification: true,
            status_interval: DEFAULT_STATUS_INTERVAL,
        }
    }
}

/// Starts tracking sessions over a location source and an uplink.
pub struct TrackingSessionController<S, U> {
    source: Arc<S>,
    uplink: Arc<U>,
    geofences: Option<Arc<dyn SnapshotSource>>,
    config: SessionConfig,
}

impl<S, U> TrackingSessionController<S, U>
where
    S: LocationSource + 'static,
    U: LocationUplink + 'static,
{
    pub fn new(source: Arc<S>, uplink: Arc<U>, config: SessionConfig) -> Self {
        Self {
            source,
            uplink,
            geofences: None,
            config,
        }
    }

    /// Enable local classification against `geofences`.
    pub fn with_geofences(mut self, geofences: Arc<dyn SnapshotSource>) -> Self {
        self.geofences = Some(geofences);
        self
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// The location source sessions are started on.
    pub fn source(&self) -> &Arc<S> {
        &self.source
    }

    /// Start a session for `identity`.
    ///
    /// The identity is captured here and handed to the source registration
    /// and the delivery queue; it cannot change for the session's lifetime.
    pub async fn start(&self, identity: IdentityToken) -> Result<SessionHandle, SessionError> {
        let (state_tx, state_rx) = watch::channel(SessionState::Idle);
        transition(&state_tx, SessionEvent::Activate);

        let (events_tx, events_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let registration = Registration {
            identity: identity.clone(),
            config: self.config.sampling.clone(),
        };

        if let Err(e) = self.source.start_updates(registration, events_tx).await {
            transition(&state_tx, SessionEvent::StartFailed);
            tracing::warn!(identity = %identity, error = %e, "Tracking session failed to start");
            return Err(SessionError::Source(e));
        }

        let queue = Arc::new(DeliveryQueue::new(
            identity.clone(),
            self.config.delivery.clone(),
        ));
        let dispatcher = Arc::new(DeliveryDispatcher::new(
            Arc::clone(&queue),
            Arc::clone(&self.uplink),
        ));

        let (classifications, _) = broadcast::channel(CLASSIFICATION_CHANNEL_CAPACITY);
        let shared = Arc::new(SessionShared {
            identity: identity.clone(),
            state: state_rx,
            classifications,
            last_classification: Mutex::new(None),
            queue,
            counters: SessionCounters::default(),
            started_at: Instant::now(),
        });

        transition(&state_tx, SessionEvent::SourceReady);

        let shutdown = CancellationToken::new();
        let worker_cancel = CancellationToken::new();
        let worker = Arc::clone(&dispatcher).spawn(worker_cancel.clone());

        let supervisor = Supervisor {
            source: Arc::clone(&self.source),
            dispatcher,
            geofences: if self.config.local_classification {
                self.geofences.clone()
            } else {
                None
            },
            shared: Arc::clone(&shared),
            state: state_tx,
            config: self.config.clone(),
        };
        let task = tokio::spawn(supervisor.run(events_rx, shutdown.clone(), worker, worker_cancel));

        tracing::info!(
            identity = %identity,
            local_classification = self.config.local_classification,
            "Tracking session started"
        );
        Ok(SessionHandle::new(shared, shutdown, task))
    }
}

/// Apply `event` to the state machine, logging the transition.
fn transition(state: &watch::Sender<SessionState>, event: SessionEvent) -> bool {
    let mut applied = None;
    state.send_if_modified(|current| match current.next(event) {
        Some(next) => {
            applied = Some((*current, next));
            *current = next;
            true
        }
        None => false,
    });

    match applied {
        Some((from, to)) => {
            tracing::info!(%from, %to, ?event, "Tracking session state changed");
            true
        }
        None => {
            let current = *state.borrow();
            tracing::debug!(state = %current, ?event, "Ignoring session event");
            false
        }
    }
}

struct Supervisor<S, U> {
    source: Arc<S>,
    dispatcher: Arc<DeliveryDispatcher<U>>,
    geofences: Option<Arc<dyn SnapshotSource>>,
    shared: Arc<SessionShared>,
    state: watch::Sender<SessionState>,
    config: SessionConfig,
}

impl<S, U> Supervisor<S, U>
where
    S: LocationSource + 'static,
    U: LocationUplink + 'static,
{
    async fn run(
        self,
        mut events: mpsc::Receiver<SourceEvent>,
        shutdown: CancellationToken,
        worker: tokio::task::JoinHandle<()>,
        worker_cancel: CancellationToken,
    ) -> SessionSummary {
        let status_every = self.config.status_interval.max(Duration::from_millis(1));
        let mut status = tokio::time::interval(status_every);
        status.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // The first tick completes immediately
        status.tick().await;

        let mut source_open = true;
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                event = events.recv(), if source_open => match event {
                    Some(event) => self.handle_event(event),
                    None => {
                        source_open = false;
                        tracing::warn!("Location source closed its event channel");
                    }
                },
                _ = status.tick() => self.log_status(),
            }
        }

        transition(&self.state, SessionEvent::Stop);

        // Keep receiving while the registration winds down so a source
        // blocked on a full channel can finish
        let stop = self.source.stop_updates();
        tokio::pin!(stop);
        loop {
            tokio::select! {
                _ = &mut stop => break,
                event = events.recv(), if source_open => match event {
                    Some(event) => self.forward_on_stop(event),
                    None => source_open = false,
                },
            }
        }
        while let Ok(event) = events.try_recv() {
            self.forward_on_stop(event);
        }

        worker_cancel.cancel();
        if let Err(e) = worker.await {
            tracing::warn!(error = %e, "Delivery worker ended abnormally");
        }

        let drain = self.dispatcher.drain(self.config.delivery.drain_timeout).await;
        transition(&self.state, SessionEvent::Drained);

        let stats = self.shared.stats();
        tracing::info!(
            identity = %self.shared.identity,
            samples = stats.samples,
            delivered = stats.delivery.delivered,
            dropped = stats.delivery.dropped,
            "Tracking session stopped"
        );

        SessionSummary {
            identity: self.shared.identity.clone(),
            stats,
            drain,
        }
    }

    fn handle_event(&self, event: SourceEvent) {
        match event {
            SourceEvent::Sample(sample) => {
                self.shared.counters.samples.fetch_add(1, Ordering::Relaxed);

                if let Some(geofences) = &self.geofences {
                    let result = classify(sample.point(), &geofences.current());
                    tracing::debug!(
                        point = %result.point,
                        zones = result.containing_zones.len(),
                        highest_risk = ?result.highest_risk,
                        snapshot_version = result.snapshot_version,
                        "Sample classified"
                    );
                    self.shared.record_classification(result);
                }

                self.shared.queue.enqueue(sample);
            }
            SourceEvent::Degraded(reason) => {
                if transition(&self.state, SessionEvent::PermissionRevoked) {
                    self.shared
                        .counters
                        .degradations
                        .fetch_add(1, Ordering::Relaxed);
                    tracing::warn!(%reason, "Tracking session degraded");
                }
            }
            SourceEvent::Restored => {
                transition(&self.state, SessionEvent::PermissionRestored);
            }
        }
    }

    /// Samples produced before the registration was cancelled are still
    /// queued; capability signals no longer matter.
    fn forward_on_stop(&self, event: SourceEvent) {
        if let SourceEvent::Sample(sample) = event {
            self.shared.counters.samples.fetch_add(1, Ordering::Relaxed);
            self.shared.queue.enqueue(sample);
        }
    }

    fn log_status(&self) {
        let stats = self.shared.stats();
        let last = self
            .shared
            .last_classification
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone();

        tracing::debug!(
            state = %stats.state,
            samples = stats.samples,
            pending = stats.delivery.pending,
            delivered = stats.delivery.delivered,
            dropped = stats.delivery.dropped,
            position = ?last.as_ref().map(|c| c.point.to_string()),
            highest_risk = ?last.as_ref().and_then(|c| c.highest_risk),
            "Tracking session status"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::delivery::DeliveryError;
    use crate::geofence::{GeoPoint, Geofence, GeofenceSnapshot, RiskLevel};
    use crate::location::{
        BackgroundCapability, FixedPositionProvider, LocationSample, PollingLocationSource,
        PositionProvider, ProviderError,
    };
    use crate::location::AccuracyTier;
    use std::sync::atomic::{AtomicBool, AtomicU32};

    #[derive(Default)]
    struct RecordingUplink {
        sent: Mutex<Vec<LocationSample>>,
    }

    impl LocationUplink for RecordingUplink {
        async fn send_location(
            &self,
            _identity: &IdentityToken,
            sample: &LocationSample,
        ) -> Result<(), DeliveryError> {
            self.sent.lock().unwrap().push(sample.clone());
            Ok(())
        }
    }

    /// Capability can be toggled from the test.
    struct ToggleProvider {
        degraded: AtomicBool,
        calls: AtomicU32,
    }

    impl PositionProvider for ToggleProvider {
        async fn current_fix(&self, _accuracy: AccuracyTier) -> Result<LocationSample, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(LocationSample::now(28.0, 77.0))
        }

        fn background_capability(&self) -> BackgroundCapability {
            if self.degraded.load(Ordering::SeqCst) {
                BackgroundCapability::Degraded("battery saver".to_string())
            } else {
                BackgroundCapability::Guaranteed
            }
        }
    }

    fn config() -> SessionConfig {
        let sampling = SamplingConfig::new(
            AccuracyTier::Balanced,
            Duration::from_secs(1),
            Duration::from_secs(1),
        );
        SessionConfig {
            delivery: DeliveryConfig::for_sampling(&sampling),
            sampling,
            local_classification: true,
            status_interval: Duration::from_secs(30),
        }
    }

    fn token() -> IdentityToken {
        IdentityToken::parse("T-42").unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_session_forwards_and_classifies_samples() {
        let source = Arc::new(PollingLocationSource::new(FixedPositionProvider::new(28.0, 77.0)));
        let uplink = Arc::new(RecordingUplink::default());
        let zones = GeofenceSnapshot::new(
            3,
            vec![Geofence::circle(
                "z1",
                "Fort",
                RiskLevel::High,
                GeoPoint::new(28.0, 77.0),
                1000.0,
            )],
        );
        let controller = TrackingSessionController::new(Arc::clone(&source), Arc::clone(&uplink), config())
            .with_geofences(Arc::new(zones));

        let handle = controller.start(token()).await.unwrap();
        let mut classifications = handle.subscribe_classifications();
        assert_eq!(handle.state(), SessionState::Running);

        let first = classifications.recv().await.unwrap();
        assert_eq!(first.highest_risk, Some(RiskLevel::High));
        assert_eq!(first.snapshot_version, 3);

        tokio::time::sleep(Duration::from_millis(3500)).await;
        let summary = handle.stop().await.unwrap();

        assert_eq!(handle.state(), SessionState::Idle);
        assert_eq!(source.active_registrations(), 0);
        assert!(summary.stats.samples >= 3);
        assert_eq!(summary.stats.delivery.pending, 0);
        assert_eq!(
            summary.stats.delivery.delivered + summary.stats.delivery.dropped,
            summary.stats.samples
        );
        assert_eq!(uplink.sent.lock().unwrap().len() as u64, summary.stats.delivery.delivered);
        assert!(handle.last_classification().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_is_idempotent() {
        let source = Arc::new(PollingLocationSource::new(FixedPositionProvider::new(0.0, 0.0)));
        let controller =
            TrackingSessionController::new(source, Arc::new(RecordingUplink::default()), config());

        let handle = controller.start(token()).await.unwrap();
        let clone = handle.clone();
        let first = handle.stop().await.unwrap();
        let second = clone.stop().await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_status_interval_runs() {
        let source = Arc::new(PollingLocationSource::new(FixedPositionProvider::new(0.0, 0.0)));
        let config = SessionConfig {
            status_interval: Duration::ZERO,
            ..config()
        };
        let controller =
            TrackingSessionController::new(source, Arc::new(RecordingUplink::default()), config);

        let handle = controller.start(token()).await.unwrap();
        tokio::time::sleep(Duration::from_millis(2500)).await;
        assert_eq!(handle.state(), SessionState::Running);

        let summary = handle.stop().await.unwrap();
        assert!(summary.stats.samples >= 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_failure_leaves_no_session() {
        let source = Arc::new(PollingLocationSource::new(FixedPositionProvider::new(0.0, 0.0)));
        let controller = TrackingSessionController::new(
            Arc::clone(&source),
            Arc::new(RecordingUplink::default()),
            config(),
        );

        let running = controller.start(token()).await.unwrap();
        let second = controller.start(token()).await;
        assert!(matches!(
            second,
            Err(SessionError::Source(crate::location::SourceError::AlreadyRegistered))
        ));

        running.stop().await.unwrap();
        assert_eq!(source.active_registrations(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_degradation_and_restore() {
        let provider = Arc::new(ToggleProvider {
            degraded: AtomicBool::new(false),
            calls: AtomicU32::new(0),
        });
        let source = Arc::new(PollingLocationSource::from_shared(Arc::clone(&provider)));
        let controller =
            TrackingSessionController::new(source, Arc::new(RecordingUplink::default()), config());

        let handle = controller.start(token()).await.unwrap();
        let mut state = handle.watch_state();

        provider.degraded.store(true, Ordering::SeqCst);
        state.wait_for(|s| *s == SessionState::Degraded).await.unwrap();

        provider.degraded.store(false, Ordering::SeqCst);
        state.wait_for(|s| *s == SessionState::Running).await.unwrap();

        let summary = handle.stop().await.unwrap();
        assert_eq!(summary.stats.degradations, 1);
        assert_eq!(summary.stats.state, SessionState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_classification_disabled() {
        let source = Arc::new(PollingLocationSource::new(FixedPositionProvider::new(28.0, 77.0)));
        let mut cfg = config();
        cfg.local_classification = false;
        let controller = TrackingSessionController::new(source, Arc::new(RecordingUplink::default()), cfg)
            .with_geofences(Arc::new(GeofenceSnapshot::empty()));

        let handle = controller.start(token()).await.unwrap();
        tokio::time::sleep(Duration::from_millis(2500)).await;
        let summary = handle.stop().await.unwrap();

        assert!(summary.stats.samples > 0);
        assert_eq!(summary.stats.classifications, 0);
        assert!(handle.last_classification().is_none());
    }
}
