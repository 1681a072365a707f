//! Interval-driven Location Sample Source.
//!
//! [`PollingLocationSource`] asks a [`PositionProvider`] for a fix every
//! `sample_interval` and forwards samples over the registration channel.
//! When `deferred_interval` is longer than the sample interval, samples are
//! held and flushed together once the oldest held sample is that old,
//! matching how platforms batch deferred background updates.
//!
//! # Degradation
//!
//! Each tick checks [`PositionProvider::background_capability`]. A degraded
//! capability or a revoked permission is reported once as
//! [`SourceEvent::Degraded`]; the next good fix after recovery is preceded by
//! [`SourceEvent::Restored`].

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use super::config::SamplingConfig;
use super::provider::{BackgroundCapability, PositionProvider, ProviderError};
use super::sample::LocationSample;
use super::source::{DegradeReason, LocationSource, Registration, SourceError, SourceEvent};

struct ActiveRegistration {
    cancellation: CancellationToken,
    handle: JoinHandle<()>,
}

/// A [`LocationSource`] that polls a position provider on an interval.
///
/// Stopping and starting again reuses the same provider, so permissions
/// granted before the first start are not requested again.
pub struct PollingLocationSource<P> {
    provider: Arc<P>,
    active: Mutex<Option<ActiveRegistration>>,
}

impl<P: PositionProvider + 'static> PollingLocationSource<P> {
    pub fn new(provider: P) -> Self {
        Self::from_shared(Arc::new(provider))
    }

    /// Create a source over a provider that is also used elsewhere.
    pub fn from_shared(provider: Arc<P>) -> Self {
        Self {
            provider,
            active: Mutex::new(None),
        }
    }

    /// The underlying provider.
    pub fn provider(&self) -> &Arc<P> {
        &self.provider
    }
}

impl<P: PositionProvider + 'static> LocationSource for PollingLocationSource<P> {
    async fn start_updates(
        &self,
        registration: Registration,
        events: mpsc::Sender<SourceEvent>,
    ) -> Result<(), SourceError> {
        let mut active = self.active.lock().unwrap_or_else(|e| e.into_inner());

        if let Some(existing) = active.as_ref() {
            if !existing.handle.is_finished() {
                return Err(SourceError::AlreadyRegistered);
            }
        }

        let cancellation = CancellationToken::new();
        let pump = SamplingPump {
            provider: Arc::clone(&self.provider),
            config: registration.config,
            events,
            cancellation: cancellation.clone(),
        };

        tracing::info!(
            identity = %registration.identity,
            accuracy = %pump.config.accuracy,
            sample_interval_secs = pump.config.sample_interval.as_secs(),
            deferred_interval_secs = pump.config.deferred_interval.as_secs(),
            "Location sampling registered"
        );

        let handle = tokio::spawn(pump.run());
        *active = Some(ActiveRegistration {
            cancellation,
            handle,
        });
        Ok(())
    }

    async fn stop_updates(&self) {
        let registration = self
            .active
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();

        if let Some(registration) = registration {
            registration.cancellation.cancel();
            if let Err(e) = registration.handle.await {
                tracing::warn!(error = %e, "Location sampling task ended abnormally");
            }
            tracing::info!("Location sampling unregistered");
        }
    }

    fn active_registrations(&self) -> usize {
        let active = self.active.lock().unwrap_or_else(|e| e.into_inner());
        match active.as_ref() {
            Some(registration) if !registration.handle.is_finished() => 1,
            _ => 0,
        }
    }
}

struct SamplingPump<P> {
    provider: Arc<P>,
    config: SamplingConfig,
    events: mpsc::Sender<SourceEvent>,
    cancellation: CancellationToken,
}

impl<P: PositionProvider> SamplingPump<P> {
    async fn run(self) {
        let period = self.config.sample_interval.max(Duration::from_millis(1));
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        let mut batch: Vec<LocationSample> = Vec::new();
        let mut batch_started: Option<Instant> = None;
        let mut degraded = false;

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = self.cancellation.cancelled() => break,
            }

            let capability = self.provider.background_capability();
            if let BackgroundCapability::Degraded(reason) = &capability {
                if !degraded {
                    degraded = true;
                    tracing::warn!(%reason, "Background sampling capability degraded");
                    if !self.emit(SourceEvent::Degraded(DegradeReason::BackgroundUnavailable(
                        reason.clone(),
                    )))
                    .await
                    {
                        break;
                    }
                }
            }

            let fix = tokio::select! {
                fix = self.provider.current_fix(self.config.accuracy) => fix,
                _ = self.cancellation.cancelled() => break,
            };

            match fix {
                Ok(sample) => {
                    if degraded && capability == BackgroundCapability::Guaranteed {
                        degraded = false;
                        tracing::info!("Location sampling capability restored");
                        if !self.emit(SourceEvent::Restored).await {
                            break;
                        }
                    }

                    tracing::debug!(
                        lat = sample.latitude,
                        lon = sample.longitude,
                        accuracy = ?sample.accuracy,
                        "Location sample acquired"
                    );
                    batch.push(sample);
                    let started = *batch_started.get_or_insert_with(Instant::now);

                    if batch_due(started, self.config.deferred_interval, self.config.sample_interval)
                        && !self.flush(&mut batch).await
                    {
                        break;
                    }
                    if batch.is_empty() {
                        batch_started = None;
                    }
                }
                Err(ProviderError::PermissionRevoked) => {
                    if !degraded {
                        degraded = true;
                        tracing::warn!("Location permission revoked, sampling degraded");
                        if !self.emit(SourceEvent::Degraded(DegradeReason::PermissionRevoked)).await {
                            break;
                        }
                    }
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to acquire location fix");
                }
            }
        }

        // Held samples were produced; hand over what the channel takes
        for sample in batch.drain(..) {
            if self.events.try_send(SourceEvent::Sample(sample)).is_err() {
                tracing::debug!("Location event channel unavailable, held samples dropped");
                break;
            }
        }
        tracing::debug!("Location sampling pump stopped");
    }

    async fn flush(&self, batch: &mut Vec<LocationSample>) -> bool {
        for sample in batch.drain(..) {
            if !self.emit(SourceEvent::Sample(sample)).await {
                return false;
            }
        }
        true
    }

    /// Send an event; returns false once the receiver is gone or the pump
    /// is cancelled while waiting for channel capacity.
    async fn emit(&self, event: SourceEvent) -> bool {
        tokio::select! {
            sent = self.events.send(event) => {
                if sent.is_err() {
                    tracing::debug!("Location event channel closed, stopping");
                    return false;
                }
                true
            }
            _ = self.cancellation.cancelled() => false,
        }
    }
}

/// A batch is flushed once its oldest sample has waited for the deferred
/// window, less one sample interval of scheduling slack.
fn batch_due(started: Instant, deferred: Duration, sample: Duration) -> bool {
    if deferred <= sample {
        return true;
    }
    started.elapsed() + sample >= deferred
}
