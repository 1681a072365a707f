//! Delivery Queue - buffered envelopes with retry bookkeeping.
//!
//! [`DeliveryQueue::enqueue`] never blocks on the network and never fails:
//! it appends an envelope under a short lock and wakes the dispatcher. The
//! dispatcher takes due envelopes with [`DeliveryQueue::take_due`], which
//! marks them in flight so no envelope ever has two outstanding attempts,
//! and reports each outcome back through [`DeliveryQueue::complete`].
//!
//! # Retention
//!
//! When more than `retention_ceiling` envelopes are pending, the oldest ones
//! that are not in flight are coalesced away so the newest samples survive.
//! Every discarded envelope increments the dropped counter.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use tokio::sync::futures::Notified;
use tokio::sync::Notify;
use tokio::time::Instant;

use super::backoff::retry_delay;
use super::config::DeliveryConfig;
use super::envelope::DeliveryEnvelope;
use super::error::DeliveryError;
use crate::identity::IdentityToken;
use crate::location::LocationSample;

/// Point-in-time delivery counters.
///
/// `enqueued == delivered + dropped + pending` holds at every snapshot:
/// counters change under the same lock as the backlog and [`DeliveryQueue::stats`]
/// reads them under it. `dropped` includes permanent failures.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliveryStats {
    /// Samples accepted by `enqueue`.
    pub enqueued: u64,
    /// Envelopes acknowledged by the collector.
    pub delivered: u64,
    /// Transient failures that were rescheduled.
    pub retried: u64,
    /// Envelopes discarded without acknowledgment.
    pub dropped: u64,
    /// Envelopes discarded because the collector rejected them.
    pub permanent_failures: u64,
    /// Envelopes still queued (including in flight).
    pub pending: usize,
}

#[derive(Debug, Default)]
struct Counters {
    enqueued: AtomicU64,
    delivered: AtomicU64,
    retried: AtomicU64,
    dropped: AtomicU64,
    permanent_failures: AtomicU64,
}

#[derive(Debug, Default)]
struct Backlog {
    pending: VecDeque<DeliveryEnvelope>,
    next_id: u64,
}

/// What happened to an envelope after [`DeliveryQueue::complete`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    Delivered,
    /// Rescheduled; the envelope has failed `attempt` times.
    Retrying { attempt: u32 },
    Discarded,
    /// The envelope was no longer queued.
    Unknown,
}

/// Per-identity buffer of location reports awaiting delivery.
#[derive(Debug)]
pub struct DeliveryQueue {
    identity: IdentityToken,
    config: DeliveryConfig,
    backlog: Mutex<Backlog>,
    notify: Notify,
    counters: Counters,
}

impl DeliveryQueue {
    /// Create an empty queue for `identity`.
    pub fn new(identity: IdentityToken, config: DeliveryConfig) -> Self {
        Self {
            identity,
            config,
            backlog: Mutex::new(Backlog::default()),
            notify: Notify::new(),
            counters: Counters::default(),
        }
    }

    /// Identity every envelope in this queue is delivered for.
    pub fn identity(&self) -> &IdentityToken {
        &self.identity
    }

    pub fn config(&self) -> &DeliveryConfig {
        &self.config
    }

    /// Queue a sample for delivery. Returns the envelope id.
    pub fn enqueue(&self, sample: LocationSample) -> u64 {
        let now = Instant::now();
        let (id, coalesced, pending) = {
            let mut backlog = self.lock();
            let id = backlog.next_id;
            backlog.next_id += 1;
            backlog
                .pending
                .push_back(DeliveryEnvelope::new(id, self.identity.clone(), sample, now));

            let coalesced = coalesce(&mut backlog.pending, self.config.retention_ceiling);
            self.counters.enqueued.fetch_add(1, Ordering::Relaxed);
            self.counters
                .dropped
                .fetch_add(coalesced as u64, Ordering::Relaxed);
            (id, coalesced, backlog.pending.len())
        };

        if coalesced > 0 {
            tracing::warn!(
                coalesced,
                retention_ceiling = self.config.retention_ceiling,
                "Delivery backlog over retention ceiling, dropped oldest reports"
            );
        }

        tracing::trace!(id, pending, "Location report queued");
        self.notify.notify_one();
        id
    }

    /// Take every envelope due at `now`, in enqueue order, marking each in
    /// flight. Returned envelopes must be reported back via [`complete`](Self::complete).
    pub fn take_due(&self, now: Instant) -> Vec<DeliveryEnvelope> {
        let mut backlog = self.lock();
        backlog
            .pending
            .iter_mut()
            .filter(|envelope| envelope.is_due(now))
            .map(|envelope| {
                envelope.in_flight = true;
                envelope.clone()
            })
            .collect()
    }

    /// Record the outcome of an attempt on envelope `id`.
    pub fn complete(&self, id: u64, outcome: Result<(), DeliveryError>, now: Instant) -> Completion {
        let mut backlog = self.lock();
        let Some(index) = backlog.pending.iter().position(|e| e.id == id) else {
            return Completion::Unknown;
        };

        match outcome {
            Ok(()) => {
                backlog.pending.remove(index);
                self.counters.delivered.fetch_add(1, Ordering::Relaxed);
                Completion::Delivered
            }
            Err(DeliveryError::Transient(reason)) => {
                let envelope = &mut backlog.pending[index];
                envelope.in_flight = false;
                envelope.attempt = envelope.attempt.saturating_add(1);
                let delay = retry_delay(envelope.attempt, &self.config);
                envelope.next_attempt_at = now + delay;
                self.counters.retried.fetch_add(1, Ordering::Relaxed);

                tracing::warn!(
                    id,
                    attempt = envelope.attempt,
                    retry_in_secs = delay.as_secs(),
                    %reason,
                    "Location delivery failed, will retry"
                );
                Completion::Retrying {
                    attempt: envelope.attempt,
                }
            }
            Err(DeliveryError::Permanent { status, message }) => {
                backlog.pending.remove(index);
                self.counters
                    .permanent_failures
                    .fetch_add(1, Ordering::Relaxed);
                self.counters.dropped.fetch_add(1, Ordering::Relaxed);

                tracing::warn!(id, status, %message, "Location report rejected, discarded");
                Completion::Discarded
            }
        }
    }

    /// Return an in-flight envelope to the backlog without counting an attempt.
    ///
    /// Used when an attempt is abandoned before the collector answered. The
    /// envelope keeps its schedule and is picked up by the next flush.
    pub fn release(&self, id: u64) -> bool {
        let mut backlog = self.lock();
        match backlog.pending.iter_mut().find(|e| e.id == id) {
            Some(envelope) => {
                envelope.in_flight = false;
                true
            }
            None => false,
        }
    }

    /// Earliest time a pending, not-in-flight envelope becomes due.
    pub fn next_due_at(&self) -> Option<Instant> {
        self.lock()
            .pending
            .iter()
            .filter(|e| !e.in_flight)
            .map(|e| e.next_attempt_at)
            .min()
    }

    /// Discard every queued envelope, counting each as dropped.
    pub fn discard_all(&self) -> usize {
        let mut backlog = self.lock();
        let discarded = backlog.pending.len();
        backlog.pending.clear();
        self.counters
            .dropped
            .fetch_add(discarded as u64, Ordering::Relaxed);
        discarded
    }

    /// Envelopes still queued, including those in flight.
    pub fn pending(&self) -> usize {
        self.lock().pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending() == 0
    }

    /// Snapshot of the queued envelopes, oldest first.
    pub fn envelopes(&self) -> Vec<DeliveryEnvelope> {
        self.lock().pending.iter().cloned().collect()
    }

    /// Current counters.
    pub fn stats(&self) -> DeliveryStats {
        let backlog = self.lock();
        DeliveryStats {
            enqueued: self.counters.enqueued.load(Ordering::Relaxed),
            delivered: self.counters.delivered.load(Ordering::Relaxed),
            retried: self.counters.retried.load(Ordering::Relaxed),
            dropped: self.counters.dropped.load(Ordering::Relaxed),
            permanent_failures: self.counters.permanent_failures.load(Ordering::Relaxed),
            pending: backlog.pending.len(),
        }
    }

    /// Completes when a sample has been queued since the last wake-up.
    pub(crate) fn notified(&self) -> Notified<'_> {
        self.notify.notified()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Backlog> {
        self.backlog.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Drop the oldest not-in-flight envelopes until at most `ceiling` remain.
///
/// The newest envelope is never dropped. If everything older is in flight
/// the backlog stays over the ceiling until those attempts complete.
fn coalesce(pending: &mut VecDeque<DeliveryEnvelope>, ceiling: usize) -> usize {
    let ceiling = ceiling.max(1);
    let mut removed = 0;
    while pending.len() > ceiling {
        let older = pending.len() - 1;
        match pending.iter().take(older).position(|e| !e.in_flight) {
            Some(index) => {
                pending.remove(index);
                removed += 1;
            }
            None => break,
        }
    }
    removed
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn queue(ceiling: usize) -> DeliveryQueue {
        DeliveryQueue::new(
            IdentityToken::parse("T-1").unwrap(),
            DeliveryConfig {
                min_retry_interval: Duration::from_secs(10),
                max_backoff: Duration::from_secs(100),
                retention_ceiling: ceiling,
                drain_timeout: Duration::from_secs(1),
            },
        )
    }

    fn sample(n: u32) -> LocationSample {
        LocationSample::now(n as f64, 0.0)
    }

    fn assert_balanced(stats: DeliveryStats) {
        assert_eq!(
            stats.enqueued,
            stats.delivered + stats.dropped + stats.pending as u64,
            "{:?}",
            stats
        );
    }

    #[tokio::test]
    async fn test_enqueue_then_deliver() {
        let q = queue(8);
        let id = q.enqueue(sample(1));

        let due = q.take_due(Instant::now());
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].identity.as_str(), "T-1");

        assert_eq!(q.complete(id, Ok(()), Instant::now()), Completion::Delivered);
        assert!(q.is_empty());

        let stats = q.stats();
        assert_eq!(stats.delivered, 1);
        assert_balanced(stats);
    }

    #[tokio::test]
    async fn test_in_flight_envelope_is_not_taken_twice() {
        let q = queue(8);
        q.enqueue(sample(1));

        let now = Instant::now();
        assert_eq!(q.take_due(now).len(), 1);
        assert!(q.take_due(now).is_empty());
        assert!(q.next_due_at().is_none());
    }

    #[tokio::test]
    async fn test_transient_failure_reschedules_with_floor() {
        let q = queue(8);
        let id = q.enqueue(sample(1));
        let now = Instant::now();
        q.take_due(now);

        let result = q.complete(id, Err(DeliveryError::Transient("offline".into())), now);
        assert_eq!(result, Completion::Retrying { attempt: 1 });

        // Not due before the minimum retry interval
        assert!(q.take_due(now + Duration::from_secs(9)).is_empty());
        let due = q.take_due(now + Duration::from_secs(10));
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].attempt, 1);

        let later = now + Duration::from_secs(10);
        q.complete(id, Err(DeliveryError::Transient("offline".into())), later);
        assert_eq!(q.next_due_at(), Some(later + Duration::from_secs(20)));
        assert_eq!(q.stats().retried, 2);
    }

    #[tokio::test]
    async fn test_permanent_failure_discards_and_counts() {
        let q = queue(8);
        let id = q.enqueue(sample(1));
        q.take_due(Instant::now());

        let result = q.complete(
            id,
            Err(DeliveryError::Permanent {
                status: 400,
                message: "bad request".into(),
            }),
            Instant::now(),
        );
        assert_eq!(result, Completion::Discarded);

        let stats = q.stats();
        assert_eq!(stats.permanent_failures, 1);
        assert_eq!(stats.dropped, 1);
        assert_eq!(stats.pending, 0);
        assert_balanced(stats);
    }

    #[tokio::test]
    async fn test_coalescing_keeps_newest() {
        let q = queue(3);
        for n in 0..5 {
            q.enqueue(sample(n));
        }

        let kept: Vec<f64> = q.envelopes().iter().map(|e| e.sample.latitude).collect();
        assert_eq!(kept, vec![2.0, 3.0, 4.0]);

        let stats = q.stats();
        assert_eq!(stats.dropped, 2);
        assert_balanced(stats);
    }

    #[tokio::test]
    async fn test_coalescing_skips_in_flight() {
        let q = queue(2);
        q.enqueue(sample(0));
        q.enqueue(sample(1));
        q.take_due(Instant::now());

        // Both older envelopes are in flight: nothing is dropped yet
        q.enqueue(sample(2));
        assert_eq!(q.pending(), 3);
        assert_eq!(q.stats().dropped, 0);

        // Once an attempt fails, the next enqueue can coalesce it away
        q.complete(0, Err(DeliveryError::Transient("offline".into())), Instant::now());
        q.enqueue(sample(3));
        let kept: Vec<f64> = q.envelopes().iter().map(|e| e.sample.latitude).collect();
        assert_eq!(kept, vec![1.0, 3.0]);
        assert_eq!(q.stats().dropped, 2);
    }

    #[tokio::test]
    async fn test_discard_all_counts_dropped() {
        let q = queue(8);
        q.enqueue(sample(0));
        q.enqueue(sample(1));

        assert_eq!(q.discard_all(), 2);
        let stats = q.stats();
        assert_eq!(stats.dropped, 2);
        assert_balanced(stats);
    }

    #[tokio::test]
    async fn test_complete_unknown_id() {
        let q = queue(8);
        assert_eq!(q.complete(99, Ok(()), Instant::now()), Completion::Unknown);
    }

    #[tokio::test]
    async fn test_release_returns_envelope_without_attempt() {
        let q = queue(8);
        let id = q.enqueue(sample(1));
        assert_eq!(q.take_due(Instant::now()).len(), 1);
        assert!(q.take_due(Instant::now()).is_empty());

        assert!(q.release(id));
        let again = q.take_due(Instant::now());
        assert_eq!(again.len(), 1);
        assert_eq!(again[0].attempt, 0);
        assert_eq!(q.stats().retried, 0);
        assert!(!q.release(99));
    }

    #[test]
    fn test_stats_balanced_under_concurrent_enqueue() {
        let q = std::sync::Arc::new(queue(4));
        let writers: Vec<_> = (0..4)
            .map(|_| {
                let q = std::sync::Arc::clone(&q);
                std::thread::spawn(move || {
                    for n in 0..500 {
                        q.enqueue(sample(n));
                    }
                })
            })
            .collect();

        while writers.iter().any(|w| !w.is_finished()) {
            assert_balanced(q.stats());
        }
        for writer in writers {
            writer.join().unwrap();
        }

        let stats = q.stats();
        assert_eq!(stats.enqueued, 2000);
        assert_eq!(stats.pending, 4);
        assert_balanced(stats);
    }
}
