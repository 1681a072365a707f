//! Delivery worker - flushes the queue through the uplink.
//!
//! Enqueue and flush are decoupled: samples land in the [`DeliveryQueue`]
//! from the session task, while [`DeliveryDispatcher::run`] wakes on new
//! samples or on the next retry deadline and performs the network I/O. A
//! slow collector therefore never delays sample acquisition.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use super::queue::{Completion, DeliveryQueue};
use super::uplink::LocationUplink;

/// Result of one flush pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlushReport {
    pub attempted: usize,
    pub delivered: usize,
    pub retrying: usize,
    pub discarded: usize,
    /// Envelopes returned unsent because the pass was cut off.
    pub abandoned: usize,
}

impl FlushReport {
    fn record(&mut self, completion: Completion) {
        match completion {
            Completion::Delivered => self.delivered += 1,
            Completion::Retrying { .. } => self.retrying += 1,
            Completion::Discarded => self.discarded += 1,
            Completion::Unknown => {}
        }
    }
}

/// Result of draining the backlog at session stop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrainReport {
    /// Envelopes acknowledged while draining.
    pub delivered: usize,
    /// Envelopes dropped because the drain window closed.
    pub discarded: usize,
}

/// Sends queued envelopes to the remote collector.
pub struct DeliveryDispatcher<U> {
    queue: Arc<DeliveryQueue>,
    uplink: Arc<U>,
    /// Serialises flush passes so an envelope has one attempt at a time.
    flush_lock: tokio::sync::Mutex<()>,
}

impl<U: LocationUplink + 'static> DeliveryDispatcher<U> {
    pub fn new(queue: Arc<DeliveryQueue>, uplink: Arc<U>) -> Self {
        Self {
            queue,
            uplink,
            flush_lock: tokio::sync::Mutex::new(()),
        }
    }

    pub fn queue(&self) -> &Arc<DeliveryQueue> {
        &self.queue
    }

    /// Attempt delivery of every envelope that is due now.
    ///
    /// Envelopes still inside their backoff window are left for a later
    /// pass. Each outcome is recorded on the queue as it arrives.
    pub async fn flush(&self) -> FlushReport {
        self.flush_bounded(None, None).await
    }

    /// Flush, giving up once `deadline` passes or `cancellation` fires.
    ///
    /// The send in progress at the cut-off is dropped and it, along with
    /// every envelope not yet attempted, goes back to the queue unchanged.
    async fn flush_bounded(
        &self,
        deadline: Option<Instant>,
        cancellation: Option<&CancellationToken>,
    ) -> FlushReport {
        let _guard = self.flush_lock.lock().await;
        let mut due = self.queue.take_due(Instant::now()).into_iter();
        let mut report = FlushReport::default();

        while let Some(envelope) = due.next() {
            let outcome = tokio::select! {
                biased;
                _ = cut_off(deadline, cancellation) => None,
                outcome = self.uplink.send_location(&envelope.identity, &envelope.sample) => Some(outcome),
            };

            match outcome {
                Some(outcome) => {
                    report.attempted += 1;
                    report.record(self.queue.complete(envelope.id, outcome, Instant::now()));
                }
                None => {
                    for abandoned in std::iter::once(envelope).chain(due.by_ref()) {
                        self.queue.release(abandoned.id);
                        report.abandoned += 1;
                    }
                }
            }
        }

        if report.attempted > 0 || report.abandoned > 0 {
            tracing::debug!(
                attempted = report.attempted,
                delivered = report.delivered,
                retrying = report.retrying,
                discarded = report.discarded,
                abandoned = report.abandoned,
                pending = self.queue.pending(),
                "Delivery flush complete"
            );
        }
        report
    }

    /// Flush on every new sample and retry deadline until cancelled.
    ///
    /// A send in progress when `cancellation` fires is abandoned and its
    /// envelope stays queued for [`drain`](Self::drain).
    pub async fn run(&self, cancellation: CancellationToken) {
        tracing::debug!(identity = %self.queue.identity(), "Delivery worker started");

        loop {
            self.flush_bounded(None, Some(&cancellation)).await;
            if cancellation.is_cancelled() {
                break;
            }

            let next_due = self.queue.next_due_at();
            tokio::select! {
                _ = self.queue.notified() => {}
                _ = sleep_until_due(next_due) => {}
                _ = cancellation.cancelled() => break,
            }
        }

        tracing::debug!("Delivery worker stopped");
    }

    /// Spawn [`run`](Self::run) as a task.
    pub fn spawn(self: Arc<Self>, cancellation: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move { self.run(cancellation).await })
    }

    /// Deliver what can be delivered within `timeout`, then discard the rest.
    ///
    /// Backoff is still honoured: an envelope whose next attempt falls after
    /// the deadline is discarded rather than retried early. A send still
    /// outstanding at the deadline is abandoned. Every discarded envelope is
    /// counted as dropped.
    pub async fn drain(&self, timeout: Duration) -> DrainReport {
        let deadline = Instant::now() + timeout;
        let mut report = DrainReport::default();

        loop {
            report.delivered += self.flush_bounded(Some(deadline), None).await.delivered;

            if self.queue.is_empty() || Instant::now() >= deadline {
                break;
            }
            match self.queue.next_due_at() {
                Some(next) if next <= deadline => tokio::time::sleep_until(next).await,
                _ => break,
            }
        }

        report.discarded = self.queue.discard_all();
        if report.discarded > 0 {
            tracing::warn!(
                discarded = report.discarded,
                timeout_secs = timeout.as_secs(),
                "Delivery backlog not drained in time, dropped remaining reports"
            );
        }
        report
    }
}

async fn sleep_until_due(next_due: Option<Instant>) {
    match next_due {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

/// Completes at `deadline` or when `cancellation` fires, whichever is first.
async fn cut_off(deadline: Option<Instant>, cancellation: Option<&CancellationToken>) {
    let cancelled = async {
        match cancellation {
            Some(token) => token.cancelled().await,
            None => std::future::pending().await,
        }
    };

    tokio::select! {
        _ = sleep_until_due(deadline) => {}
        _ = cancelled => {}
    }
}
