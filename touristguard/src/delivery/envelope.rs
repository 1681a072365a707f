//! Delivery Envelope - a sample with retry bookkeeping.

use tokio::time::Instant;

use crate::identity::IdentityToken;
use crate::location::LocationSample;

/// A queued location report awaiting acknowledgment.
#[derive(Debug, Clone, PartialEq)]
pub struct DeliveryEnvelope {
    /// Queue-assigned identifier, unique per queue.
    pub id: u64,
    /// Identity the report is delivered for.
    pub identity: IdentityToken,
    /// The report payload.
    pub sample: LocationSample,
    /// Failed attempts so far.
    pub attempt: u32,
    /// When the envelope was queued.
    pub enqueued_at: Instant,
    /// Earliest time the next attempt may start.
    pub next_attempt_at: Instant,
    /// True while an attempt is outstanding.
    pub(crate) in_flight: bool,
}

impl DeliveryEnvelope {
    pub(crate) fn new(id: u64, identity: IdentityToken, sample: LocationSample, now: Instant) -> Self {
        Self {
            id,
            identity,
            sample,
            attempt: 0,
            enqueued_at: now,
            next_attempt_at: now,
            in_flight: false,
        }
    }

    /// Returns true if an attempt may start at `now`.
    pub fn is_due(&self, now: Instant) -> bool {
        !self.in_flight && self.next_attempt_at <= now
    }

    /// Returns true while an attempt is outstanding.
    pub fn is_in_flight(&self) -> bool {
        self.in_flight
    }
}
