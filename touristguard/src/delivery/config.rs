//! Delivery retry and retention settings.

use std::time::Duration;

use crate::location::SamplingConfig;

/// Default cap on retry backoff (1 hour).
pub const DEFAULT_MAX_BACKOFF: Duration = Duration::from_secs(3600);

/// Default number of pending envelopes kept before coalescing.
pub const DEFAULT_RETENTION_CEILING: usize = 32;

/// Default time allowed to drain the backlog when a session stops.
pub const DEFAULT_DRAIN_TIMEOUT: Duration = Duration::from_secs(10);

/// Configuration for the Delivery Queue & Uplink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryConfig {
    /// Minimum spacing between two attempts on the same envelope.
    ///
    /// Defaults to the sample interval so retries are never faster than new
    /// samples arrive.
    pub min_retry_interval: Duration,
    /// Upper bound on a single backoff delay.
    pub max_backoff: Duration,
    /// Maximum pending envelopes; older ones are coalesced away beyond this.
    pub retention_ceiling: usize,
    /// How long stop waits for the backlog to drain before discarding.
    pub drain_timeout: Duration,
}

impl DeliveryConfig {
    /// Defaults with the retry floor tied to the sampling cadence.
    pub fn for_sampling(sampling: &SamplingConfig) -> Self {
        Self {
            min_retry_interval: sampling.sample_interval,
            ..Self::default()
        }
    }

    /// Effective backoff cap, never below the retry floor.
    pub fn backoff_cap(&self) -> Duration {
        self.max_backoff.max(self.min_retry_interval)
    }
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            min_retry_interval: crate::location::DEFAULT_SAMPLE_INTERVAL,
            max_backoff: DEFAULT_MAX_BACKOFF,
            retention_ceiling: DEFAULT_RETENTION_CEILING,
            drain_timeout: DEFAULT_DRAIN_TIMEOUT,
        }
    }
}
