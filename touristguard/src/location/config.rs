//! Sampling configuration.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Default minimum time between samples (10 minutes).
pub const DEFAULT_SAMPLE_INTERVAL: Duration = Duration::from_secs(600);

/// Default maximum batching window before the platform must flush (10 minutes).
pub const DEFAULT_DEFERRED_INTERVAL: Duration = Duration::from_secs(600);

/// Positioning accuracy tier requested from the platform.
///
/// Mirrors the platform tiers; higher tiers cost more power.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum AccuracyTier {
    /// ~3km, lowest power.
    Lowest,
    /// ~1km.
    Low,
    /// ~100m, the default.
    #[default]
    Balanced,
    /// ~10m.
    High,
    /// Best the hardware can do.
    Highest,
    /// Highest accuracy plus sensor fusion for navigation.
    BestForNavigation,
}

impl AccuracyTier {
    /// Configuration identifier.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Lowest => "lowest",
            Self::Low => "low",
            Self::Balanced => "balanced",
            Self::High => "high",
            Self::Highest => "highest",
            Self::BestForNavigation => "best_for_navigation",
        }
    }
}

impl fmt::Display for AccuracyTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccuracyTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lowest" => Ok(Self::Lowest),
            "low" => Ok(Self::Low),
            "balanced" => Ok(Self::Balanced),
            "high" => Ok(Self::High),
            "highest" => Ok(Self::Highest),
            "best_for_navigation" => Ok(Self::BestForNavigation),
            other => Err(format!("unknown accuracy tier '{}'", other)),
        }
    }
}

/// Cadence and accuracy for a sampling registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SamplingConfig {
    /// Requested positioning accuracy.
    pub accuracy: AccuracyTier,
    /// Minimum time between samples.
    pub sample_interval: Duration,
    /// Maximum time samples may be batched before being flushed.
    ///
    /// Never shorter than `sample_interval`.
    pub deferred_interval: Duration,
}

impl SamplingConfig {
    /// Create a config, clamping `deferred_interval` to at least `sample_interval`.
    pub fn new(accuracy: AccuracyTier, sample_interval: Duration, deferred_interval: Duration) -> Self {
        let sample_interval = sample_interval.max(Duration::from_millis(1));
        Self {
            accuracy,
            sample_interval,
            deferred_interval: deferred_interval.max(sample_interval),
        }
    }

    /// Returns true if the platform may hold several samples before flushing.
    pub fn batches(&self) -> bool {
        self.deferred_interval > self.sample_interval
    }
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self::new(
            AccuracyTier::default(),
            DEFAULT_SAMPLE_INTERVAL,
            DEFAULT_DEFERRED_INTERVAL,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SamplingConfig::default();
        assert_eq!(config.accuracy, AccuracyTier::Balanced);
        assert_eq!(config.sample_interval, Duration::from_secs(600));
        assert_eq!(config.deferred_interval, Duration::from_secs(600));
        assert!(!config.batches());
    }

    #[test]
    fn test_deferred_never_shorter_than_sample() {
        let config = SamplingConfig::new(
            AccuracyTier::High,
            Duration::from_secs(60),
            Duration::from_secs(10),
        );
        assert_eq!(config.deferred_interval, Duration::from_secs(60));
    }

    #[test]
    fn test_accuracy_tier_round_trip_names() {
        for tier in [
            AccuracyTier::Lowest,
            AccuracyTier::Low,
            AccuracyTier::Balanced,
            AccuracyTier::High,
            AccuracyTier::Highest,
            AccuracyTier::BestForNavigation,
        ] {
            assert_eq!(tier.as_str().parse::<AccuracyTier>(), Ok(tier));
        }
        assert!("gps".parse::<AccuracyTier>().is_err());
    }
}
