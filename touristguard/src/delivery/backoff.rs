//! Exponential retry backoff.

use std::time::Duration;

use super::config::DeliveryConfig;

/// Delay before retry number `attempt` (1-based count of failed attempts).
///
/// `min_retry_interval * 2^(attempt - 1)`, capped at
/// [`DeliveryConfig::backoff_cap`] and never below `min_retry_interval`.
pub fn retry_delay(attempt: u32, config: &DeliveryConfig) -> Duration {
    let floor = config.min_retry_interval;
    let exponent = attempt.saturating_sub(1).min(31);
    let factor = 1u32 << exponent;

    floor
        .checked_mul(factor)
        .unwrap_or(Duration::MAX)
        .min(config.backoff_cap())
        .max(floor)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(min_secs: u64, max_secs: u64) -> DeliveryConfig {
        DeliveryConfig {
            min_retry_interval: Duration::from_secs(min_secs),
            max_backoff: Duration::from_secs(max_secs),
            ..DeliveryConfig::default()
        }
    }

    #[test]
    fn test_doubles_from_floor() {
        let config = config(10, 3600);
        assert_eq!(retry_delay(1, &config), Duration::from_secs(10));
        assert_eq!(retry_delay(2, &config), Duration::from_secs(20));
        assert_eq!(retry_delay(3, &config), Duration::from_secs(40));
        assert_eq!(retry_delay(5, &config), Duration::from_secs(160));
    }

    #[test]
    fn test_capped_at_max_backoff() {
        let config = config(600, 3600);
        assert_eq!(retry_delay(3, &config), Duration::from_secs(2400));
        assert_eq!(retry_delay(4, &config), Duration::from_secs(3600));
        assert_eq!(retry_delay(40, &config), Duration::from_secs(3600));
    }

    #[test]
    fn test_never_below_floor_even_with_small_cap() {
        let config = config(600, 60);
        for attempt in 0..10 {
            assert_eq!(retry_delay(attempt, &config), Duration::from_secs(600));
        }
    }

    #[test]
    fn test_consecutive_delays_never_shrink() {
        let config = config(7, 1000);
        let mut previous = Duration::ZERO;
        for attempt in 1..64 {
            let delay = retry_delay(attempt, &config);
            assert!(delay >= config.min_retry_interval);
            assert!(delay >= previous);
            previous = delay;
        }
    }
}
