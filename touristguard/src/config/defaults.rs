//! Default values and constants for all configuration settings.
//!
//! Contains all `DEFAULT_*` constants and the `ConfigFile::default()`
//! implementation.

use super::file::config_directory;
use super::settings::*;
use crate::delivery::{DEFAULT_DRAIN_TIMEOUT, DEFAULT_MAX_BACKOFF, DEFAULT_RETENTION_CEILING};
use crate::geofence::DEFAULT_REFRESH_INTERVAL;
use crate::location::{AccuracyTier, DEFAULT_DEFERRED_INTERVAL, DEFAULT_SAMPLE_INTERVAL};
use crate::remote::{DEFAULT_BASE_URL, DEFAULT_TIMEOUT};

/// Default API request timeout in seconds.
pub const DEFAULT_API_TIMEOUT_SECS: u64 = DEFAULT_TIMEOUT.as_secs();

/// Default sample interval in seconds (10 minutes).
pub const DEFAULT_SAMPLE_INTERVAL_SECS: u64 = DEFAULT_SAMPLE_INTERVAL.as_secs();

/// Default deferred delivery interval in seconds (10 minutes).
pub const DEFAULT_DEFERRED_INTERVAL_SECS: u64 = DEFAULT_DEFERRED_INTERVAL.as_secs();

/// Default maximum retry backoff in seconds (1 hour).
pub const DEFAULT_MAX_BACKOFF_SECS: u64 = DEFAULT_MAX_BACKOFF.as_secs();

/// Default stop-time drain window in seconds.
pub const DEFAULT_DRAIN_TIMEOUT_SECS: u64 = DEFAULT_DRAIN_TIMEOUT.as_secs();

/// Default geofence refresh interval in seconds (5 minutes).
pub const DEFAULT_REFRESH_INTERVAL_SECS: u64 = DEFAULT_REFRESH_INTERVAL.as_secs();

/// Default identity file name inside the config directory.
pub const DEFAULT_IDENTITY_FILE: &str = "identity";

/// Default log file name.
pub const DEFAULT_LOG_FILE: &str = "touristguard.log";

impl Default for ConfigFile {
    fn default() -> Self {
        let config_dir = config_directory();

        Self {
            api: ApiSettings {
                base_url: DEFAULT_BASE_URL.to_string(),
                timeout: DEFAULT_API_TIMEOUT_SECS,
                validate_identity: true,
            },
            tracking: TrackingSettings {
                accuracy: AccuracyTier::default(),
                sample_interval: DEFAULT_SAMPLE_INTERVAL_SECS,
                deferred_interval: DEFAULT_DEFERRED_INTERVAL_SECS,
                local_classification: true,
            },
            delivery: DeliverySettings {
                min_retry_interval: None,
                max_backoff: DEFAULT_MAX_BACKOFF_SECS,
                retention_ceiling: DEFAULT_RETENTION_CEILING,
                drain_timeout: DEFAULT_DRAIN_TIMEOUT_SECS,
            },
            geofence: GeofenceSettings {
                refresh_interval: DEFAULT_REFRESH_INTERVAL_SECS,
            },
            storage: StorageSettings {
                identity_file: config_dir.join(DEFAULT_IDENTITY_FILE),
            },
            logging: LoggingSettings {
                directory: config_dir.join("logs"),
                file: DEFAULT_LOG_FILE.to_string(),
            },
        }
    }
}
