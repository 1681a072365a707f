//! Settings structs for all configuration sections.
//!
//! Each struct represents one `[section]` of the INI config file.
//! These are pure data types with no parsing or serialization logic.

use std::path::PathBuf;

use crate::location::AccuracyTier;

/// Complete application configuration loaded from config.ini.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigFile {
    /// Remote API settings
    pub api: ApiSettings,
    /// Sampling cadence and local classification
    pub tracking: TrackingSettings,
    /// Retry and retention policy for location reports
    pub delivery: DeliverySettings,
    /// Geofence refresh settings
    pub geofence: GeofenceSettings,
    /// Durable local state
    pub storage: StorageSettings,
    /// Logging settings
    pub logging: LoggingSettings,
}

/// Remote API configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiSettings {
    /// API root URL
    pub base_url: String,
    /// Per-request timeout in seconds
    pub timeout: u64,
    /// Look the digital ID up before activating
    pub validate_identity: bool,
}

/// Tracking configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackingSettings {
    /// Positioning accuracy tier
    pub accuracy: AccuracyTier,
    /// Seconds between samples
    pub sample_interval: u64,
    /// Maximum seconds samples may be batched
    pub deferred_interval: u64,
    /// Classify samples against geofences on-device
    pub local_classification: bool,
}

/// Delivery configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliverySettings {
    /// Minimum seconds between retries; `None` follows `tracking.sample_interval`
    pub min_retry_interval: Option<u64>,
    /// Maximum backoff in seconds
    pub max_backoff: u64,
    /// Pending reports kept before the oldest are coalesced away
    pub retention_ceiling: usize,
    /// Seconds allowed to drain the backlog on stop
    pub drain_timeout: u64,
}

/// Geofence configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeofenceSettings {
    /// Seconds between zone refreshes
    pub refresh_interval: u64,
}

/// Storage configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageSettings {
    /// File holding the identity token
    pub identity_file: PathBuf,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingSettings {
    /// Log directory
    pub directory: PathBuf,
    /// Log file name within `directory`
    pub file: String,
}
