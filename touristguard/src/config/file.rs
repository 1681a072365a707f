//! Configuration file handling for ~/.touristguard/config.ini.
//!
//! Loads and saves user configuration with sensible defaults.
//! Settings structs live in [`super::settings`], constants in [`super::defaults`],
//! parsing in [`super::parser`], and serialization in [`super::writer`].

use std::path::{Path, PathBuf};
use std::time::Duration;

use ini::Ini;
use thiserror::Error;

use super::settings::ConfigFile;
use crate::activation::ActivationOptions;
use crate::delivery::DeliveryConfig;
use crate::geofence::GeofenceStoreConfig;
use crate::location::SamplingConfig;
use crate::remote::ApiConfig;
use crate::session::{SessionConfig, DEFAULT_STATUS_INTERVAL};

/// Configuration file errors.
#[derive(Debug, Error)]
pub enum ConfigFileError {
    /// Failed to read config file
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] ini::Error),

    /// Failed to write config file
    #[error("Failed to write config file: {0}")]
    WriteError(String),

    /// Invalid configuration value
    #[error("Invalid configuration: {section}.{key} = '{value}' - {reason}")]
    InvalidValue {
        section: String,
        key: String,
        value: String,
        reason: String,
    },

    /// Failed to create config directory
    #[error("Failed to create config directory: {0}")]
    DirectoryError(std::io::Error),
}

impl ConfigFile {
    /// Load configuration from the default path (~/.touristguard/config.ini).
    pub fn load() -> Result<Self, ConfigFileError> {
        Self::load_from(&config_file_path())
    }

    /// Load configuration from a specific path.
    ///
    /// If the file doesn't exist, returns defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigFileError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let ini = Ini::load_from_file(path)?;
        super::parser::parse_ini(&ini)
    }

    /// Save configuration to a specific path.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigFileError> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(ConfigFileError::DirectoryError)?;
        }

        let content = super::writer::to_config_string(self);
        std::fs::write(path, content).map_err(|e| ConfigFileError::WriteError(e.to_string()))
    }

    /// Render the configuration as it would be written to disk.
    pub fn to_ini_string(&self) -> String {
        super::writer::to_config_string(self)
    }

    /// Sampling registration settings.
    pub fn to_sampling_config(&self) -> SamplingConfig {
        SamplingConfig::new(
            self.tracking.accuracy,
            Duration::from_secs(self.tracking.sample_interval),
            Duration::from_secs(self.tracking.deferred_interval),
        )
    }

    /// Delivery settings; the retry floor defaults to the sample interval.
    pub fn to_delivery_config(&self) -> DeliveryConfig {
        let min_retry_secs = self
            .delivery
            .min_retry_interval
            .unwrap_or(self.tracking.sample_interval);

        DeliveryConfig {
            min_retry_interval: Duration::from_secs(min_retry_secs),
            max_backoff: Duration::from_secs(self.delivery.max_backoff),
            retention_ceiling: self.delivery.retention_ceiling,
            drain_timeout: Duration::from_secs(self.delivery.drain_timeout),
        }
    }

    pub fn to_geofence_config(&self) -> GeofenceStoreConfig {
        GeofenceStoreConfig {
            refresh_interval: Duration::from_secs(self.geofence.refresh_interval),
        }
    }

    pub fn to_api_config(&self) -> ApiConfig {
        ApiConfig {
            base_url: self.api.base_url.clone(),
            timeout: Duration::from_secs(self.api.timeout),
        }
    }

    pub fn to_session_config(&self) -> SessionConfig {
        SessionConfig {
            sampling: self.to_sampling_config(),
            delivery: self.to_delivery_config(),
            local_classification: self.tracking.local_classification,
            status_interval: DEFAULT_STATUS_INTERVAL,
        }
    }

    pub fn to_activation_options(&self) -> ActivationOptions {
        ActivationOptions {
            validate_identity: self.api.validate_identity,
        }
    }
}

/// Get the path to the config directory (~/.touristguard).
pub fn config_directory() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".touristguard")
}

/// Get the path to the config file (~/.touristguard/config.ini).
pub fn config_file_path() -> PathBuf {
    config_directory().join("config.ini")
}
