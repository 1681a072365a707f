//! CLI runner for common setup and operations.
//!
//! Encapsulates config loading, logging initialization and wiring of the
//! tracking components so each command handler stays short.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::info;
use touristguard::activation::ActivationController;
use touristguard::config::ConfigFile;
use touristguard::geofence::{spawn_refresh_loop, GeofenceStore};
use touristguard::identity::{FileIdentityStore, IdentityStore};
use touristguard::location::PollingLocationSource;
use touristguard::logging::{init_logging, LoggingGuard};
use touristguard::permissions::StaticPermissions;
use touristguard::remote::ApiClient;
use touristguard::session::TrackingSessionController;

use crate::commands::common::{HostProvider, PositionArgs};
use crate::error::CliError;

/// The activation controller as wired by the CLI host.
pub type HostController = ActivationController<
    ApiClient,
    StaticPermissions,
    PollingLocationSource<HostProvider>,
    ApiClient,
>;

/// A wired controller together with its background geofence refresh.
pub struct TrackingHost {
    pub controller: HostController,
    refresh: Option<(CancellationToken, JoinHandle<()>)>,
}

impl TrackingHost {
    /// Stop the geofence refresh loop, if one was started.
    pub async fn shutdown(self) {
        if let Some((cancellation, handle)) = self.refresh {
            cancellation.cancel();
            let _ = handle.await;
        }
    }
}

/// Runner that manages CLI lifecycle and common operations.
pub struct CliRunner {
    /// Logging guard - keeps logging active while runner exists
    #[allow(dead_code)]
    logging_guard: LoggingGuard,
    /// Loaded configuration file
    config: ConfigFile,
}

impl CliRunner {
    /// Create a new CLI runner, loading config and initializing logging.
    ///
    /// # Arguments
    ///
    /// * `verbose` - Mirror log events to stderr in addition to the log file
    pub fn new(verbose: bool) -> Result<Self, CliError> {
        // Load config file (or use defaults if not present)
        let config = ConfigFile::load()?;

        let logging_guard =
            init_logging(&config.logging.directory, &config.logging.file, verbose)
                .map_err(|e| CliError::LoggingInit(e.to_string()))?;

        Ok(Self {
            logging_guard,
            config,
        })
    }

    /// Get the loaded configuration.
    pub fn config(&self) -> &ConfigFile {
        &self.config
    }

    /// Log startup information for a command.
    pub fn log_startup(&self, command: &str) {
        info!("TouristGuard v{}", touristguard::VERSION);
        info!("TouristGuard CLI: {} command", command);
    }

    /// Build the multi-threaded runtime commands execute on.
    pub fn runtime(&self) -> Result<tokio::runtime::Runtime, CliError> {
        tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .map_err(CliError::Runtime)
    }

    /// Client for the configured dashboard API.
    pub fn api_client(&self) -> Result<ApiClient, CliError> {
        Ok(ApiClient::new(&self.config.to_api_config())?)
    }

    /// The durable identity store at `[storage] identity_file`.
    pub fn identity_store(&self) -> Arc<dyn IdentityStore> {
        Arc::new(FileIdentityStore::new(
            self.config.storage.identity_file.clone(),
        ))
    }

    /// Wire the activation controller for a tracking command.
    ///
    /// Must be called from within the runtime: with local classification
    /// enabled a geofence refresh loop is spawned.
    pub fn tracking_host(&self, position: &PositionArgs) -> Result<TrackingHost, CliError> {
        let client = self.api_client()?;
        let provider = position.provider()?;
        let source = Arc::new(PollingLocationSource::new(provider));

        let mut sessions = TrackingSessionController::new(
            source,
            Arc::new(client.clone()),
            self.config.to_session_config(),
        );

        let refresh = if self.config.tracking.local_classification {
            let store = Arc::new(GeofenceStore::new(client.clone()));
            sessions = sessions.with_geofences(store.clone());

            let cancellation = CancellationToken::new();
            let handle = spawn_refresh_loop(
                store,
                self.config.to_geofence_config().refresh_interval,
                cancellation.clone(),
            );
            Some((cancellation, handle))
        } else {
            None
        };

        let controller = ActivationController::new(
            client,
            position.permissions(),
            self.identity_store(),
            sessions,
            self.config.to_activation_options(),
        );

        Ok(TrackingHost {
            controller,
            refresh,
        })
    }
}
