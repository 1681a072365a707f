//! CLI error handling with user-friendly messages.
//!
//! Centralizes error handling for the CLI, providing consistent formatting
//! and appropriate exit codes.

use std::fmt;
use std::path::PathBuf;
use std::process;

use touristguard::activation::ActivationError;
use touristguard::config::ConfigFileError;
use touristguard::geofence::FetchError;
use touristguard::identity::IdentityStoreError;
use touristguard::permissions::PermissionScope;
use touristguard::remote::RemoteError;
use touristguard::session::SessionError;

/// CLI-specific errors with user-friendly messages.
#[derive(Debug)]
pub enum CliError {
    /// Failed to initialize logging
    LoggingInit(String),
    /// Configuration error
    Config(String),
    /// Failed to load or save config.ini
    ConfigFile(ConfigFileError),
    /// Failed to start the async runtime
    Runtime(std::io::Error),
    /// Failed to build the API client
    Remote(RemoteError),
    /// Activation or resume failed
    Activation(ActivationError),
    /// Stopping the session failed
    Session(SessionError),
    /// Identity storage failed
    Identity(IdentityStoreError),
    /// Geofence download failed
    Geofences(FetchError),
    /// Failed to read or parse a recorded track
    Track { path: PathBuf, reason: String },
    /// `run` was used before any identity was activated
    NotActivated,
}

impl CliError {
    /// Exit the process with an appropriate error message and code.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        // Print additional help for specific errors
        match self {
            CliError::Activation(ActivationError::PermissionDenied { scope }) => {
                eprintln!();
                match scope {
                    PermissionScope::Foreground => {
                        eprintln!("Location access is required to track your position.");
                    }
                    PermissionScope::Background => {
                        eprintln!("Background location is required so tracking continues");
                        eprintln!("while the app is not in the foreground.");
                        eprintln!("Run again without --deny-background to grant it.");
                    }
                }
            }
            CliError::Activation(ActivationError::ValidationUnavailable(_)) => {
                eprintln!();
                eprintln!("The identity could not be checked. Make sure:");
                eprintln!("  1. The dashboard API is reachable ([api] base_url in config.ini)");
                eprintln!("  2. Or set validate_identity = false to skip the check");
            }
            CliError::Geofences(_) => {
                eprintln!();
                eprintln!("Check [api] base_url in config.ini.");
            }
            CliError::NotActivated => {
                eprintln!();
                eprintln!("Activate an identity first: touristguard activate <ID>");
            }
            _ => {}
        }

        process::exit(1)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::LoggingInit(msg) => write!(f, "Failed to initialize logging: {}", msg),
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::ConfigFile(e) => write!(f, "{}", e),
            CliError::Runtime(e) => write!(f, "Failed to start async runtime: {}", e),
            CliError::Remote(e) => write!(f, "{}", e),
            CliError::Activation(e) => write!(f, "Activation failed: {}", e),
            CliError::Session(e) => write!(f, "Tracking session error: {}", e),
            CliError::Identity(e) => write!(f, "{}", e),
            CliError::Geofences(e) => write!(f, "Failed to load geofences: {}", e),
            CliError::Track { path, reason } => {
                write!(f, "Failed to load track '{}': {}", path.display(), reason)
            }
            CliError::NotActivated => write!(f, "No identity has been activated"),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::ConfigFile(e) => Some(e),
            CliError::Runtime(e) => Some(e),
            CliError::Remote(e) => Some(e),
            CliError::Activation(e) => Some(e),
            CliError::Session(e) => Some(e),
            CliError::Identity(e) => Some(e),
            CliError::Geofences(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ConfigFileError> for CliError {
    fn from(e: ConfigFileError) -> Self {
        CliError::ConfigFile(e)
    }
}

impl From<ActivationError> for CliError {
    fn from(e: ActivationError) -> Self {
        CliError::Activation(e)
    }
}

impl From<SessionError> for CliError {
    fn from(e: SessionError) -> Self {
        CliError::Session(e)
    }
}

impl From<RemoteError> for CliError {
    fn from(e: RemoteError) -> Self {
        CliError::Remote(e)
    }
}
