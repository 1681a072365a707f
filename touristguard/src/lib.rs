//! TouristGuard - location tracking and geofence evaluation for
//! personal-safety monitoring.
//!
//! The library captures a tourist's position on a fixed cadence, delivers
//! each sample to a remote safety dashboard with at-least-once semantics,
//! and classifies positions against the dashboard's risk zones.
//!
//! # Module Map
//!
//! - [`activation`] - permissions, identity validation and the single active session
//! - [`session`] - one tracking session: sampling, delivery, classification
//! - [`location`] - sampling port and position providers
//! - [`delivery`] - retrying uplink queue
//! - [`geofence`] - zone snapshots and point classification
//! - [`identity`] - the Identity Token and its durable store
//! - [`remote`] - HTTP client for the dashboard API
//! - [`config`] - `~/.touristguard/config.ini`
//!
//! # High-Level Flow
//!
//! ```ignore
//! use touristguard::activation::ActivationController;
//!
//! let controller = ActivationController::new(client, permissions, store, sessions, options);
//! let session = controller.activate("T-1234").await?;
//! // ... samples are captured and delivered in the background ...
//! let summary = controller.stop().await?;
//! ```

pub mod activation;
pub mod config;
pub mod delivery;
pub mod geofence;
pub mod identity;
pub mod location;
pub mod logging;
pub mod permissions;
pub mod remote;
pub mod session;

/// Version of the TouristGuard library and CLI.
///
/// This is synchronized across all components in the workspace.
/// The version is defined in `Cargo.toml` and injected at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
