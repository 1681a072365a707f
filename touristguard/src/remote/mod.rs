//! Remote API adapters.
//!
//! [`ApiClient`] implements the identity validation, location uplink and
//! geofence fetch ports over HTTP. [`wire`] holds the JSON record shapes and
//! status-code classification.

mod client;
mod config;
mod error;
pub mod wire;

pub use client::ApiClient;
pub use config::{ApiConfig, DEFAULT_BASE_URL, DEFAULT_TIMEOUT};
pub use error::RemoteError;
pub use wire::{StatusClass, DEFAULT_CIRCLE_RADIUS_M};
