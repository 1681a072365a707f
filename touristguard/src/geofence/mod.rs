//! Geofence Store & Evaluator.
//!
//! Holds the current set of zone definitions and classifies points against
//! them with inclusive containment tests and risk-priority tie-breaking.
//!
//! # Components
//!
//! - [`model`] - `Geofence`, `Geometry`, `RiskLevel`, `GeoPoint`
//! - [`geometry`] - Haversine distance and ray-casting containment
//! - [`evaluator`] - Pure `classify(point, snapshot)`
//! - [`store`] - `GeofenceStore` with atomic snapshot replacement
//! - [`refresher`] - Interval-driven refresh daemon
//!
//! # Usage
//!
//! ```ignore
//! let store = Arc::new(GeofenceStore::new(api_client));
//! store.refresh().await?;
//!
//! let result = classify(GeoPoint::new(28.61, 77.20), &store.current());
//! if let Some(risk) = result.highest_risk {
//!     println!("In {} zone(s), highest risk {}", result.containing_zones.len(), risk);
//! }
//! ```

mod error;
pub mod evaluator;
pub mod geometry;
mod model;
mod refresher;
mod store;

pub use error::FetchError;
pub use evaluator::{classify, highest_risk, zone_contains, ZoneClassification};
pub use model::{GeoPoint, Geofence, GeofenceKind, Geometry, RiskLevel, UnknownRiskLevel};
pub use refresher::{spawn_refresh_loop, GeofenceStoreConfig, DEFAULT_REFRESH_INTERVAL};
pub use store::{
    GeofenceFetcher, GeofenceSnapshot, GeofenceStore, GeofenceStoreStatus, SnapshotSource,
};
