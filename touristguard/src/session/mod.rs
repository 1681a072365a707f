//! Tracking Session Controller.
//!
//! Orchestrates one tracking session: the sampling registration, the
//! delivery worker and optional local geofence classification.
//!
//! ```ignore
//! let controller = TrackingSessionController::new(source, uplink, SessionConfig::default())
//!     .with_geofences(store.clone());
//!
//! let session = controller.start(identity).await?;
//! let mut zones = session.subscribe_classifications();
//! // ...
//! let summary = session.stop().await?;
//! ```

mod controller;
mod error;
mod handle;
mod state;

pub use controller::{SessionConfig, TrackingSessionController, DEFAULT_STATUS_INTERVAL};
pub use error::SessionError;
pub use handle::{SessionHandle, SessionStats, SessionSummary};
pub use state::{SessionEvent, SessionState};
