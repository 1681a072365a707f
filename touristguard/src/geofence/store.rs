//! Geofence Store - atomically replaced zone snapshots.
//!
//! The store holds one immutable [`GeofenceSnapshot`] behind an `Arc`.
//! [`GeofenceStore::refresh`] fetches a complete zone list and swaps the
//! pointer; readers calling [`GeofenceStore::current`] never wait on the
//! network and always observe a whole, consistent version.
//!
//! # Failure Handling
//!
//! A failed refresh leaves the previous snapshot in effect. The error is
//! returned to the caller and recorded in [`GeofenceStoreStatus`].

use std::future::Future;
use std::sync::{Arc, Mutex, RwLock};

use chrono::{DateTime, Utc};

use super::error::FetchError;
use super::model::Geofence;

/// Source of complete zone lists (typically the remote dashboard).
pub trait GeofenceFetcher: Send + Sync {
    /// Fetch every zone definition currently published.
    fn fetch_geofences(&self) -> impl Future<Output = Result<Vec<Geofence>, FetchError>> + Send;
}

/// Read access to the latest snapshot.
///
/// Object-safe so that consumers (the tracking session) do not need to be
/// generic over the fetcher type.
pub trait SnapshotSource: Send + Sync {
    /// The latest snapshot. Never blocks on a refresh in progress.
    fn current(&self) -> Arc<GeofenceSnapshot>;
}

/// An immutable, versioned set of zones.
#[derive(Debug, Clone, PartialEq)]
pub struct GeofenceSnapshot {
    version: u64,
    fetched_at: Option<DateTime<Utc>>,
    zones: Vec<Geofence>,
}

impl GeofenceSnapshot {
    /// Create a snapshot with the given version and zones.
    pub fn new(version: u64, zones: Vec<Geofence>) -> Self {
        Self {
            version,
            fetched_at: None,
            zones,
        }
    }

    /// The initial, zone-less snapshot (version 0).
    pub fn empty() -> Self {
        Self::new(0, Vec::new())
    }

    fn fetched(version: u64, zones: Vec<Geofence>, fetched_at: DateTime<Utc>) -> Self {
        Self {
            version,
            fetched_at: Some(fetched_at),
            zones,
        }
    }

    /// Monotonic version; 0 means no refresh has succeeded yet.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// When this snapshot was fetched, if it came from a refresh.
    pub fn fetched_at(&self) -> Option<DateTime<Utc>> {
        self.fetched_at
    }

    /// All zones, active or not, in remote order.
    pub fn zones(&self) -> &[Geofence] {
        &self.zones
    }

    /// Number of zones that participate in classification.
    pub fn active_count(&self) -> usize {
        self.zones.iter().filter(|z| z.active).count()
    }
}

impl Default for GeofenceSnapshot {
    fn default() -> Self {
        Self::empty()
    }
}

/// Refresh bookkeeping exposed for observability.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeofenceStoreStatus {
    /// Version of the current snapshot.
    pub version: u64,
    /// Total zones in the current snapshot.
    pub zone_count: usize,
    /// Time of the last successful refresh.
    pub last_refresh: Option<DateTime<Utc>>,
    /// Message of the most recent failure, cleared on success.
    pub last_error: Option<String>,
    /// Failures since the last success.
    pub consecutive_failures: u32,
}

#[derive(Debug, Default)]
struct RefreshStatus {
    last_error: Option<String>,
    consecutive_failures: u32,
}

/// Holds the current zone snapshot and refreshes it from a fetcher.
pub struct GeofenceStore<F> {
    fetcher: F,
    snapshot: RwLock<Arc<GeofenceSnapshot>>,
    status: Mutex<RefreshStatus>,
    /// Serialises refreshes so versions are assigned in fetch order.
    refresh_lock: tokio::sync::Mutex<()>,
}

impl<F: GeofenceFetcher> GeofenceStore<F> {
    /// Create a store holding the empty snapshot.
    pub fn new(fetcher: F) -> Self {
        Self {
            fetcher,
            snapshot: RwLock::new(Arc::new(GeofenceSnapshot::empty())),
            status: Mutex::new(RefreshStatus::default()),
            refresh_lock: tokio::sync::Mutex::new(()),
        }
    }

    /// Fetch the zone list and atomically replace the snapshot.
    ///
    /// On failure the previous snapshot stays in effect.
    pub async fn refresh(&self) -> Result<(), FetchError> {
        let _guard = self.refresh_lock.lock().await;

        match self.fetcher.fetch_geofences().await {
            Ok(zones) => {
                let previous = self.current().version();
                let next = Arc::new(GeofenceSnapshot::fetched(previous + 1, zones, Utc::now()));

                tracing::info!(
                    version = next.version(),
                    zones = next.zones().len(),
                    active = next.active_count(),
                    "Geofence snapshot refreshed"
                );

                *self.snapshot.write().unwrap_or_else(|e| e.into_inner()) = next;

                let mut status = self.status.lock().unwrap_or_else(|e| e.into_inner());
                status.last_error = None;
                status.consecutive_failures = 0;
                Ok(())
            }
            Err(e) => {
                let mut status = self.status.lock().unwrap_or_else(|e| e.into_inner());
                status.consecutive_failures = status.consecutive_failures.saturating_add(1);
                status.last_error = Some(e.to_string());

                tracing::warn!(
                    error = %e,
                    consecutive_failures = status.consecutive_failures,
                    retained_version = self.current().version(),
                    "Geofence refresh failed, keeping previous snapshot"
                );
                Err(e)
            }
        }
    }

    /// Current refresh status.
    pub fn status(&self) -> GeofenceStoreStatus {
        let snapshot = self.current();
        let status = self.status.lock().unwrap_or_else(|e| e.into_inner());

        GeofenceStoreStatus {
            version: snapshot.version(),
            zone_count: snapshot.zones().len(),
            last_refresh: snapshot.fetched_at(),
            last_error: status.last_error.clone(),
            consecutive_failures: status.consecutive_failures,
        }
    }
}

impl<F: GeofenceFetcher> SnapshotSource for GeofenceStore<F> {
    fn current(&self) -> Arc<GeofenceSnapshot> {
        Arc::clone(&self.snapshot.read().unwrap_or_else(|e| e.into_inner()))
    }
}

impl<F: GeofenceFetcher> GeofenceStore<F> {
    /// The latest snapshot (inherent shortcut for [`SnapshotSource::current`]).
    pub fn current(&self) -> Arc<GeofenceSnapshot> {
        SnapshotSource::current(self)
    }
}

/// A fixed snapshot, for hosts that load zones once or for tests.
impl SnapshotSource for GeofenceSnapshot {
    fn current(&self) -> Arc<GeofenceSnapshot> {
        Arc::new(self.clone())
    }
}
