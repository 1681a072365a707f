//! Periodic geofence refresh daemon.
//!
//! Runs independently of tracking: it only ever swaps the store's snapshot
//! pointer, so sample production and classification never wait on it.
//!
//! # Usage
//!
//! ```ignore
//! let cancellation = CancellationToken::new();
//! let handle = spawn_refresh_loop(store.clone(), Duration::from_secs(300), cancellation.clone());
//!
//! // On-demand refresh (e.g. user-initiated) goes straight to the store
//! store.refresh().await?;
//! ```

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::store::{GeofenceFetcher, GeofenceStore};

/// Default refresh interval (5 minutes).
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(300);

/// Geofence refresh settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeofenceStoreConfig {
    /// Time between scheduled refreshes.
    pub refresh_interval: Duration,
}

impl Default for GeofenceStoreConfig {
    fn default() -> Self {
        Self {
            refresh_interval: DEFAULT_REFRESH_INTERVAL,
        }
    }
}

/// Spawns a background task that refreshes `store` every `interval`.
///
/// The first refresh happens immediately. A zero `interval` is treated as
/// one millisecond. Failures are logged by the store
/// and the loop carries on with the previous snapshot. The task stops when
/// `cancellation` is triggered.
pub fn spawn_refresh_loop<F>(
    store: Arc<GeofenceStore<F>>,
    interval: Duration,
    cancellation: CancellationToken,
) -> JoinHandle<()>
where
    F: GeofenceFetcher + 'static,
{
    // tokio rejects a zero period
    let interval = interval.max(Duration::from_millis(1));

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        tracing::info!(
            interval_secs = interval.as_secs(),
            "Geofence refresh loop started"
        );

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    // Errors are already recorded and logged by the store
                    let _ = store.refresh().await;
                }
                _ = cancellation.cancelled() => {
                    tracing::debug!("Geofence refresh loop stopped");
                    break;
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geofence::error::FetchError;
    use crate::geofence::model::{GeoPoint, Geofence, RiskLevel};
    use std::sync::atomic::{AtomicU32, Ordering};

    struct CountingFetcher {
        calls: AtomicU32,
    }

    impl GeofenceFetcher for CountingFetcher {
        async fn fetch_geofences(&self) -> Result<Vec<Geofence>, FetchError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n % 2 == 1 {
                return Err(FetchError::Status(500));
            }
            Ok(vec![Geofence::circle(
                format!("z{}", n),
                "zone",
                RiskLevel::Low,
                GeoPoint::new(0.0, 0.0),
                10.0,
            )])
        }
    }

    #[tokio::test]
    async fn test_loop_refreshes_until_cancelled() {
        let store = Arc::new(GeofenceStore::new(CountingFetcher {
            calls: AtomicU32::new(0),
        }));
        let cancellation = CancellationToken::new();

        let handle = spawn_refresh_loop(
            Arc::clone(&store),
            Duration::from_millis(10),
            cancellation.clone(),
        );

        tokio::time::sleep(Duration::from_millis(80)).await;
        cancellation.cancel();
        handle.await.unwrap();

        // Alternating failures never drop an already-fetched snapshot
        assert!(store.current().version() >= 1);
        assert_eq!(store.current().zones().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_interval_is_accepted() {
        let store = Arc::new(GeofenceStore::new(CountingFetcher {
            calls: AtomicU32::new(0),
        }));
        let cancellation = CancellationToken::new();

        let handle = spawn_refresh_loop(Arc::clone(&store), Duration::ZERO, cancellation.clone());

        tokio::time::sleep(Duration::from_millis(5)).await;
        cancellation.cancel();
        handle.await.unwrap();

        assert!(store.current().version() >= 1);
    }
}
