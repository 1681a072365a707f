//! Position providers - the one-shot fix capability behind a polling source.
//!
//! - [`FixedPositionProvider`] - always the same position
//! - [`ScriptedPositionProvider`] - replays a recorded track, then holds its
//!   last fix

use std::collections::VecDeque;
use std::future::Future;
use std::sync::Mutex;

use chrono::Utc;
use thiserror::Error;

use super::config::AccuracyTier;
use super::sample::LocationSample;

/// Errors acquiring a single fix.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    /// Permission was revoked; no fixes until it is granted again.
    #[error("Location permission revoked")]
    PermissionRevoked,

    /// No fix could be obtained right now (no signal, timeout).
    #[error("No position fix available: {0}")]
    Unavailable(String),
}

/// Whether the provider can keep sampling while the host is backgrounded.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum BackgroundCapability {
    #[default]
    Guaranteed,
    Degraded(String),
}

/// One-shot access to the device position.
pub trait PositionProvider: Send + Sync {
    /// Acquire a fix at the requested accuracy.
    fn current_fix(
        &self,
        accuracy: AccuracyTier,
    ) -> impl Future<Output = Result<LocationSample, ProviderError>> + Send;

    /// Current background sampling capability.
    fn background_capability(&self) -> BackgroundCapability {
        BackgroundCapability::Guaranteed
    }
}

/// Reports the same position on every fix, stamped with the current time.
#[derive(Debug, Clone)]
pub struct FixedPositionProvider {
    latitude: f64,
    longitude: f64,
    accuracy_m: Option<f64>,
}

impl FixedPositionProvider {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            accuracy_m: None,
        }
    }

    pub fn with_accuracy(mut self, meters: f64) -> Self {
        self.accuracy_m = Some(meters);
        self
    }
}

impl PositionProvider for FixedPositionProvider {
    async fn current_fix(&self, _accuracy: AccuracyTier) -> Result<LocationSample, ProviderError> {
        let mut sample = LocationSample::now(self.latitude, self.longitude);
        sample.accuracy = self.accuracy_m;
        Ok(sample)
    }
}

/// Replays a recorded track one fix per call.
///
/// Each replayed fix is re-stamped with the time it is handed out. Once the
/// track is exhausted the last position is repeated.
#[derive(Debug)]
pub struct ScriptedPositionProvider {
    remaining: Mutex<VecDeque<LocationSample>>,
    last: Mutex<Option<LocationSample>>,
}

impl ScriptedPositionProvider {
    pub fn new(track: Vec<LocationSample>) -> Self {
        Self {
            remaining: Mutex::new(track.into()),
            last: Mutex::new(None),
        }
    }

    /// Parse a track from a JSON array of samples.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let track: Vec<LocationSample> = serde_json::from_str(json)?;
        Ok(Self::new(track))
    }

    /// Fixes not yet replayed.
    pub fn remaining(&self) -> usize {
        self.remaining
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }
}

impl PositionProvider for ScriptedPositionProvider {
    async fn current_fix(&self, _accuracy: AccuracyTier) -> Result<LocationSample, ProviderError> {
        let next = self
            .remaining
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front();

        let mut last = self.last.lock().unwrap_or_else(|e| e.into_inner());
        let mut sample = match next.or_else(|| last.clone()) {
            Some(sample) => sample,
            None => return Err(ProviderError::Unavailable("empty track".to_string())),
        };
        sample.captured_at = Utc::now();
        *last = Some(sample.clone());
        Ok(sample)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fixed_provider() {
        let provider = FixedPositionProvider::new(28.6, 77.2).with_accuracy(15.0);
        let fix = provider.current_fix(AccuracyTier::High).await.unwrap();

        assert_eq!(fix.latitude, 28.6);
        assert_eq!(fix.longitude, 77.2);
        assert_eq!(fix.accuracy, Some(15.0));
        assert_eq!(provider.background_capability(), BackgroundCapability::Guaranteed);
    }

    #[tokio::test]
    async fn test_scripted_provider_holds_last_fix() {
        let provider = ScriptedPositionProvider::new(vec![
            LocationSample::now(1.0, 1.0),
            LocationSample::now(2.0, 2.0),
        ]);

        let a = provider.current_fix(AccuracyTier::Balanced).await.unwrap();
        let b = provider.current_fix(AccuracyTier::Balanced).await.unwrap();
        let c = provider.current_fix(AccuracyTier::Balanced).await.unwrap();

        assert_eq!(a.latitude, 1.0);
        assert_eq!(b.latitude, 2.0);
        assert_eq!(c.latitude, 2.0);
        assert_eq!(provider.remaining(), 0);
        assert!(c.captured_at >= b.captured_at);
    }

    #[tokio::test]
    async fn test_empty_track_is_unavailable() {
        let provider = ScriptedPositionProvider::new(vec![]);
        let result = provider.current_fix(AccuracyTier::Balanced).await;
        assert!(matches!(result, Err(ProviderError::Unavailable(_))));
    }

    #[test]
    fn test_track_from_json() {
        let json = r#"[
            {"latitude": 28.0, "longitude": 77.0, "captured_at": "2026-03-01T10:00:00Z"},
            {"latitude": 28.1, "longitude": 77.1, "accuracy": 12.5, "captured_at": "2026-03-01T10:10:00Z"}
        ]"#;
        let provider = ScriptedPositionProvider::from_json(json).unwrap();
        assert_eq!(provider.remaining(), 2);
    }
}
