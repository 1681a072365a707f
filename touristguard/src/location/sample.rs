//! Timestamped position samples.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::geofence::GeoPoint;

/// A single position fix produced by the Location Sample Source.
///
/// Immutable once produced. `captured_at` is the moment the fix was taken on
/// the device, not when it was delivered; the remote collector orders reports
/// by it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationSample {
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
    /// Horizontal accuracy radius in meters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accuracy: Option<f64>,
    /// Altitude in meters above the WGS-84 ellipsoid.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub altitude: Option<f64>,
    /// Ground speed in meters per second.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed: Option<f64>,
    /// Course over ground in degrees (0-360).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heading: Option<f64>,
    /// When the fix was captured.
    pub captured_at: DateTime<Utc>,
}

impl LocationSample {
    /// Create a bare sample with only a position and capture time.
    pub fn new(latitude: f64, longitude: f64, captured_at: DateTime<Utc>) -> Self {
        Self {
            latitude,
            longitude,
            accuracy: None,
            altitude: None,
            speed: None,
            heading: None,
            captured_at,
        }
    }

    /// Create a bare sample captured now.
    pub fn now(latitude: f64, longitude: f64) -> Self {
        Self::new(latitude, longitude, Utc::now())
    }

    /// Set the accuracy radius.
    pub fn with_accuracy(mut self, meters: f64) -> Self {
        self.accuracy = Some(meters);
        self
    }

    /// The sample position as a [`GeoPoint`].
    pub fn point(&self) -> GeoPoint {
        GeoPoint::new(self.latitude, self.longitude)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_minimal_track_entry() {
        let json = r#"{"latitude": 28.61, "longitude": 77.2, "captured_at": "2026-03-01T10:00:00Z"}"#;
        let sample: LocationSample = serde_json::from_str(json).unwrap();

        assert_eq!(sample.point(), GeoPoint::new(28.61, 77.2));
        assert!(sample.accuracy.is_none());
        assert!(sample.heading.is_none());
    }

    #[test]
    fn test_with_accuracy() {
        let sample = LocationSample::now(1.0, 2.0).with_accuracy(25.0);
        assert_eq!(sample.accuracy, Some(25.0));
    }
}
