//! Zone definitions and risk classification types.
//!
//! - [`GeoPoint`] - A geographic coordinate in degrees
//! - [`RiskLevel`] - Total risk ordering (`Low < Medium < High < Critical`)
//! - [`Geometry`] - Circle or polygon zone shape
//! - [`Geofence`] - A named zone with geometry and risk classification

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A geographic coordinate.
///
/// Latitude and longitude are in decimal degrees. Remote zone records carry
/// coordinates as `[lon, lat]` pairs, so [`GeoPoint::from_lon_lat`] is the
/// constructor used when decoding them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    /// Latitude in degrees (-90 to 90).
    pub latitude: f64,
    /// Longitude in degrees (-180 to 180).
    pub longitude: f64,
}

impl GeoPoint {
    /// Create a point from latitude and longitude.
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Create a point from a `(lon, lat)` ordered pair.
    pub fn from_lon_lat(longitude: f64, latitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Returns true if both components are finite and within range.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

impl fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.5}, {:.5})", self.latitude, self.longitude)
    }
}

/// Risk classification of a zone.
///
/// Variant order defines the total ordering used for tie-breaking when a
/// point lies in several overlapping zones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    /// Rank used when a zone carries no explicit `riskLevel`.
    pub const LEGACY_UNKNOWN: Self = RiskLevel::Medium;

    /// Map a legacy zone `type` identifier onto a risk level.
    ///
    /// Two zone schemas coexist on the remote side
    /// (`safe_zone/alert_zone/restricted_zone/emergency_zone` and
    /// `tourist_zone/restricted_area/danger_zone`). Both are recognised;
    /// anything else returns `None`.
    pub fn from_legacy_kind(kind: &str) -> Option<Self> {
        match kind.trim().to_ascii_lowercase().as_str() {
            "safe_zone" | "tourist_zone" => Some(RiskLevel::Low),
            "alert_zone" => Some(RiskLevel::Medium),
            "restricted_zone" | "restricted_area" | "danger_zone" => Some(RiskLevel::High),
            "emergency_zone" => Some(RiskLevel::Critical),
            _ => None,
        }
    }

    /// Resolve the effective risk level of a zone record.
    ///
    /// An explicit, parseable `riskLevel` always wins. Otherwise the legacy
    /// `type` mapping applies, and finally [`RiskLevel::LEGACY_UNKNOWN`].
    pub fn resolve(explicit: Option<&str>, legacy_kind: Option<&str>) -> Self {
        explicit
            .and_then(|s| s.parse().ok())
            .or_else(|| legacy_kind.and_then(Self::from_legacy_kind))
            .unwrap_or(Self::LEGACY_UNKNOWN)
    }

    /// Lowercase identifier, as used on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
            RiskLevel::Critical => "critical",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown risk level string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown risk level '{0}'")]
pub struct UnknownRiskLevel(pub String);

impl FromStr for RiskLevel {
    type Err = UnknownRiskLevel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(RiskLevel::Low),
            "medium" => Ok(RiskLevel::Medium),
            "high" => Ok(RiskLevel::High),
            "critical" => Ok(RiskLevel::Critical),
            other => Err(UnknownRiskLevel(other.to_string())),
        }
    }
}

/// Shape discriminator of a zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GeofenceKind {
    Circle,
    Polygon,
}

/// Zone geometry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Geometry {
    /// All points within `radius_meters` great-circle distance of `center`.
    Circle { center: GeoPoint, radius_meters: f64 },
    /// Ordered vertex ring, implicitly closed (last vertex connects to first).
    Polygon { ring: Vec<GeoPoint> },
}

impl Geometry {
    /// The kind of this geometry.
    pub fn kind(&self) -> GeofenceKind {
        match self {
            Geometry::Circle { .. } => GeofenceKind::Circle,
            Geometry::Polygon { .. } => GeofenceKind::Polygon,
        }
    }
}

/// A named geographic zone with a risk classification.
///
/// Geofences are immutable once decoded; the store replaces whole snapshots
/// rather than editing zones in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Geofence {
    /// Remote identifier (`_id`).
    pub id: String,
    /// Human-readable zone name.
    pub name: String,
    /// Effective risk level (explicit or legacy-derived).
    pub risk_level: RiskLevel,
    /// Zone shape.
    pub geometry: Geometry,
    /// Only active zones participate in classification.
    pub active: bool,
    /// Legacy zone `type` as received, kept for display.
    pub zone_type: Option<String>,
}

impl Geofence {
    /// The geometry kind of this zone.
    pub fn kind(&self) -> GeofenceKind {
        self.geometry.kind()
    }

    /// Build an active circular zone.
    pub fn circle(
        id: impl Into<String>,
        name: impl Into<String>,
        risk_level: RiskLevel,
        center: GeoPoint,
        radius_meters: f64,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            risk_level,
            geometry: Geometry::Circle {
                center,
                radius_meters,
            },
            active: true,
            zone_type: None,
        }
    }

    /// Build an active polygonal zone.
    pub fn polygon(
        id: impl Into<String>,
        name: impl Into<String>,
        risk_level: RiskLevel,
        ring: Vec<GeoPoint>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            risk_level,
            geometry: Geometry::Polygon { ring },
            active: true,
            zone_type: None,
        }
    }

    /// Return a copy with the `active` flag set.
    pub fn with_active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_risk_ordering_is_total() {
        assert!(RiskLevel::Low < RiskLevel::Medium);
        assert!(RiskLevel::Medium < RiskLevel::High);
        assert!(RiskLevel::High < RiskLevel::Critical);

        let levels = [RiskLevel::Low, RiskLevel::Critical, RiskLevel::Medium];
        assert_eq!(levels.iter().max(), Some(&RiskLevel::Critical));
    }

    #[test]
    fn test_parse_risk_level_case_insensitive() {
        assert_eq!("HIGH".parse::<RiskLevel>(), Ok(RiskLevel::High));
        assert_eq!(" critical ".parse::<RiskLevel>(), Ok(RiskLevel::Critical));
        assert!("severe".parse::<RiskLevel>().is_err());
    }

    #[test]
    fn test_legacy_kinds_from_both_schemas() {
        assert_eq!(RiskLevel::from_legacy_kind("safe_zone"), Some(RiskLevel::Low));
        assert_eq!(RiskLevel::from_legacy_kind("tourist_zone"), Some(RiskLevel::Low));
        assert_eq!(RiskLevel::from_legacy_kind("alert_zone"), Some(RiskLevel::Medium));
        assert_eq!(RiskLevel::from_legacy_kind("restricted_zone"), Some(RiskLevel::High));
        assert_eq!(RiskLevel::from_legacy_kind("restricted_area"), Some(RiskLevel::High));
        assert_eq!(RiskLevel::from_legacy_kind("danger_zone"), Some(RiskLevel::High));
        assert_eq!(
            RiskLevel::from_legacy_kind("emergency_zone"),
            Some(RiskLevel::Critical)
        );
        assert_eq!(RiskLevel::from_legacy_kind("parking"), None);
    }

    #[test]
    fn test_explicit_risk_level_wins_over_legacy_kind() {
        assert_eq!(
            RiskLevel::resolve(Some("low"), Some("danger_zone")),
            RiskLevel::Low
        );
    }

    #[test]
    fn test_unparseable_risk_level_falls_back_to_kind() {
        assert_eq!(
            RiskLevel::resolve(Some("extreme"), Some("emergency_zone")),
            RiskLevel::Critical
        );
        assert_eq!(RiskLevel::resolve(None, Some("mystery")), RiskLevel::Medium);
        assert_eq!(RiskLevel::resolve(None, None), RiskLevel::LEGACY_UNKNOWN);
    }

    #[test]
    fn test_geo_point_validity() {
        assert!(GeoPoint::new(28.0, 77.0).is_valid());
        assert!(!GeoPoint::new(91.0, 0.0).is_valid());
        assert!(!GeoPoint::new(0.0, f64::NAN).is_valid());
    }

    #[test]
    fn test_from_lon_lat_order() {
        let p = GeoPoint::from_lon_lat(77.0, 28.0);
        assert_eq!(p.longitude, 77.0);
        assert_eq!(p.latitude, 28.0);
    }

    #[test]
    fn test_geofence_kind_follows_geometry() {
        let circle = Geofence::circle("a", "A", RiskLevel::Low, GeoPoint::new(0.0, 0.0), 10.0);
        assert_eq!(circle.kind(), GeofenceKind::Circle);

        let poly = Geofence::polygon("b", "B", RiskLevel::Low, vec![]);
        assert_eq!(poly.kind(), GeofenceKind::Polygon);
    }
}
