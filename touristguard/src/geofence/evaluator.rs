//! Point classification against a geofence snapshot.
//!
//! [`classify`] is a pure function of `(point, snapshot)`: it reads no clock,
//! no global state and no randomness, so identical inputs always produce an
//! identical [`ZoneClassification`].

use serde::Serialize;

use super::geometry::{circle_contains, ring_contains};
use super::model::{GeoPoint, Geofence, Geometry, RiskLevel};
use super::store::GeofenceSnapshot;

/// Result of classifying a point.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ZoneClassification {
    /// The classified point.
    pub point: GeoPoint,
    /// Every active zone containing the point, in snapshot order.
    pub containing_zones: Vec<Geofence>,
    /// Maximum risk over `containing_zones`; `None` when the point is in no zone.
    pub highest_risk: Option<RiskLevel>,
    /// Version of the snapshot this result was computed against.
    pub snapshot_version: u64,
}

impl ZoneClassification {
    /// Returns true if the point lies in at least one zone.
    pub fn is_zoned(&self) -> bool {
        !self.containing_zones.is_empty()
    }

    /// Identifiers of the containing zones.
    pub fn zone_ids(&self) -> Vec<&str> {
        self.containing_zones.iter().map(|z| z.id.as_str()).collect()
    }
}

/// Returns true if `zone` contains `point`, ignoring the `active` flag.
pub fn zone_contains(zone: &Geofence, point: GeoPoint) -> bool {
    match &zone.geometry {
        Geometry::Circle {
            center,
            radius_meters,
        } => circle_contains(*center, *radius_meters, point),
        Geometry::Polygon { ring } => ring_contains(ring, point),
    }
}

/// Highest risk level over a set of zones, or `None` if the set is empty.
pub fn highest_risk<'a>(zones: impl IntoIterator<Item = &'a Geofence>) -> Option<RiskLevel> {
    zones.into_iter().map(|z| z.risk_level).max()
}

/// Classify a point against a snapshot.
///
/// Only `active` zones participate. Overlapping zones are all reported; the
/// highest risk breaks the tie.
pub fn classify(point: GeoPoint, snapshot: &GeofenceSnapshot) -> ZoneClassification {
    let containing_zones: Vec<Geofence> = snapshot
        .zones()
        .iter()
        .filter(|zone| zone.active && zone_contains(zone, point))
        .cloned()
        .collect();

    let highest_risk = highest_risk(&containing_zones);

    ZoneClassification {
        point,
        containing_zones,
        highest_risk,
        snapshot_version: snapshot.version(),
    }
}
