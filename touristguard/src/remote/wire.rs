//! JSON records exchanged with the remote API.
//!
//! Zone records are decoded one at a time so a single malformed record is
//! skipped instead of failing the whole refresh.

use chrono::SecondsFormat;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::activation::TouristProfile;
use crate::geofence::{GeoPoint, Geofence, Geometry, RiskLevel};
use crate::location::LocationSample;

/// Radius used for circle records that carry none.
pub const DEFAULT_CIRCLE_RADIUS_M: f64 = 1000.0;

/// Body of `PATCH /tourists/{id}/location`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocationReport {
    pub lat: f64,
    pub lng: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accuracy: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub altitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speed: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub heading: Option<f64>,
    /// ISO-8601 capture time; the collector orders reports by it.
    pub timestamp: String,
}

impl From<&LocationSample> for LocationReport {
    fn from(sample: &LocationSample) -> Self {
        Self {
            lat: sample.latitude,
            lng: sample.longitude,
            accuracy: sample.accuracy,
            altitude: sample.altitude,
            speed: sample.speed,
            heading: sample.heading,
            timestamp: sample
                .captured_at
                .to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct TouristRecord {
    #[serde(default)]
    kyc: Option<KycRecord>,
}

#[derive(Debug, Default, Deserialize)]
struct KycRecord {
    #[serde(default)]
    name: Option<String>,
}

/// Parse a `GET /tourists/{id}` body. Unrecognised shapes yield an empty profile.
pub fn parse_profile(body: &[u8]) -> TouristProfile {
    let record: TouristRecord = serde_json::from_slice(body).unwrap_or_default();
    TouristProfile {
        display_name: record
            .kyc
            .and_then(|kyc| kyc.name)
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty()),
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeofenceRecord {
    #[serde(rename = "_id")]
    id: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(default)]
    risk_level: Option<String>,
    geometry: GeometryRecord,
    #[serde(default)]
    is_active: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct GeometryRecord {
    #[serde(rename = "type")]
    kind: String,
    coordinates: Value,
    #[serde(default)]
    radius: Option<f64>,
}

impl GeofenceRecord {
    fn into_geofence(self) -> Result<Geofence, String> {
        let geometry = match self.geometry.kind.to_ascii_lowercase().as_str() {
            "circle" => {
                let center = parse_position(&self.geometry.coordinates)
                    .ok_or("circle center must be a [lon, lat] pair")?;
                let radius_meters = self.geometry.radius.unwrap_or(DEFAULT_CIRCLE_RADIUS_M);
                if !radius_meters.is_finite() || radius_meters <= 0.0 {
                    return Err(format!("invalid circle radius {}", radius_meters));
                }
                Geometry::Circle {
                    center,
                    radius_meters,
                }
            }
            "polygon" => Geometry::Polygon {
                ring: parse_ring(&self.geometry.coordinates)?,
            },
            other => return Err(format!("unsupported geometry type '{}'", other)),
        };

        let risk_level = RiskLevel::resolve(self.risk_level.as_deref(), self.kind.as_deref());

        Ok(Geofence {
            name: self.name.unwrap_or_else(|| self.id.clone()),
            id: self.id,
            risk_level,
            geometry,
            active: self.is_active.unwrap_or(true),
            zone_type: self.kind,
        })
    }

    /// True when the risk level came from the last-resort fallback.
    fn uses_unknown_fallback(&self) -> bool {
        let explicit = self
            .risk_level
            .as_deref()
            .and_then(|s| s.parse::<RiskLevel>().ok());
        let legacy = self.kind.as_deref().and_then(RiskLevel::from_legacy_kind);
        explicit.is_none() && legacy.is_none()
    }
}

/// Decode a zone list, skipping malformed records.
pub fn decode_geofences(records: Vec<Value>) -> Vec<Geofence> {
    let total = records.len();
    let mut zones = Vec::with_capacity(total);
    let mut fallback_ids = Vec::new();

    for raw in records {
        let record: GeofenceRecord = match serde_json::from_value(raw) {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!(error = %e, "Skipping undecodable geofence record");
                continue;
            }
        };

        if record.uses_unknown_fallback() {
            fallback_ids.push(record.id.clone());
        }

        let id = record.id.clone();
        match record.into_geofence() {
            Ok(zone) => zones.push(zone),
            Err(reason) => tracing::warn!(id, %reason, "Skipping malformed geofence"),
        }
    }

    if !fallback_ids.is_empty() {
        tracing::debug!(
            ids = ?fallback_ids,
            fallback = %RiskLevel::LEGACY_UNKNOWN,
            "Geofences without a recognised risk level"
        );
    }
    if zones.len() < total {
        tracing::warn!(total, decoded = zones.len(), "Some geofence records were skipped");
    }
    zones
}

/// A `[lon, lat]` pair with finite, in-range components.
fn parse_position(value: &Value) -> Option<GeoPoint> {
    let pair = value.as_array()?;
    if pair.len() != 2 {
        return None;
    }
    let point = GeoPoint::from_lon_lat(pair[0].as_f64()?, pair[1].as_f64()?);
    point.is_valid().then_some(point)
}

/// A vertex ring, either flat (`[[lon, lat], ...]`) or GeoJSON-nested
/// (`[[[lon, lat], ...], ...]`, outer ring first).
fn parse_ring(value: &Value) -> Result<Vec<GeoPoint>, String> {
    let items = value.as_array().ok_or("polygon coordinates must be an array")?;

    let nested = items
        .first()
        .and_then(Value::as_array)
        .and_then(|first| first.first())
        .is_some_and(Value::is_array);
    let vertices = if nested {
        items[0].as_array().ok_or("polygon ring must be an array")?
    } else {
        items
    };

    let ring = vertices
        .iter()
        .map(|v| parse_position(v).ok_or_else(|| format!("invalid polygon vertex {}", v)))
        .collect::<Result<Vec<_>, _>>()?;

    let distinct = match (ring.first(), ring.last()) {
        (Some(first), Some(last)) if ring.len() > 1 && first == last => ring.len() - 1,
        _ => ring.len(),
    };
    if distinct < 3 {
        return Err(format!("polygon needs at least 3 vertices, got {}", distinct));
    }
    Ok(ring)
}

/// How a response status should be treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusClass {
    Success,
    /// Network-level, auth, rate limiting, timeouts and 5xx: retry later.
    Transient,
    /// Other 4xx: retrying will not help.
    Permanent,
}

pub fn classify_status(status: u16) -> StatusClass {
    match status {
        200..=299 => StatusClass::Success,
        401 | 403 | 408 | 429 => StatusClass::Transient,
        400..=499 => StatusClass::Permanent,
        _ => StatusClass::Transient,
    }
}
