//! Spherical distance and planar containment primitives.
//!
//! # Coordinate System
//!
//! - Latitude: degrees north (-90 to 90)
//! - Longitude: degrees east (-180 to 180)
//! - Distance: meters on a spherical earth of mean radius [`EARTH_RADIUS_M`]
//!
//! Polygon containment is evaluated in the (lon, lat) plane. Rings crossing
//! the antimeridian are not supported.

use std::f64::consts::PI;

use super::model::GeoPoint;

/// Mean earth radius in meters (IUGG).
pub const EARTH_RADIUS_M: f64 = 6_371_008.8;

/// Degrees to radians conversion factor.
const DEG_TO_RAD: f64 = PI / 180.0;

/// Radians to degrees conversion factor.
const RAD_TO_DEG: f64 = 180.0 / PI;

/// Tolerance for treating a point as lying on a polygon edge, in degrees².
const EDGE_EPSILON: f64 = 1e-12;

/// Great-circle distance between two points using the haversine formula.
///
/// # Example
///
/// ```
/// use touristguard::geofence::{geometry::haversine_distance_m, GeoPoint};
///
/// // One degree of latitude is ~111.2km everywhere
/// let d = haversine_distance_m(GeoPoint::new(0.0, 0.0), GeoPoint::new(1.0, 0.0));
/// assert!((d - 111_195.0).abs() < 10.0);
/// ```
pub fn haversine_distance_m(from: GeoPoint, to: GeoPoint) -> f64 {
    let lat1 = from.latitude * DEG_TO_RAD;
    let lat2 = to.latitude * DEG_TO_RAD;
    let delta_lat = (to.latitude - from.latitude) * DEG_TO_RAD;
    let delta_lon = (to.longitude - from.longitude) * DEG_TO_RAD;

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * (delta_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().min(1.0).asin();

    EARTH_RADIUS_M * c
}

/// Project a point along a bearing for a given distance.
///
/// Inverse of [`haversine_distance_m`] on the same sphere; used to build
/// test fixtures and by hosts that synthesise tracks.
pub fn destination_point(start: GeoPoint, bearing_deg: f64, distance_m: f64) -> GeoPoint {
    let lat1 = start.latitude * DEG_TO_RAD;
    let lon1 = start.longitude * DEG_TO_RAD;
    let bearing = bearing_deg * DEG_TO_RAD;
    let angular = distance_m / EARTH_RADIUS_M;

    let lat2 = (lat1.sin() * angular.cos() + lat1.cos() * angular.sin() * bearing.cos()).asin();
    let lon2 = lon1
        + (bearing.sin() * angular.sin() * lat1.cos()).atan2(angular.cos() - lat1.sin() * lat2.sin());

    let mut lon = lon2 * RAD_TO_DEG;
    if lon > 180.0 {
        lon -= 360.0;
    } else if lon < -180.0 {
        lon += 360.0;
    }

    GeoPoint::new(lat2 * RAD_TO_DEG, lon)
}

/// Returns true if `point` lies within `radius_m` of `center` (inclusive).
#[inline]
pub fn circle_contains(center: GeoPoint, radius_m: f64, point: GeoPoint) -> bool {
    haversine_distance_m(center, point) <= radius_m
}

/// Returns true if `point` lies inside or on the boundary of `ring`.
///
/// Uses the even-odd ray-casting rule over the implicitly closed ring. A ring
/// whose last vertex repeats the first is accepted as well. Rings with fewer
/// than three distinct vertices contain nothing.
pub fn ring_contains(ring: &[GeoPoint], point: GeoPoint) -> bool {
    let ring = open_ring(ring);
    if ring.len() < 3 {
        return false;
    }

    let px = point.longitude;
    let py = point.latitude;

    // Boundary is inclusive: check edges before the parity test, which is
    // ambiguous exactly on an edge.
    let mut j = ring.len() - 1;
    for i in 0..ring.len() {
        if on_segment(ring[j], ring[i], point) {
            return true;
        }
        j = i;
    }

    let mut inside = false;
    let mut j = ring.len() - 1;
    for i in 0..ring.len() {
        let (xi, yi) = (ring[i].longitude, ring[i].latitude);
        let (xj, yj) = (ring[j].longitude, ring[j].latitude);

        if (yi > py) != (yj > py) {
            let x_cross = (xj - xi) * (py - yi) / (yj - yi) + xi;
            if px < x_cross {
                inside = !inside;
            }
        }
        j = i;
    }

    inside
}

/// Strip an explicit closing vertex, if present.
fn open_ring(ring: &[GeoPoint]) -> &[GeoPoint] {
    match (ring.first(), ring.last()) {
        (Some(first), Some(last)) if ring.len() > 1 && first == last => &ring[..ring.len() - 1],
        _ => ring,
    }
}

/// Returns true if `p` lies on the segment `a`-`b` in the (lon, lat) plane.
fn on_segment(a: GeoPoint, b: GeoPoint, p: GeoPoint) -> bool {
    let (ax, ay) = (a.longitude, a.latitude);
    let (bx, by) = (b.longitude, b.latitude);
    let (px, py) = (p.longitude, p.latitude);

    let cross = (bx - ax) * (py - ay) - (by - ay) * (px - ax);
    if cross.abs() > EDGE_EPSILON {
        return false;
    }

    px >= ax.min(bx) - EDGE_EPSILON
        && px <= ax.max(bx) + EDGE_EPSILON
        && py >= ay.min(by) - EDGE_EPSILON
        && py <= ay.max(by) + EDGE_EPSILON
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> Vec<GeoPoint> {
        vec![
            GeoPoint::from_lon_lat(77.0, 28.0),
            GeoPoint::from_lon_lat(77.1, 28.0),
            GeoPoint::from_lon_lat(77.1, 28.1),
            GeoPoint::from_lon_lat(77.0, 28.1),
        ]
    }

    #[test]
    fn test_haversine_zero_distance() {
        let p = GeoPoint::new(28.0, 77.0);
        assert_eq!(haversine_distance_m(p, p), 0.0);
    }

    #[test]
    fn test_haversine_longitude_shrinks_with_latitude() {
        let at_equator = haversine_distance_m(GeoPoint::new(0.0, 0.0), GeoPoint::new(0.0, 1.0));
        let at_sixty = haversine_distance_m(GeoPoint::new(60.0, 0.0), GeoPoint::new(60.0, 1.0));

        // cos(60°) = 0.5
        assert!((at_sixty / at_equator - 0.5).abs() < 0.001);
    }

    #[test]
    fn test_haversine_is_symmetric() {
        let a = GeoPoint::new(28.61, 77.20);
        let b = GeoPoint::new(27.17, 78.04);
        assert!((haversine_distance_m(a, b) - haversine_distance_m(b, a)).abs() < 1e-6);
    }

    #[test]
    fn test_destination_point_round_trips_distance() {
        let start = GeoPoint::new(28.0, 77.0);
        for bearing in [0.0, 45.0, 90.0, 180.0, 270.0] {
            let end = destination_point(start, bearing, 2_000.0);
            let d = haversine_distance_m(start, end);
            assert!((d - 2_000.0).abs() < 0.01, "bearing {} gave {}", bearing, d);
        }
    }

    #[test]
    fn test_circle_boundary_is_inclusive() {
        let center = GeoPoint::new(28.0, 77.0);
        let point = destination_point(center, 33.0, 750.0);
        let exact = haversine_distance_m(center, point);

        assert!(circle_contains(center, exact, point));
        assert!(!circle_contains(center, exact - 0.01, point));
    }

    #[test]
    fn test_ring_strictly_inside_and_outside() {
        let ring = square();
        assert!(ring_contains(&ring, GeoPoint::from_lon_lat(77.05, 28.05)));
        assert!(!ring_contains(&ring, GeoPoint::from_lon_lat(77.2, 28.05)));
        assert!(!ring_contains(&ring, GeoPoint::from_lon_lat(77.05, 27.9)));
    }

    #[test]
    fn test_ring_vertices_are_contained() {
        let ring = square();
        for vertex in &ring {
            assert!(ring_contains(&ring, *vertex), "vertex {} not contained", vertex);
        }
    }

    #[test]
    fn test_ring_edge_is_contained() {
        let ring = square();
        // Midpoint of the southern edge
        assert!(ring_contains(&ring, GeoPoint::from_lon_lat(77.05, 28.0)));
        // Midpoint of the eastern edge
        assert!(ring_contains(&ring, GeoPoint::from_lon_lat(77.1, 28.05)));
    }

    #[test]
    fn test_explicitly_closed_ring() {
        let mut ring = square();
        ring.push(ring[0]);
        assert!(ring_contains(&ring, GeoPoint::from_lon_lat(77.05, 28.05)));
        assert!(!ring_contains(&ring, GeoPoint::from_lon_lat(76.9, 28.05)));
    }

    #[test]
    fn test_concave_ring_notch_is_outside() {
        // U-shape opening northward
        let ring = vec![
            GeoPoint::from_lon_lat(0.0, 0.0),
            GeoPoint::from_lon_lat(3.0, 0.0),
            GeoPoint::from_lon_lat(3.0, 3.0),
            GeoPoint::from_lon_lat(2.0, 3.0),
            GeoPoint::from_lon_lat(2.0, 1.0),
            GeoPoint::from_lon_lat(1.0, 1.0),
            GeoPoint::from_lon_lat(1.0, 3.0),
            GeoPoint::from_lon_lat(0.0, 3.0),
        ];
        assert!(!ring_contains(&ring, GeoPoint::from_lon_lat(1.5, 2.0)));
        assert!(ring_contains(&ring, GeoPoint::from_lon_lat(0.5, 2.0)));
        assert!(ring_contains(&ring, GeoPoint::from_lon_lat(1.5, 0.5)));
    }

    #[test]
    fn test_degenerate_ring_contains_nothing() {
        let ring = vec![
            GeoPoint::from_lon_lat(0.0, 0.0),
            GeoPoint::from_lon_lat(1.0, 1.0),
        ];
        assert!(!ring_contains(&ring, GeoPoint::from_lon_lat(0.5, 0.5)));
        assert!(!ring_contains(&[], GeoPoint::from_lon_lat(0.0, 0.0)));
    }
}
