//! Geodesic distance on the FAI sphere.
//!
//! Distances are great-circle distances on a sphere of radius 6 371 000 m
//! (the FAI Earth model), computed with the half-angle (haversine) identity
//! so that near-coincident points do not suffer cancellation, and rounded to
//! whole meters so the search can run on integer arithmetic.

use crate::TrackPoint;

/// FAI mean Earth radius in meters.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Great-circle distance between two coordinates in degrees, in meters,
/// rounded half-up to the nearest whole meter.
///
/// Stable for coincident points and clamped against floating-point round-off
/// pushing the `asin` argument above 1 for near-antipodal pairs.
///
/// # Example
/// ```
/// use xcscore::geo::distance_meters;
///
/// // One degree of latitude on the FAI sphere is ~111.195 km.
/// let d = distance_meters(0.0, 0.0, 1.0, 0.0);
/// assert!((d as i64 - 111_195).abs() <= 1);
/// ```
pub fn distance_meters(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> u32 {
    let lat1 = lat1.to_radians();
    let lat2 = lat2.to_radians();
    let dlat = (lat1 - lat2) / 2.0;
    let dlon = (lon1.to_radians() - lon2.to_radians()) / 2.0;
    let h = dlat.sin().powi(2) + dlon.sin().powi(2) * lat1.cos() * lat2.cos();
    round_half_up(2.0 * EARTH_RADIUS_M * h.clamp(0.0, 1.0).sqrt().asin())
}

/// Great-circle distance between two track points in meters (unrounded).
pub fn haversine_distance(p1: &TrackPoint, p2: &TrackPoint) -> f64 {
    let lat1 = p1.latitude.to_radians();
    let lat2 = p2.latitude.to_radians();
    let dlat = (lat1 - lat2) / 2.0;
    let dlon = (p1.longitude.to_radians() - p2.longitude.to_radians()) / 2.0;
    let h = dlat.sin().powi(2) + dlon.sin().powi(2) * lat1.cos() * lat2.cos();
    2.0 * EARTH_RADIUS_M * h.clamp(0.0, 1.0).sqrt().asin()
}

/// Per-point trigonometry, precomputed once so the O(n²) matrix pass needs
/// only one cosine, one square root and one arcsine per pair.
#[derive(Debug, Clone, Copy)]
pub(crate) struct PointTrig {
    sin_lat: f64,
    cos_lat: f64,
    lon_rad: f64,
}

impl PointTrig {
    pub(crate) fn new(point: &TrackPoint) -> Self {
        let lat_rad = point.latitude.to_radians();
        Self {
            sin_lat: lat_rad.sin(),
            cos_lat: lat_rad.cos(),
            lon_rad: point.longitude.to_radians(),
        }
    }

    /// Rounded whole-meter distance to `other`.
    ///
    /// Uses `sin²(Δ/2) = (1 − cos Δ)/2` to express the haversine terms in
    /// the precomputed values; numerically identical to [`distance_meters`]
    /// at whole-meter resolution.
    pub(crate) fn distance_to(&self, other: &PointTrig) -> u32 {
        let cos_dlat = self.cos_lat * other.cos_lat + self.sin_lat * other.sin_lat;
        let hav_lat = (1.0 - cos_dlat) / 2.0;
        let hav_lon = (1.0 - (self.lon_rad - other.lon_rad).cos()) / 2.0;
        let h = hav_lat + hav_lon * self.cos_lat * other.cos_lat;
        round_half_up(2.0 * EARTH_RADIUS_M * h.clamp(0.0, 1.0).sqrt().asin())
    }
}

#[inline]
fn round_half_up(meters: f64) -> u32 {
    (meters + 0.5) as u32
}
