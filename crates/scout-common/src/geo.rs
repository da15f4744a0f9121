//! Geo primitives shared by the extractor (primitive fields) and the
//! merger (tier-3 dedup distance check).

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

/// Haversine distance between two lat/lng points, in meters.
pub fn haversine_distance_meters(a: GeoPoint, b: GeoPoint) -> f64 {
    let to_rad = |deg: f64| deg * PI / 180.0;

    let dlat = to_rad(b.lat - a.lat);
    let dlng = to_rad(b.lng - a.lng);

    let h = (dlat / 2.0).sin().powi(2)
        + to_rad(a.lat).cos() * to_rad(b.lat).cos() * (dlng / 2.0).sin().powi(2);

    let c = 2.0 * h.sqrt().asin();
    EARTH_RADIUS_METERS * c
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_distance_for_identical_points() {
        let p = GeoPoint::new(55.9550, -3.1050);
        assert_eq!(haversine_distance_meters(p, p), 0.0);
    }

    #[test]
    fn nearby_points_are_within_a_few_hundred_meters() {
        // Two points in Edinburgh roughly 50-100m apart.
        let a = GeoPoint::new(55.9550, -3.1050);
        let b = GeoPoint::new(55.9555, -3.1050);
        let d = haversine_distance_meters(a, b);
        assert!(d > 0.0 && d < 200.0, "expected < 200m, got {d}");
    }

    #[test]
    fn distant_points_exceed_dedup_threshold() {
        let edinburgh = GeoPoint::new(55.9533, -3.1883);
        let glasgow = GeoPoint::new(55.8642, -4.2518);
        assert!(haversine_distance_meters(edinburgh, glasgow) > 50.0);
    }
}
