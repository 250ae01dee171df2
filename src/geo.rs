//! Great-circle distance and pace helpers.
//!
//! Pure functions, no state. Distances use the haversine formula on a
//! spherical Earth, which is well inside GPS error at rowing distances.

use serde::{Deserialize, Serialize};

/// Mean Earth radius in meters.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Distance a split is quoted over, in meters.
pub const SPLIT_DISTANCE_M: f64 = 500.0;

/// A latitude/longitude pair in degrees.
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

/// Haversine distance between two points, in meters.
pub fn distance(from: GeoPoint, to: GeoPoint) -> f64 {
    let d_lat = (to.lat - from.lat).to_radians();
    let d_lng = (to.lng - from.lng).to_radians();
    let a = (d_lat / 2.0).sin().powi(2)
        + from.lat.to_radians().cos() * to.lat.to_radians().cos() * (d_lng / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    EARTH_RADIUS_M * c
}

/// Speed in m/s over `distance_m` covered in `elapsed_s`.
///
/// `None` unless the elapsed time is strictly positive and the result finite.
pub fn instantaneous_speed(distance_m: f64, elapsed_s: f64) -> Option<f64> {
    if elapsed_s.is_nan() || elapsed_s <= 0.0 {
        return None;
    }
    let speed = distance_m / elapsed_s;
    speed.is_finite().then_some(speed)
}

/// Seconds needed to cover 500 m at `speed_mps`.
pub fn split_seconds(speed_mps: f64) -> Option<f64> {
    if !speed_mps.is_finite() || speed_mps <= 0.0 {
        return None;
    }
    Some(SPLIT_DISTANCE_M / speed_mps)
}

/// Render a split as `m:ss`, rounding to the nearest second.
pub fn format_split(seconds: f64) -> String {
    if !seconds.is_finite() || seconds < 0.0 {
        return "--:--".to_string();
    }
    let total = seconds.round() as u64;
    format!("{}:{:02}", total / 60, total % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_distance() {
        let origin = GeoPoint::new(0.0, 0.0);
        assert_eq!(distance(origin, origin), 0.0);
    }

    #[test]
    fn test_one_degree_longitude_at_equator() {
        let d = distance(GeoPoint::new(0.0, 0.0), GeoPoint::new(0.0, 1.0));
        assert!((d - 111_195.0).abs() < 1.0, "got {d}");
    }

    #[test]
    fn test_distance_is_symmetric() {
        let a = GeoPoint::new(51.4934, -0.2231);
        let b = GeoPoint::new(51.4870, -0.2240);
        assert!((distance(a, b) - distance(b, a)).abs() < 1e-9);
        // Roughly 715 m of river.
        assert!((distance(a, b) - 715.0).abs() < 5.0);
    }

    #[test]
    fn test_instantaneous_speed_guards() {
        assert_eq!(instantaneous_speed(10.0, 2.0), Some(5.0));
        assert_eq!(instantaneous_speed(10.0, 0.0), None);
        assert_eq!(instantaneous_speed(10.0, -1.0), None);
        assert_eq!(instantaneous_speed(10.0, f64::NAN), None);
    }

    #[test]
    fn test_split() {
        assert_eq!(split_seconds(5.0), Some(100.0));
        assert_eq!(split_seconds(0.0), None);
        assert_eq!(split_seconds(f64::INFINITY), None);
        assert_eq!(format_split(100.0), "1:40");
        assert_eq!(format_split(119.6), "2:00");
        assert_eq!(format_split(f64::NAN), "--:--");
    }
}
