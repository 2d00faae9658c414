//! Great-circle geodesy on a spherical Earth.
//!
//! Every function here is pure and free of receiver/strategy state; the
//! motion engine (`crate::motion`) is built entirely out of these three
//! primitives plus plain trigonometry.

use crate::constants::EARTH_RADIUS_KM;

/// A geographic position: latitude/longitude in decimal degrees, WGS-84,
/// with an optional altitude in metres.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    pub lat_deg: f64,
    pub lon_deg: f64,
    pub altitude_m: Option<f64>,
}

impl Position {
    pub fn new(lat_deg: f64, lon_deg: f64) -> Self {
        Self {
            lat_deg,
            lon_deg,
            altitude_m: None,
        }
    }

    pub fn with_altitude(lat_deg: f64, lon_deg: f64, altitude_m: f64) -> Self {
        Self {
            lat_deg,
            lon_deg,
            altitude_m: Some(altitude_m),
        }
    }
}

/// Haversine great-circle distance between two positions, in kilometres.
pub fn distance_km(p1: Position, p2: Position) -> f64 {
    let lat1 = p1.lat_deg.to_radians();
    let lat2 = p2.lat_deg.to_radians();
    let dlat = lat2 - lat1;
    let dlon = (p2.lon_deg - p1.lon_deg).to_radians();

    let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().asin();
    EARTH_RADIUS_KM * c
}

/// Initial forward azimuth from `p1` toward `p2`, normalised to [0, 360).
pub fn bearing_deg(p1: Position, p2: Position) -> f64 {
    let lat1 = p1.lat_deg.to_radians();
    let lat2 = p2.lat_deg.to_radians();
    let dlon = (p2.lon_deg - p1.lon_deg).to_radians();

    let y = dlon.sin() * lat2.cos();
    let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * dlon.cos();
    normalize_deg(y.atan2(x).to_degrees())
}

/// Destination position from `p` after travelling `distance_km` along
/// initial bearing `bearing_deg` (inverse-haversine forward step).
pub fn destination(p: Position, bearing_deg: f64, distance_km: f64) -> Position {
    let angular_distance = distance_km / EARTH_RADIUS_KM;
    let bearing = bearing_deg.to_radians();
    let lat1 = p.lat_deg.to_radians();
    let lon1 = p.lon_deg.to_radians();

    let lat2 = (lat1.sin() * angular_distance.cos()
        + lat1.cos() * angular_distance.sin() * bearing.cos())
    .asin();
    let lon2 = lon1
        + (bearing.sin() * angular_distance.sin() * lat1.cos())
            .atan2(angular_distance.cos() - lat1.sin() * lat2.sin());

    Position {
        lat_deg: lat2.to_degrees(),
        lon_deg: normalize_lon_deg(lon2.to_degrees()),
        altitude_m: p.altitude_m,
    }
}

/// Fold any angle in degrees to [0, 360).
pub fn normalize_deg(deg: f64) -> f64 {
    let d = deg % 360.0;
    if d < 0.0 {
        d + 360.0
    } else {
        d
    }
}

/// Fold a longitude to (-180, 180], matching the data model's convention.
fn normalize_lon_deg(deg: f64) -> f64 {
    let mut d = deg;
    while d <= -180.0 {
        d += 360.0;
    }
    while d > 180.0 {
        d -= 360.0;
    }
    d
}

/// Absolute difference between two bearings, folded into [0, 180].
pub fn bearing_delta_deg(a: f64, b: f64) -> f64 {
    let raw = (normalize_deg(a) - normalize_deg(b)).abs();
    if raw > 180.0 {
        360.0 - raw
    } else {
        raw
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use test_case::test_case;

    #[test]
    fn distance_is_commutative() {
        let london = Position::new(51.5074, -0.1278);
        let paris = Position::new(48.8566, 2.3522);
        assert_abs_diff_eq!(
            distance_km(london, paris),
            distance_km(paris, london),
            epsilon = 1e-9
        );
    }

    #[test_case(0.0, 1.0; "north, short hop")]
    #[test_case(90.0, 1.0; "east, short hop")]
    #[test_case(180.0, 50.0; "south, medium hop")]
    #[test_case(270.0, 500.0; "west, long hop")]
    #[test_case(45.0, 999.0; "northeast, near max hop")]
    fn destination_round_trips_distance(bearing: f64, distance: f64) {
        let start = Position::new(51.5074, -0.1278);
        let end = destination(start, bearing, distance);
        assert_abs_diff_eq!(distance_km(start, end), distance, epsilon = 1e-3);
    }

    #[test]
    fn destination_round_trips_bearing() {
        let start = Position::new(10.0, 10.0);
        let end = destination(start, 37.0, 200.0);
        assert_abs_diff_eq!(bearing_deg(start, end), 37.0, epsilon = 1e-6);
    }

    #[test]
    fn bearing_delta_folds_to_180() {
        assert_abs_diff_eq!(bearing_delta_deg(350.0, 10.0), 20.0, epsilon = 1e-9);
        assert_abs_diff_eq!(bearing_delta_deg(10.0, 350.0), 20.0, epsilon = 1e-9);
        assert_abs_diff_eq!(bearing_delta_deg(0.0, 180.0), 180.0, epsilon = 1e-9);
    }
}
