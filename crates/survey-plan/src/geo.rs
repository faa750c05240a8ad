use serde::{Deserialize, Serialize};

pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLon {
    pub lat: f64,
    pub lon: f64,
}

impl LatLon {
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    pub fn is_valid(&self) -> bool {
        self.lat.is_finite() && self.lon.is_finite() && self.lat.abs() <= 90.0 && self.lon.abs() <= 180.0
    }
}

/// Great-circle distance in metres.
pub fn haversine_m(a: LatLon, b: LatLon) -> f64 {
    let dlat = (b.lat - a.lat).to_radians();
    let dlon = (b.lon - a.lon).to_radians();
    let h = (dlat / 2.0).sin().powi(2)
        + a.lat.to_radians().cos() * b.lat.to_radians().cos() * (dlon / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());
    EARTH_RADIUS_M * c
}

/// Initial bearing from `from` to `to`, degrees clockwise from north in `[0, 360)`.
pub fn bearing_deg(from: LatLon, to: LatLon) -> f64 {
    let (lat1, lat2) = (from.lat.to_radians(), to.lat.to_radians());
    let dlon = (to.lon - from.lon).to_radians();
    let y = dlon.sin() * lat2.cos();
    let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * dlon.cos();
    y.atan2(x).to_degrees().rem_euclid(360.0)
}

/// Point reached by travelling `distance_m` from `origin` along `bearing`.
pub fn offset(origin: LatLon, distance_m: f64, bearing: f64) -> LatLon {
    let delta = distance_m / EARTH_RADIUS_M;
    let theta = bearing.to_radians();
    let lat1 = origin.lat.to_radians();
    let lon1 = origin.lon.to_radians();

    let lat2 = (lat1.sin() * delta.cos() + lat1.cos() * delta.sin() * theta.cos()).asin();
    let lon2 = lon1
        + (theta.sin() * delta.sin() * lat1.cos()).atan2(delta.cos() - lat1.sin() * lat2.sin());
    LatLon::new(lat2.to_degrees(), (lon2.to_degrees() + 540.0).rem_euclid(360.0) - 180.0)
}

/// Straight interpolation in degree space; only meaningful over short ranges.
pub fn lerp(a: LatLon, b: LatLon, t: f64) -> LatLon {
    LatLon::new(a.lat + (b.lat - a.lat) * t, a.lon + (b.lon - a.lon) * t)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn one_degree_of_latitude() {
        let d = haversine_m(LatLon::new(0.0, 0.0), LatLon::new(1.0, 0.0));
        assert_relative_eq!(d, EARTH_RADIUS_M * 1.0_f64.to_radians(), max_relative = 1e-12);
        assert_relative_eq!(d, 111_194.93, epsilon = 0.01);
    }

    #[test]
    fn offset_then_measure() {
        let origin = LatLon::new(-31.979839, 115.817546);
        for bearing in [0.0, 45.0, 90.0, 200.0, 315.0] {
            let p = offset(origin, 25.0, bearing);
            assert_relative_eq!(haversine_m(origin, p), 25.0, epsilon = 1e-6);
            assert_relative_eq!(bearing_deg(origin, p), bearing, epsilon = 1e-4);
        }
    }

    #[test]
    fn lerp_endpoints() {
        let a = LatLon::new(10.0, 10.0);
        let b = LatLon::new(20.0, 30.0);
        assert_eq!(lerp(a, b, 0.0), a);
        assert_eq!(lerp(a, b, 1.0), b);
        assert_eq!(lerp(a, b, 0.5), LatLon::new(15.0, 20.0));
    }

    #[test]
    fn rejects_out_of_range_coordinates() {
        assert!(LatLon::new(45.0, 170.0).is_valid());
        assert!(!LatLon::new(91.0, 0.0).is_valid());
        assert!(!LatLon::new(f64::NAN, 0.0).is_valid());
    }
}
