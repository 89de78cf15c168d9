//! Spherical Web Mercator on the WGS84 semi-major axis.
//!
//! Geographic positions are stored in degrees. Mercator coordinates are in
//! meters, with +y pointing north.

use serde::{Deserialize, Serialize};

/// WGS84 semi-major axis (meters).
pub const WGS84_A: f64 = 6_378_137.0;

/// Latitude at which the Mercator square ends.
pub const MERCATOR_MAX_LAT_DEG: f64 = 85.05112878;

/// Circumference of the projected world (meters).
pub const WORLD_WIDTH_M: f64 = 2.0 * std::f64::consts::PI * WGS84_A;

/// Geographic coordinate in degrees.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct LatLon {
    #[serde(rename = "lat")]
    pub lat_deg: f64,
    #[serde(rename = "lon")]
    pub lon_deg: f64,
}

impl LatLon {
    pub const fn new(lat_deg: f64, lon_deg: f64) -> Self {
        Self { lat_deg, lon_deg }
    }

    pub fn is_finite(&self) -> bool {
        self.lat_deg.is_finite() && self.lon_deg.is_finite()
    }

    /// Arithmetic mean of the given coordinates, in degrees.
    ///
    /// Returns `None` for an empty iterator.
    pub fn mean<I>(points: I) -> Option<LatLon>
    where
        I: IntoIterator<Item = LatLon>,
    {
        let mut lat = 0.0;
        let mut lon = 0.0;
        let mut count = 0usize;
        for p in points {
            lat += p.lat_deg;
            lon += p.lon_deg;
            count += 1;
        }
        if count == 0 {
            return None;
        }
        let n = count as f64;
        Some(LatLon::new(lat / n, lon / n))
    }
}

/// Container pixel position: origin at the top-left corner, y grows downward.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScreenPoint {
    pub x: f64,
    pub y: f64,
}

impl ScreenPoint {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    pub fn distance(self, other: ScreenPoint) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// Point at `radius` pixels from `self`, `angle_rad` measured clockwise
    /// from the +x axis (screen y points down).
    pub fn offset_polar(self, radius: f64, angle_rad: f64) -> ScreenPoint {
        ScreenPoint::new(
            self.x + angle_rad.cos() * radius,
            self.y + angle_rad.sin() * radius,
        )
    }
}

pub fn clamp(v: f64, lo: f64, hi: f64) -> f64 {
    v.max(lo).min(hi)
}

pub fn wrap_lon_deg(lon: f64) -> f64 {
    (lon + 180.0).rem_euclid(360.0) - 180.0
}


pub fn mercator_x_m(lon_deg: f64) -> f64 {
    WGS84_A * lon_deg.to_radians()
}

pub fn mercator_y_m(lat_deg: f64) -> f64 {
    let lat = clamp(lat_deg, -MERCATOR_MAX_LAT_DEG, MERCATOR_MAX_LAT_DEG).to_radians();
    WGS84_A * (0.5 * (std::f64::consts::FRAC_PI_2 + lat)).tan().ln()
}

pub fn inverse_mercator_lon_deg(x_m: f64) -> f64 {
    (x_m / WGS84_A).to_degrees()
}

pub fn inverse_mercator_lat_deg(y_m: f64) -> f64 {
    let lat = 2.0 * (y_m / WGS84_A).exp().atan() - std::f64::consts::FRAC_PI_2;
    lat.to_degrees()
}

/// Shortest signed x distance on the wrapped Mercator world, in
/// `[-WORLD_WIDTH_M / 2, WORLD_WIDTH_M / 2)`.
pub fn wrap_dx_m(dx_m: f64) -> f64 {
    (dx_m + 0.5 * WORLD_WIDTH_M).rem_euclid(WORLD_WIDTH_M) - 0.5 * WORLD_WIDTH_M
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: f64, b: f64, eps: f64) {
        let diff = (a - b).abs();
        assert!(diff <= eps, "expected {a} ~= {b} (diff {diff})");
    }

    #[test]
    fn mercator_origin_is_zero() {
        assert_close(mercator_x_m(0.0), 0.0, 1e-9);
        assert_close(mercator_y_m(0.0), 0.0, 1e-9);
    }

    #[test]
    fn mercator_round_trip() {
        for (lat, lon) in [(40.7128, -74.006), (-23.5505, -46.6333), (35.6762, 139.6503)] {
            let back_lat = inverse_mercator_lat_deg(mercator_y_m(lat));
            let back_lon = inverse_mercator_lon_deg(mercator_x_m(lon));
            assert_close(back_lat, lat, 1e-9);
            assert_close(back_lon, lon, 1e-9);
        }
    }

    #[test]
    fn mercator_y_clamps_at_the_poles() {
        assert_close(mercator_y_m(90.0), mercator_y_m(MERCATOR_MAX_LAT_DEG), 1e-6);
    }

    #[test]
    fn wraps_longitude_into_range() {
        assert_close(wrap_lon_deg(190.0), -170.0, 1e-9);
        assert_close(wrap_lon_deg(-190.0), 170.0, 1e-9);
        assert_close(wrap_lon_deg(45.0), 45.0, 1e-9);
    }

    #[test]
    fn wrap_dx_takes_the_short_way_round() {
        let dx = mercator_x_m(179.0) - mercator_x_m(-179.0);
        assert_close(wrap_dx_m(dx), mercator_x_m(-2.0), 1e-6);
    }

    #[test]
    fn mean_of_coordinates() {
        let m = LatLon::mean([LatLon::new(10.0, 20.0), LatLon::new(20.0, 40.0)]).unwrap();
        assert_eq!(m, LatLon::new(15.0, 30.0));
        assert!(LatLon::mean(Vec::new()).is_none());
    }

    #[test]
    fn offset_polar_moves_clockwise_on_screen() {
        let c = ScreenPoint::new(100.0, 100.0);
        let p = c.offset_polar(12.0, std::f64::consts::FRAC_PI_2);
        assert_close(p.x, 100.0, 1e-9);
        assert_close(p.y, 112.0, 1e-9);
        assert_close(c.distance(p), 12.0, 1e-9);
    }

    #[test]
    fn latlon_serializes_short_keys() {
        let json = serde_json::to_string(&LatLon::new(1.5, -2.0)).unwrap();
        assert_eq!(json, r#"{"lat":1.5,"lon":-2.0}"#);
    }
}
