//! Spherical-Mercator projection between longitude/latitude and planar meters.

use std::f64::consts::FRAC_PI_4;

/// Earth radius used by spherical (web) Mercator.
pub const EARTH_RADIUS_M: f64 = 6_378_137.0;

/// A point in projected, locally Euclidean meter space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlanarPoint {
    pub x: f64,
    pub y: f64,
}

impl PlanarPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: PlanarPoint) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// Forward projection. Latitude must stay inside (-90, 90).
pub fn to_planar(lon: f64, lat: f64) -> PlanarPoint {
    debug_assert!(lat > -90.0 && lat < 90.0, "latitude {lat} outside (-90, 90)");
    let x = EARTH_RADIUS_M * lon.to_radians();
    let y = EARTH_RADIUS_M * (FRAC_PI_4 + lat.to_radians() / 2.0).tan().ln();
    PlanarPoint { x, y }
}

/// Inverse projection, returning `(lon, lat)` in degrees.
pub fn to_geographic(point: PlanarPoint) -> (f64, f64) {
    let lon = (point.x / EARTH_RADIUS_M).to_degrees();
    let lat = (2.0 * (point.y / EARTH_RADIUS_M).exp().atan() - 2.0 * FRAC_PI_4).to_degrees();
    (lon, lat)
}
