//! Geographic coordinates.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::RouteError;

/// Mean Earth radius used for all distance computations, in meters.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// A WGS84-style coordinate.
///
/// Serialized as `{"lat": .., "lng": ..}`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    /// Creates a point without validating it.
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Checks that both components are finite and within WGS84 bounds.
    pub fn validate(&self) -> Result<(), RouteError> {
        if !self.lat.is_finite() || !self.lng.is_finite() {
            return Err(RouteError::InvalidInput(format!(
                "coordinate {self} is not finite"
            )));
        }
        if !(-90.0..=90.0).contains(&self.lat) {
            return Err(RouteError::InvalidInput(format!(
                "latitude {} is out of range",
                self.lat
            )));
        }
        if !(-180.0..=180.0).contains(&self.lng) {
            return Err(RouteError::InvalidInput(format!(
                "longitude {} is out of range",
                self.lng
            )));
        }
        Ok(())
    }

    /// Great-circle distance to `other`, in meters.
    pub fn distance_to(&self, other: &GeoPoint) -> f64 {
        haversine_meters(self, other)
    }

    /// Returns the point as an `[x, y]` pair (longitude first).
    pub fn to_xy(self) -> [f64; 2] {
        [self.lng, self.lat]
    }
}

impl From<geo::Coord<f64>> for GeoPoint {
    fn from(c: geo::Coord<f64>) -> Self {
        Self { lat: c.y, lng: c.x }
    }
}

impl From<GeoPoint> for geo::Point<f64> {
    fn from(p: GeoPoint) -> Self {
        geo::Point::new(p.lng, p.lat)
    }
}

impl fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.lat, self.lng)
    }
}

/// Haversine distance between two points, in meters.
pub fn haversine_meters(a: &GeoPoint, b: &GeoPoint) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let delta_lat = lat2 - lat1;
    let delta_lng = (b.lng - a.lng).to_radians();

    let h = (delta_lat / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * (delta_lng / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());
    EARTH_RADIUS_M * c
}
