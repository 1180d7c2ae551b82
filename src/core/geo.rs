//! Great-circle distance for radius search.
//!
//! Distances are computed in process over an already-bounded candidate set,
//! so coordinates never end up inside a query string.

use crate::entities::property;
use serde::{Deserialize, Serialize};

/// Mean Earth radius used by the haversine formula.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// A latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    /// Latitude, -90..=90
    pub lat: f64,
    /// Longitude, -180..=180
    pub long: f64,
}

impl GeoPoint {
    /// Creates a point without range checks.
    #[must_use]
    pub const fn new(lat: f64, long: f64) -> Self {
        Self { lat, long }
    }

    /// Whether both coordinates are finite and within their valid ranges.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.long.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.long)
    }
}

impl From<&property::Model> for GeoPoint {
    fn from(property: &property::Model) -> Self {
        Self::new(property.lat, property.long)
    }
}

/// Haversine distance between two points in kilometres:
/// `2r * asin(sqrt(sin²(Δlat/2) + cos(lat1) cos(lat2) sin²(Δlong/2)))`.
#[must_use]
pub fn haversine_km(a: GeoPoint, b: GeoPoint) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let half_dlat = (lat2 - lat1) / 2.0;
    let half_dlong = (b.long - a.long).to_radians() / 2.0;

    let h = half_dlat.sin().powi(2) + lat1.cos() * lat2.cos() * half_dlong.sin().powi(2);
    // Rounding can push h marginally above 1 for antipodal points
    2.0 * EARTH_RADIUS_KM * h.sqrt().min(1.0).asin()
}

/// Whether `location` lies strictly closer than `radius_km` to `point`.
#[must_use]
pub fn within_radius(point: GeoPoint, location: GeoPoint, radius_km: f64) -> bool {
    point == location || haversine_km(point, location) < radius_km
}
