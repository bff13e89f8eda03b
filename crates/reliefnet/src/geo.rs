//! Great-circle distance math for proximity alerts and distance sorting.

use serde::{Deserialize, Serialize};

/// Mean Earth radius in kilometers.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Coordinates closer than this to zero on either axis are treated as unset.
/// Device location pickers in the field app default to (0, 0) when no fix is
/// available, so a near-null island point means "no location", not the Gulf of
/// Guinea.
pub const UNSET_COORD_EPSILON: f64 = 0.0001;

/// A WGS-84 point in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Whether both components are in range and far enough from zero to count
    /// as a real fix.
    pub fn is_set(&self) -> bool {
        (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
            && self.lat.abs() >= UNSET_COORD_EPSILON
            && self.lng.abs() >= UNSET_COORD_EPSILON
    }
}

/// Haversine distance between two points, in kilometers.
pub fn distance_km(a: GeoPoint, b: GeoPoint) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let dlat = (b.lat - a.lat).to_radians();
    let dlng = (b.lng - a.lng).to_radians();

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlng / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_KM * c
}
