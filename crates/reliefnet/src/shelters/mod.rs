//! Safe-shelter locations surfaced on the map alongside requests.
//!
//! Shelters are seeded by an administrative import (see [`seed`]) and read-only
//! for end users; only active entries reach clients.

pub mod seed;

use serde::{Deserialize, Serialize};

use crate::geo::GeoPoint;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SafeShelter {
    pub id: String,
    pub name: String,
    pub address: Option<String>,
    pub lat: f64,
    pub lng: f64,
    pub capacity: u32,
    pub current_occupancy: u32,
    pub available_spots: u32,
    pub contact_phone: Option<String>,
    pub contact_email: Option<String>,
    /// Ordered facility tags, e.g. ["Food", "Medical", "Water"].
    pub facilities: Vec<String>,
    pub is_active: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

impl SafeShelter {
    /// Display text: "available / capacity".
    pub fn availability_text(&self) -> String {
        format!("{} / {}", self.available_spots, self.capacity)
    }

    pub fn location(&self) -> GeoPoint {
        GeoPoint::new(self.lat, self.lng)
    }

    /// Whether the shelter carries a usable fix. Near-(0,0) coordinates mean
    /// the seed row had no location and the shelter must stay off the map.
    pub fn has_mappable_location(&self) -> bool {
        self.location().is_set()
    }
}

/// Shelter fields for the seed upload; the store assigns id and timestamps.
#[derive(Debug, Clone, PartialEq)]
pub struct NewShelter {
    pub name: String,
    pub address: Option<String>,
    pub lat: f64,
    pub lng: f64,
    pub capacity: u32,
    pub current_occupancy: u32,
    pub available_spots: u32,
    pub contact_phone: Option<String>,
    pub contact_email: Option<String>,
    pub facilities: Vec<String>,
    pub is_active: bool,
}
