//! Administrative CSV import for safe-shelter data.
//!
//! Rows are validated with the same field rules as the rest of the app before
//! anything is written; a bad row aborts the import with its line number so
//! operators can fix the file instead of hunting for a half-applied upload.

use std::io::Read;

use serde::{Deserialize, Deserializer};
use tracing::info;

use crate::gateway::{GatewayError, ShelterGateway};
use crate::validation::{self, ValidationError};

use super::NewShelter;

#[derive(Debug, thiserror::Error)]
pub enum SeedError {
    #[error("failed to read shelter CSV: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid shelter CSV data: {0}")]
    Csv(#[from] csv::Error),
    #[error("row {row} ({name}): {source}")]
    Row {
        row: usize,
        name: String,
        source: ValidationError,
    },
    #[error("shelter upload failed: {0}")]
    Gateway(#[from] GatewayError),
}

#[derive(Debug, Deserialize)]
struct ShelterRow {
    name: String,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    address: Option<String>,
    lat: f64,
    lng: f64,
    capacity: u32,
    current_occupancy: u32,
    available_spots: u32,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    contact_phone: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    contact_email: Option<String>,
    /// Pipe-separated facility tags, e.g. "Food|Medical|Water".
    #[serde(default)]
    facilities: String,
    #[serde(default = "default_active")]
    is_active: bool,
}

fn default_active() -> bool {
    true
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}

impl ShelterRow {
    fn validate(&self, row: usize) -> Result<(), SeedError> {
        let check = |source: ValidationError| SeedError::Row {
            row,
            name: self.name.clone(),
            source,
        };

        validation::name(&self.name).map_err(check)?;
        validation::coordinates(self.lat, self.lng).map_err(check)?;
        if let Some(address) = self.address.as_deref() {
            validation::address(address, false).map_err(check)?;
        }
        if let Some(phone) = self.contact_phone.as_deref() {
            validation::phone(phone).map_err(check)?;
        }
        if let Some(email) = self.contact_email.as_deref() {
            validation::email(email).map_err(check)?;
        }
        Ok(())
    }

    fn into_new_shelter(self) -> NewShelter {
        let facilities = self
            .facilities
            .split('|')
            .map(str::trim)
            .filter(|tag| !tag.is_empty())
            .map(str::to_string)
            .collect();

        NewShelter {
            name: self.name,
            address: self.address,
            lat: self.lat,
            lng: self.lng,
            capacity: self.capacity,
            current_occupancy: self.current_occupancy,
            available_spots: self.available_spots,
            contact_phone: self.contact_phone,
            contact_email: self.contact_email,
            facilities,
            is_active: self.is_active,
        }
    }
}

/// Parse and validate a shelter CSV without writing anything.
pub fn parse_shelters<R: Read>(reader: R) -> Result<Vec<NewShelter>, SeedError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut shelters = Vec::new();
    for (index, record) in csv_reader.deserialize::<ShelterRow>().enumerate() {
        let row = record?;
        // Header is line 1; data rows start at 2.
        row.validate(index + 2)?;
        shelters.push(row.into_new_shelter());
    }
    Ok(shelters)
}

/// Upload validated shelters through the gateway, returning assigned ids.
pub async fn upload_shelters<G: ShelterGateway>(
    gateway: &G,
    shelters: Vec<NewShelter>,
) -> Result<Vec<String>, SeedError> {
    let total = shelters.len();
    let mut ids = Vec::with_capacity(total);
    for (index, shelter) in shelters.into_iter().enumerate() {
        let name = shelter.name.clone();
        let id = gateway.put_shelter(shelter).await?;
        info!(row = index + 1, total, %name, %id, "uploaded shelter");
        ids.push(id);
    }
    Ok(ids)
}

/// Three example entries used when no CSV is supplied, matching the original
/// administrative seed data for the Delhi pilot region.
pub fn sample_shelters() -> Vec<NewShelter> {
    vec![
        NewShelter {
            name: "Community Center - Downtown".to_string(),
            address: Some("123 Main Street, Downtown Area".to_string()),
            lat: 28.6139,
            lng: 77.2090,
            capacity: 200,
            current_occupancy: 45,
            available_spots: 155,
            contact_phone: Some("+91-11-12345678".to_string()),
            contact_email: Some("downtown-shelter@example.com".to_string()),
            facilities: ["Food", "Medical", "Water", "Sanitation", "Beds"]
                .map(str::to_string)
                .to_vec(),
            is_active: true,
        },
        NewShelter {
            name: "Emergency Shelter - North Zone".to_string(),
            address: Some("456 Park Avenue, North Zone".to_string()),
            lat: 28.7041,
            lng: 77.1025,
            capacity: 150,
            current_occupancy: 30,
            available_spots: 120,
            contact_phone: Some("+91-11-23456789".to_string()),
            contact_email: Some("north-shelter@example.com".to_string()),
            facilities: ["Food", "Water", "Medical", "Beds"].map(str::to_string).to_vec(),
            is_active: true,
        },
        NewShelter {
            name: "Temporary Relief Camp - South Zone".to_string(),
            address: Some("789 High Street, South Zone".to_string()),
            lat: 28.5245,
            lng: 77.1855,
            capacity: 100,
            current_occupancy: 25,
            available_spots: 75,
            contact_phone: Some("+91-11-34567890".to_string()),
            contact_email: Some("south-shelter@example.com".to_string()),
            facilities: ["Food", "Water", "Beds"].map(str::to_string).to_vec(),
            is_active: true,
        },
    ]
}
