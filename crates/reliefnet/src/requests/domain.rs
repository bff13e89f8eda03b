use serde::{Deserialize, Serialize};

use crate::geo::GeoPoint;
use crate::profiles::Uid;

/// Identifier wrapper for rescue/resource requests. Assigned by the store on
/// creation, never by the client.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestId(pub String);

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequestKind {
    Rescue,
    Resource,
}

impl RequestKind {
    pub const fn label(self) -> &'static str {
        match self {
            RequestKind::Rescue => "Rescue",
            RequestKind::Resource => "Resource",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    /// Sort weight: higher is more urgent.
    pub const fn rank(self) -> u8 {
        match self {
            Priority::High => 3,
            Priority::Medium => 2,
            Priority::Low => 1,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Priority::High => "High",
            Priority::Medium => "Medium",
            Priority::Low => "Low",
        }
    }
}

/// Monotonic lifecycle: NotServed --claim--> BeingServed --complete--> Served.
/// No transition reopens or releases a claimed request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequestStatus {
    NotServed,
    BeingServed,
    Served,
}

impl RequestStatus {
    pub const fn label(self) -> &'static str {
        match self {
            RequestStatus::NotServed => "Not served",
            RequestStatus::BeingServed => "Being served",
            RequestStatus::Served => "Served",
        }
    }
}

/// A victim-submitted rescue or resource request as stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    pub id: RequestId,
    pub kind: RequestKind,
    /// Free text, meaningful only when `kind` is `Resource`.
    pub resource_type: Option<String>,
    pub title: String,
    pub notes: Option<String>,
    pub lat: f64,
    pub lng: f64,
    pub priority: Priority,
    pub status: RequestStatus,
    pub created_by: Uid,
    pub claimed_by: Option<Uid>,
    pub claimed_by_ngo_name: Option<String>,
    pub claimed_by_ngo_phone: Option<String>,
    /// Free-text estimated time of arrival supplied by the claiming NGO.
    pub eta: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
    /// Meaningful only for Resource completions.
    pub estimated_days_covered: Option<u32>,
}

impl Request {
    pub fn location(&self) -> GeoPoint {
        GeoPoint::new(self.lat, self.lng)
    }
}

/// What a victim submits before identity and coordinates are resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestDraft {
    pub kind: RequestKind,
    #[serde(default)]
    pub resource_type: Option<String>,
    pub title: String,
    #[serde(default)]
    pub notes: Option<String>,
    pub priority: Priority,
}

/// A validated draft ready for the store, which assigns id and timestamps.
#[derive(Debug, Clone, PartialEq)]
pub struct NewRequest {
    pub kind: RequestKind,
    pub resource_type: Option<String>,
    pub title: String,
    pub notes: Option<String>,
    pub lat: f64,
    pub lng: f64,
    pub priority: Priority,
    pub created_by: Uid,
}

/// Field patch applied when an NGO takes ownership of a request.
#[derive(Debug, Clone, PartialEq)]
pub struct ClaimUpdate {
    pub claimed_by: Uid,
    pub ngo_name: Option<String>,
    pub ngo_phone: Option<String>,
    pub eta: Option<String>,
}

/// Field patch applied when the claiming NGO marks a request fulfilled.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionUpdate {
    pub estimated_days_covered: Option<u32>,
}
