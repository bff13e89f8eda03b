//! User-facing alert construction and the dispatch port.
//!
//! Dispatch is best-effort: the engine logs delivery failures and moves on,
//! since a missed device notification must never fail a snapshot ingestion.

use serde::Serialize;

use crate::requests::domain::{Request, RequestId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum AlertKind {
    RequestAccepted,
    RequestFulfilled,
    NewRequest,
    HighPriorityNearby,
    GenericAlert,
}

/// A local device notification about one request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Alert {
    pub kind: AlertKind,
    pub title: String,
    pub body: String,
    pub request_id: Option<RequestId>,
}

impl Alert {
    /// Victim-side: an NGO took ownership of their request.
    pub fn request_accepted(request: &Request) -> Self {
        let ngo = request.claimed_by_ngo_name.as_deref().unwrap_or("an NGO");
        let mut body = format!(
            "Your request \"{}\" has been accepted by {}",
            request.title, ngo
        );
        if let Some(eta) = request.eta.as_deref().filter(|eta| !eta.trim().is_empty()) {
            body.push_str(&format!(" (ETA: {eta})"));
        }
        Self {
            kind: AlertKind::RequestAccepted,
            title: "Request Accepted".to_string(),
            body,
            request_id: Some(request.id.clone()),
        }
    }

    /// Victim-side: their request was marked served.
    pub fn request_fulfilled(request: &Request) -> Self {
        Self {
            kind: AlertKind::RequestFulfilled,
            title: "Request Fulfilled".to_string(),
            body: format!("Your request \"{}\" has been completed", request.title),
            request_id: Some(request.id.clone()),
        }
    }

    /// NGO-side: an unserved request appeared nearby.
    pub fn new_request(request: &Request) -> Self {
        Self {
            kind: AlertKind::NewRequest,
            title: format!("New {} Request", request.kind.label()),
            body: format!(
                "A new request \"{}\" has been created in your area",
                request.title
            ),
            request_id: Some(request.id.clone()),
        }
    }

    /// NGO-side: an unserved request nearby is (or became) high priority.
    pub fn high_priority_nearby(request: &Request) -> Self {
        Self {
            kind: AlertKind::HighPriorityNearby,
            title: "High Priority Request Nearby".to_string(),
            body: format!(
                "Urgent {} request: \"{}\"",
                request.kind.label(),
                request.title
            ),
            request_id: Some(request.id.clone()),
        }
    }

    pub fn generic(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            kind: AlertKind::GenericAlert,
            title: title.into(),
            body: body.into(),
            request_id: None,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AlertDeliveryError {
    #[error("alert transport unavailable: {0}")]
    Transport(String),
}

/// Outbound device-notification hook. Implementations must not block.
pub trait AlertSink: Send + Sync {
    fn deliver(&self, alert: Alert) -> Result<(), AlertDeliveryError>;
}
