//! Pure filtering and ordering over a request snapshot. Filters are
//! independent and conjunctive; all sorts are stable so ties keep their
//! snapshot order.

use serde::{Deserialize, Serialize};

use crate::geo::{self, GeoPoint};
use crate::profiles::Uid;

use super::domain::{Priority, Request, RequestKind, RequestStatus};

/// Active list filters. Kind and mine-only serve the victim view; priority and
/// status serve the NGO console.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterState {
    pub kind: Option<RequestKind>,
    pub mine_only: bool,
    pub priority: Option<Priority>,
    pub status: Option<RequestStatus>,
}

/// Closed set of NGO sort orders.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    #[default]
    Priority,
    Distance,
    Date,
}

pub fn filter_requests(
    requests: &[Request],
    filters: &FilterState,
    viewer: Option<&Uid>,
) -> Vec<Request> {
    requests
        .iter()
        .filter(|request| {
            filters
                .kind
                .map(|kind| request.kind == kind)
                .unwrap_or(true)
        })
        .filter(|request| {
            if !filters.mine_only {
                return true;
            }
            viewer
                .map(|uid| &request.created_by == uid)
                .unwrap_or(false)
        })
        .filter(|request| {
            filters
                .priority
                .map(|priority| request.priority == priority)
                .unwrap_or(true)
        })
        .filter(|request| {
            filters
                .status
                .map(|status| request.status == status)
                .unwrap_or(true)
        })
        .cloned()
        .collect()
}

/// Order a request list. Distance sorting without any location is a no-op,
/// not an error.
pub fn sort_requests(
    mut requests: Vec<Request>,
    order: SortOrder,
    location: Option<GeoPoint>,
) -> Vec<Request> {
    match order {
        SortOrder::Priority => {
            requests.sort_by(|a, b| b.priority.rank().cmp(&a.priority.rank()));
        }
        SortOrder::Distance => {
            if let Some(here) = location {
                requests.sort_by(|a, b| {
                    let da = geo::distance_km(here, a.location());
                    let db = geo::distance_km(here, b.location());
                    da.partial_cmp(&db).unwrap_or(std::cmp::Ordering::Equal)
                });
            }
        }
        SortOrder::Date => {
            requests.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        }
    }
    requests
}
