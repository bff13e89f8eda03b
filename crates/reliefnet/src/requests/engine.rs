//! The request lifecycle engine.
//!
//! Owns the in-memory request/shelter snapshots pushed by the store
//! subscription, recomputes filtered/sorted views, drives the claim/complete
//! transitions, and diffs consecutive snapshots to decide which device alerts
//! to raise. One engine instance serves one viewer (identity plus role).

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tracing::{debug, warn};

use crate::config::CoordinationConfig;
use crate::gateway::{
    GatewayError, IdentityProvider, ProfileGateway, RequestGateway, Subscription,
};
use crate::geo::{self, GeoPoint};
use crate::notify::{Alert, AlertSink};
use crate::profiles::{Uid, UserRole};
use crate::shelters::SafeShelter;
use crate::validation::{self, ValidationError};

use super::domain::{
    ClaimUpdate, CompletionUpdate, NewRequest, Priority, Request, RequestDraft, RequestId,
    RequestStatus,
};
use super::view::{self, FilterState, SortOrder};

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("Not signed in")]
    NotSignedIn,
    #[error("Location not available. Grant location permission or pick a point on the map.")]
    LocationUnavailable,
    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

struct EngineState {
    requests: Vec<Request>,
    shelters: Vec<SafeShelter>,
    /// Previous snapshot keyed by id, used purely for transition detection.
    previous: HashMap<RequestId, Request>,
    first_load: bool,
    filters: FilterState,
    sort: SortOrder,
    viewer_role: Option<UserRole>,
    last_location: Option<GeoPoint>,
}

impl EngineState {
    fn new() -> Self {
        Self {
            requests: Vec::new(),
            shelters: Vec::new(),
            previous: HashMap::new(),
            first_load: true,
            filters: FilterState::default(),
            sort: SortOrder::default(),
            viewer_role: None,
            last_location: None,
        }
    }
}

pub struct LifecycleEngine<R, P, I, N> {
    requests_gw: Arc<R>,
    profiles: Arc<P>,
    identity: Arc<I>,
    alerts: Arc<N>,
    config: CoordinationConfig,
    state: Mutex<EngineState>,
}

impl<R, P, I, N> LifecycleEngine<R, P, I, N>
where
    R: RequestGateway,
    P: ProfileGateway,
    I: IdentityProvider,
    N: AlertSink,
{
    pub fn new(
        requests_gw: Arc<R>,
        profiles: Arc<P>,
        identity: Arc<I>,
        alerts: Arc<N>,
        config: CoordinationConfig,
    ) -> Self {
        Self {
            requests_gw,
            profiles,
            identity,
            alerts,
            config,
            state: Mutex::new(EngineState::new()),
        }
    }

    // --- snapshot ingestion -------------------------------------------------

    /// Replace the request snapshot and raise alerts for the transitions it
    /// contains. The first ingestion after (re)start is baseline-only so a
    /// fresh subscription does not replay the whole backlog as notifications.
    /// Returns the alerts dispatched, in request order.
    pub fn ingest_request_snapshot(&self, snapshot: Vec<Request>) -> Vec<Alert> {
        let alerts = {
            let mut state = self.state.lock().expect("engine state mutex poisoned");

            let alerts = if state.first_load {
                state.first_load = false;
                Vec::new()
            } else {
                match state.viewer_role {
                    Some(UserRole::Victim) => match self.identity.current_uid() {
                        Some(uid) => victim_alerts(&state.previous, &snapshot, &uid),
                        None => Vec::new(),
                    },
                    Some(UserRole::NgoOrg) => ngo_alerts(
                        &state.previous,
                        &snapshot,
                        state.last_location,
                        self.config.notify_radius_km,
                    ),
                    None => Vec::new(),
                }
            };

            state.previous = snapshot
                .iter()
                .map(|request| (request.id.clone(), request.clone()))
                .collect();
            state.requests = snapshot;
            alerts
        };

        for alert in &alerts {
            if let Err(err) = self.alerts.deliver(alert.clone()) {
                warn!(%err, kind = ?alert.kind, "dropping undeliverable alert");
            }
        }
        alerts
    }

    /// Replace the shelter snapshot. Inactive shelters are dropped even if the
    /// store delivered them.
    pub fn ingest_shelter_snapshot(&self, snapshot: Vec<SafeShelter>) {
        let mut state = self.state.lock().expect("engine state mutex poisoned");
        state.shelters = snapshot
            .into_iter()
            .filter(|shelter| shelter.is_active)
            .collect();
    }

    /// Drive the engine from the store subscriptions until both close. Error
    /// events are logged and the loop keeps waiting for the next snapshot,
    /// mirroring the listener contract.
    pub async fn run_ingest_loop(
        &self,
        mut requests: Subscription<Request>,
        mut shelters: Subscription<SafeShelter>,
    ) {
        let mut requests_open = true;
        let mut shelters_open = true;

        while requests_open || shelters_open {
            tokio::select! {
                event = requests.recv(), if requests_open => match event {
                    Some(Ok(snapshot)) => {
                        debug!(count = snapshot.len(), "request snapshot received");
                        self.ingest_request_snapshot(snapshot);
                    }
                    Some(Err(err)) => warn!(%err, "request subscription error event"),
                    None => requests_open = false,
                },
                event = shelters.recv(), if shelters_open => match event {
                    Some(Ok(snapshot)) => {
                        debug!(count = snapshot.len(), "shelter snapshot received");
                        self.ingest_shelter_snapshot(snapshot);
                    }
                    Some(Err(err)) => warn!(%err, "shelter subscription error event"),
                    None => shelters_open = false,
                },
            }
        }
    }

    // --- views --------------------------------------------------------------

    /// Latest committed request snapshot, unfiltered.
    pub fn requests(&self) -> Vec<Request> {
        self.state
            .lock()
            .expect("engine state mutex poisoned")
            .requests
            .clone()
    }

    /// Active shelters from the latest snapshot.
    pub fn active_shelters(&self) -> Vec<SafeShelter> {
        self.state
            .lock()
            .expect("engine state mutex poisoned")
            .shelters
            .clone()
    }

    /// Apply the active filters: kind, then mine-only, then priority, then
    /// status, conjunctively.
    pub fn filtered_requests(&self) -> Vec<Request> {
        let state = self.state.lock().expect("engine state mutex poisoned");
        view::filter_requests(
            &state.requests,
            &state.filters,
            self.identity.current_uid().as_ref(),
        )
    }

    /// Order a list by the active sort order. The supplied location wins over
    /// the last known one; with neither, distance sorting leaves the order
    /// unchanged.
    pub fn sorted_requests(
        &self,
        requests: Vec<Request>,
        location: Option<GeoPoint>,
    ) -> Vec<Request> {
        let state = self.state.lock().expect("engine state mutex poisoned");
        view::sort_requests(requests, state.sort, location.or(state.last_location))
    }

    /// Filtered then sorted, the list a client renders.
    pub fn visible_requests(&self) -> Vec<Request> {
        let filtered = self.filtered_requests();
        self.sorted_requests(filtered, None)
    }

    /// Stateless variant for the HTTP surface: apply caller-supplied filters
    /// and sort order against the latest snapshot without touching the stored
    /// filter state.
    pub fn query_requests(
        &self,
        filters: FilterState,
        sort: SortOrder,
        location: Option<GeoPoint>,
    ) -> Vec<Request> {
        let state = self.state.lock().expect("engine state mutex poisoned");
        let filtered = view::filter_requests(
            &state.requests,
            &filters,
            self.identity.current_uid().as_ref(),
        );
        view::sort_requests(filtered, sort, location.or(state.last_location))
    }

    // --- mutations ----------------------------------------------------------

    /// Validate and persist a new request. `lat`/`lng` are the caller-resolved
    /// coordinates (picked point or fresh fix); absent those, the last known
    /// device fix is used, and with no source at all the operation fails
    /// without touching the store.
    pub async fn create_request(
        &self,
        draft: RequestDraft,
        lat: Option<f64>,
        lng: Option<f64>,
    ) -> Result<RequestId, EngineError> {
        let fallback = {
            let state = self.state.lock().expect("engine state mutex poisoned");
            state.last_location
        };
        let (lat, lng) = match (lat, lng) {
            (Some(lat), Some(lng)) => (lat, lng),
            _ => fallback
                .map(|loc| (loc.lat, loc.lng))
                .ok_or(EngineError::LocationUnavailable)?,
        };

        validation::title(&draft.title)?;
        validation::coordinates(lat, lng)?;
        validation::notes(draft.notes.as_deref().unwrap_or(""), false)?;

        let created_by = match self.identity.current_uid() {
            Some(uid) => uid,
            None => self.identity.sign_in_anonymously().await?,
        };

        let id = self
            .requests_gw
            .create_request(NewRequest {
                kind: draft.kind,
                resource_type: draft.resource_type,
                title: draft.title,
                notes: draft.notes,
                lat,
                lng,
                priority: draft.priority,
                created_by,
            })
            .await?;
        Ok(id)
    }

    /// Take ownership of a request: status becomes BeingServed and the
    /// claimant's NGO contact details are stamped from their profile (absent
    /// profile fields are tolerated).
    pub async fn claim_request(
        &self,
        id: &RequestId,
        eta: Option<String>,
    ) -> Result<(), EngineError> {
        let uid = self.identity.current_uid().ok_or(EngineError::NotSignedIn)?;
        let profile = self.profiles.get_profile(&uid).await?;

        let update = ClaimUpdate {
            claimed_by: uid,
            ngo_name: profile.as_ref().and_then(|p| p.ngo_org_name.clone()),
            ngo_phone: profile.as_ref().and_then(|p| p.ngo_org_phone.clone()),
            eta,
        };
        self.requests_gw.claim_request(id, update).await?;
        Ok(())
    }

    /// Mark a request served, optionally recording how many days of supplies
    /// the completion covers.
    pub async fn complete_request(
        &self,
        id: &RequestId,
        estimated_days_covered: Option<u32>,
    ) -> Result<(), EngineError> {
        validation::estimated_days(estimated_days_covered)?;
        self.requests_gw
            .complete_request(
                id,
                CompletionUpdate {
                    estimated_days_covered,
                },
            )
            .await?;
        Ok(())
    }

    // --- viewer context and filter setters ----------------------------------

    pub fn set_viewer_role(&self, role: Option<UserRole>) {
        self.state
            .lock()
            .expect("engine state mutex poisoned")
            .viewer_role = role;
    }

    pub fn set_last_location(&self, location: Option<GeoPoint>) {
        self.state
            .lock()
            .expect("engine state mutex poisoned")
            .last_location = location;
    }

    pub fn set_kind_filter(&self, kind: Option<super::domain::RequestKind>) {
        self.state
            .lock()
            .expect("engine state mutex poisoned")
            .filters
            .kind = kind;
    }

    pub fn set_mine_only(&self, mine_only: bool) {
        self.state
            .lock()
            .expect("engine state mutex poisoned")
            .filters
            .mine_only = mine_only;
    }

    pub fn set_priority_filter(&self, priority: Option<Priority>) {
        self.state
            .lock()
            .expect("engine state mutex poisoned")
            .filters
            .priority = priority;
    }

    pub fn set_status_filter(&self, status: Option<RequestStatus>) {
        self.state
            .lock()
            .expect("engine state mutex poisoned")
            .filters
            .status = status;
    }

    pub fn set_sort_order(&self, order: SortOrder) {
        self.state.lock().expect("engine state mutex poisoned").sort = order;
    }

    /// Reset the NGO console filters to their defaults.
    pub fn clear_ngo_filters(&self) {
        let mut state = self.state.lock().expect("engine state mutex poisoned");
        state.filters.priority = None;
        state.filters.status = None;
        state.sort = SortOrder::Priority;
    }

    pub fn filter_state(&self) -> FilterState {
        self.state
            .lock()
            .expect("engine state mutex poisoned")
            .filters
            .clone()
    }

    pub fn sort_order(&self) -> SortOrder {
        self.state.lock().expect("engine state mutex poisoned").sort
    }
}

/// Victim-side transition alerts: their own requests moving into BeingServed
/// or Served since the previous snapshot.
fn victim_alerts(
    previous: &HashMap<RequestId, Request>,
    snapshot: &[Request],
    viewer: &Uid,
) -> Vec<Alert> {
    let mut alerts = Vec::new();
    for request in snapshot {
        if &request.created_by != viewer {
            continue;
        }
        let Some(old) = previous.get(&request.id) else {
            continue;
        };
        if old.status != RequestStatus::BeingServed && request.status == RequestStatus::BeingServed
        {
            alerts.push(Alert::request_accepted(request));
        }
        if old.status != RequestStatus::Served && request.status == RequestStatus::Served {
            alerts.push(Alert::request_fulfilled(request));
        }
    }
    alerts
}

/// NGO-side alerts: brand-new unserved requests and newly high-priority
/// unserved requests, both gated on the notification radius. An unknown
/// viewer location means everything counts as nearby.
fn ngo_alerts(
    previous: &HashMap<RequestId, Request>,
    snapshot: &[Request],
    location: Option<GeoPoint>,
    radius_km: f64,
) -> Vec<Alert> {
    let nearby = |request: &Request| {
        location
            .map(|here| geo::distance_km(here, request.location()) <= radius_km)
            .unwrap_or(true)
    };

    let mut alerts = Vec::new();
    for request in snapshot {
        if request.status != RequestStatus::NotServed {
            continue;
        }
        let old = previous.get(&request.id);

        if old.is_none() && nearby(request) {
            alerts.push(Alert::new_request(request));
        }

        let newly_high = request.priority == Priority::High
            && old.map(|o| o.priority != Priority::High).unwrap_or(true);
        if newly_high && nearby(request) {
            alerts.push(Alert::high_priority_nearby(request));
        }
    }
    alerts
}
