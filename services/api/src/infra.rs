//! In-memory adapters standing in for the managed document store, the
//! anonymous auth service, and device notification dispatch.

use chrono::Utc;
use metrics_exporter_prometheus::PrometheusHandle;
use reliefnet::gateway::{
    subscription_channel, GatewayError, IdentityProvider, ProfileGateway, RequestGateway,
    ShelterGateway, SnapshotSender, Subscription,
};
use reliefnet::notify::{Alert, AlertDeliveryError, AlertSink};
use reliefnet::profiles::{Uid, UserProfile};
use reliefnet::requests::{
    ClaimUpdate, CompletionUpdate, NewRequest, Request, RequestId, RequestStatus,
};
use reliefnet::shelters::{NewShelter, SafeShelter};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Document store backed by process memory. Every mutation re-broadcasts the
/// whole collection to live subscribers, matching the snapshot-listener
/// contract the engine is built against.
#[derive(Default)]
pub(crate) struct RelayStore {
    requests: Mutex<BTreeMap<String, Request>>,
    shelters: Mutex<BTreeMap<String, SafeShelter>>,
    profiles: Mutex<HashMap<Uid, UserProfile>>,
    request_subs: Mutex<Vec<SnapshotSender<Request>>>,
    shelter_subs: Mutex<Vec<SnapshotSender<SafeShelter>>>,
    seq: AtomicU64,
}

impl RelayStore {
    fn next_id(&self, prefix: &str) -> String {
        let n = self.seq.fetch_add(1, Ordering::Relaxed) + 1;
        format!("{prefix}-{n:06}")
    }

    fn request_snapshot(&self) -> Vec<Request> {
        self.requests
            .lock()
            .expect("store mutex poisoned")
            .values()
            .cloned()
            .collect()
    }

    fn shelter_snapshot(&self) -> Vec<SafeShelter> {
        self.shelters
            .lock()
            .expect("store mutex poisoned")
            .values()
            .filter(|shelter| shelter.is_active)
            .cloned()
            .collect()
    }

    fn broadcast_requests(&self) {
        let snapshot = self.request_snapshot();
        self.request_subs
            .lock()
            .expect("store mutex poisoned")
            .retain(|sender| sender.send(Ok(snapshot.clone())).is_ok());
    }

    fn broadcast_shelters(&self) {
        let snapshot = self.shelter_snapshot();
        self.shelter_subs
            .lock()
            .expect("store mutex poisoned")
            .retain(|sender| sender.send(Ok(snapshot.clone())).is_ok());
    }
}

impl RequestGateway for RelayStore {
    async fn create_request(&self, new: NewRequest) -> Result<RequestId, GatewayError> {
        let id = self.next_id("req");
        let now = Utc::now().timestamp_millis();
        let request = Request {
            id: RequestId(id.clone()),
            kind: new.kind,
            resource_type: new.resource_type,
            title: new.title,
            notes: new.notes,
            lat: new.lat,
            lng: new.lng,
            priority: new.priority,
            status: RequestStatus::NotServed,
            created_by: new.created_by,
            claimed_by: None,
            claimed_by_ngo_name: None,
            claimed_by_ngo_phone: None,
            eta: None,
            created_at: now,
            updated_at: now,
            estimated_days_covered: None,
        };
        self.requests
            .lock()
            .expect("store mutex poisoned")
            .insert(id.clone(), request);
        self.broadcast_requests();
        Ok(RequestId(id))
    }

    async fn claim_request(&self, id: &RequestId, update: ClaimUpdate) -> Result<(), GatewayError> {
        {
            let mut guard = self.requests.lock().expect("store mutex poisoned");
            let request = guard.get_mut(&id.0).ok_or(GatewayError::NotFound)?;
            if request.status != RequestStatus::NotServed {
                return Err(GatewayError::Conflict("request already claimed".to_string()));
            }
            request.status = RequestStatus::BeingServed;
            request.claimed_by = Some(update.claimed_by);
            request.claimed_by_ngo_name = update.ngo_name;
            request.claimed_by_ngo_phone = update.ngo_phone;
            request.eta = update.eta;
            request.updated_at = Utc::now().timestamp_millis();
        }
        self.broadcast_requests();
        Ok(())
    }

    async fn complete_request(
        &self,
        id: &RequestId,
        update: CompletionUpdate,
    ) -> Result<(), GatewayError> {
        {
            let mut guard = self.requests.lock().expect("store mutex poisoned");
            let request = guard.get_mut(&id.0).ok_or(GatewayError::NotFound)?;
            request.status = RequestStatus::Served;
            if update.estimated_days_covered.is_some() {
                request.estimated_days_covered = update.estimated_days_covered;
            }
            request.updated_at = Utc::now().timestamp_millis();
        }
        self.broadcast_requests();
        Ok(())
    }

    fn subscribe_requests(&self) -> Subscription<Request> {
        let (sender, receiver) = subscription_channel();
        let _ = sender.send(Ok(self.request_snapshot()));
        self.request_subs
            .lock()
            .expect("store mutex poisoned")
            .push(sender);
        receiver
    }
}

impl ShelterGateway for RelayStore {
    async fn put_shelter(&self, new: NewShelter) -> Result<String, GatewayError> {
        let id = self.next_id("shel");
        let now = Utc::now().timestamp_millis();
        let shelter = SafeShelter {
            id: id.clone(),
            name: new.name,
            address: new.address,
            lat: new.lat,
            lng: new.lng,
            capacity: new.capacity,
            current_occupancy: new.current_occupancy,
            available_spots: new.available_spots,
            contact_phone: new.contact_phone,
            contact_email: new.contact_email,
            facilities: new.facilities,
            is_active: new.is_active,
            created_at: now,
            updated_at: now,
        };
        self.shelters
            .lock()
            .expect("store mutex poisoned")
            .insert(id.clone(), shelter);
        self.broadcast_shelters();
        Ok(id)
    }

    fn subscribe_shelters(&self) -> Subscription<SafeShelter> {
        let (sender, receiver) = subscription_channel();
        let _ = sender.send(Ok(self.shelter_snapshot()));
        self.shelter_subs
            .lock()
            .expect("store mutex poisoned")
            .push(sender);
        receiver
    }
}

impl ProfileGateway for RelayStore {
    async fn get_profile(&self, uid: &Uid) -> Result<Option<UserProfile>, GatewayError> {
        Ok(self
            .profiles
            .lock()
            .expect("store mutex poisoned")
            .get(uid)
            .cloned())
    }

    async fn set_profile(&self, mut profile: UserProfile) -> Result<(), GatewayError> {
        let now = Utc::now().timestamp_millis();
        let mut guard = self.profiles.lock().expect("store mutex poisoned");
        profile.created_at = guard
            .get(&profile.uid)
            .map(|existing| existing.created_at)
            .unwrap_or(now);
        profile.updated_at = now;
        guard.insert(profile.uid.clone(), profile);
        Ok(())
    }
}

// Uids stay unique across identity instances within one process.
static NEXT_ANON: AtomicU64 = AtomicU64::new(0);

/// Anonymous auth: the first sign-in mints a uid and every later call returns
/// the same one.
#[derive(Default)]
pub(crate) struct AnonymousIdentity {
    current: Mutex<Option<Uid>>,
}

impl IdentityProvider for AnonymousIdentity {
    fn current_uid(&self) -> Option<Uid> {
        self.current.lock().expect("identity mutex poisoned").clone()
    }

    async fn sign_in_anonymously(&self) -> Result<Uid, GatewayError> {
        let mut guard = self.current.lock().expect("identity mutex poisoned");
        if let Some(uid) = guard.as_ref() {
            return Ok(uid.clone());
        }
        let n = NEXT_ANON.fetch_add(1, Ordering::Relaxed) + 1;
        let uid = Uid(format!("anon-{n:06}"));
        *guard = Some(uid.clone());
        info!(%uid, "anonymous identity issued");
        Ok(uid)
    }
}

/// Alert sink for the serve path: structured log lines instead of device
/// notifications.
#[derive(Default)]
pub(crate) struct TracingAlertSink;

impl AlertSink for TracingAlertSink {
    fn deliver(&self, alert: Alert) -> Result<(), AlertDeliveryError> {
        info!(kind = ?alert.kind, title = %alert.title, body = %alert.body, "alert dispatched");
        Ok(())
    }
}

/// Alert sink for the demo path, keeping everything delivered for printing.
#[derive(Default)]
pub(crate) struct CapturingAlertSink {
    events: Mutex<Vec<Alert>>,
}

impl CapturingAlertSink {
    pub(crate) fn drain(&self) -> Vec<Alert> {
        std::mem::take(&mut *self.events.lock().expect("alert mutex poisoned"))
    }
}

impl AlertSink for CapturingAlertSink {
    fn deliver(&self, alert: Alert) -> Result<(), AlertDeliveryError> {
        self.events
            .lock()
            .expect("alert mutex poisoned")
            .push(alert);
        Ok(())
    }
}
