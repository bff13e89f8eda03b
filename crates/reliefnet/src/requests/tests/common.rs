use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use chrono::Utc;

use crate::config::CoordinationConfig;
use crate::gateway::{
    subscription_channel, GatewayError, IdentityProvider, ProfileGateway, RequestGateway,
    ShelterGateway, SnapshotSender, Subscription,
};
use crate::notify::{Alert, AlertDeliveryError, AlertSink};
use crate::profiles::{Uid, UserProfile, UserRole};
use crate::requests::domain::{
    ClaimUpdate, CompletionUpdate, NewRequest, Priority, Request, RequestId, RequestKind,
    RequestStatus,
};
use crate::requests::engine::LifecycleEngine;
use crate::shelters::{NewShelter, SafeShelter};

/// In-memory store standing in for the managed document database. Every
/// mutation re-broadcasts a full snapshot to live subscribers, matching the
/// listener contract.
#[derive(Default)]
pub(super) struct MemoryStore {
    requests: Mutex<BTreeMap<String, Request>>,
    shelters: Mutex<BTreeMap<String, SafeShelter>>,
    profiles: Mutex<HashMap<Uid, UserProfile>>,
    request_subs: Mutex<Vec<SnapshotSender<Request>>>,
    shelter_subs: Mutex<Vec<SnapshotSender<SafeShelter>>>,
    seq: AtomicU64,
}

impl MemoryStore {
    fn next_id(&self, prefix: &str) -> String {
        let n = self.seq.fetch_add(1, Ordering::Relaxed) + 1;
        format!("{prefix}-{n:06}")
    }

    pub(super) fn request_snapshot(&self) -> Vec<Request> {
        self.requests
            .lock()
            .expect("store mutex poisoned")
            .values()
            .cloned()
            .collect()
    }

    pub(super) fn get_request(&self, id: &RequestId) -> Option<Request> {
        self.requests
            .lock()
            .expect("store mutex poisoned")
            .get(&id.0)
            .cloned()
    }

    pub(super) fn insert_profile(&self, profile: UserProfile) {
        self.profiles
            .lock()
            .expect("store mutex poisoned")
            .insert(profile.uid.clone(), profile);
    }

    fn broadcast_requests(&self) {
        let snapshot = self.request_snapshot();
        self.request_subs
            .lock()
            .expect("store mutex poisoned")
            .retain(|sender| sender.send(Ok(snapshot.clone())).is_ok());
    }

    fn broadcast_shelters(&self) {
        let snapshot: Vec<SafeShelter> = self
            .shelters
            .lock()
            .expect("store mutex poisoned")
            .values()
            .filter(|shelter| shelter.is_active)
            .cloned()
            .collect();
        self.shelter_subs
            .lock()
            .expect("store mutex poisoned")
            .retain(|sender| sender.send(Ok(snapshot.clone())).is_ok());
    }
}

impl RequestGateway for MemoryStore {
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
                return Err(GatewayError::Conflict(
                    "request already claimed".to_string(),
                ));
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

impl ShelterGateway for MemoryStore {
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
        let snapshot: Vec<SafeShelter> = self
            .shelters
            .lock()
            .expect("store mutex poisoned")
            .values()
            .filter(|shelter| shelter.is_active)
            .cloned()
            .collect();
        let _ = sender.send(Ok(snapshot));
        self.shelter_subs
            .lock()
            .expect("store mutex poisoned")
            .push(sender);
        receiver
    }
}

impl ProfileGateway for MemoryStore {
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

/// Identity provider with a settable current uid.
#[derive(Default)]
pub(super) struct FixedIdentity {
    uid: Mutex<Option<Uid>>,
}

impl FixedIdentity {
    pub(super) fn signed_in(uid: &str) -> Self {
        Self {
            uid: Mutex::new(Some(Uid(uid.to_string()))),
        }
    }
}

impl IdentityProvider for FixedIdentity {
    fn current_uid(&self) -> Option<Uid> {
        self.uid.lock().expect("identity mutex poisoned").clone()
    }

    async fn sign_in_anonymously(&self) -> Result<Uid, GatewayError> {
        let mut guard = self.uid.lock().expect("identity mutex poisoned");
        let uid = guard.get_or_insert_with(|| Uid("anon-000001".to_string()));
        Ok(uid.clone())
    }
}

/// Sink recording every delivered alert.
#[derive(Default)]
pub(super) struct RecordingAlerts {
    delivered: Mutex<Vec<Alert>>,
}

impl RecordingAlerts {
    pub(super) fn delivered(&self) -> Vec<Alert> {
        self.delivered.lock().expect("alert mutex poisoned").clone()
    }
}

impl AlertSink for RecordingAlerts {
    fn deliver(&self, alert: Alert) -> Result<(), AlertDeliveryError> {
        self.delivered
            .lock()
            .expect("alert mutex poisoned")
            .push(alert);
        Ok(())
    }
}

pub(super) type TestEngine = LifecycleEngine<MemoryStore, MemoryStore, FixedIdentity, RecordingAlerts>;

pub(super) struct Harness {
    pub(super) engine: Arc<TestEngine>,
    pub(super) store: Arc<MemoryStore>,
    pub(super) identity: Arc<FixedIdentity>,
    pub(super) alerts: Arc<RecordingAlerts>,
}

pub(super) fn harness(identity: FixedIdentity) -> Harness {
    let store = Arc::new(MemoryStore::default());
    let identity = Arc::new(identity);
    let alerts = Arc::new(RecordingAlerts::default());
    let engine = Arc::new(LifecycleEngine::new(
        store.clone(),
        store.clone(),
        identity.clone(),
        alerts.clone(),
        CoordinationConfig::default(),
    ));
    Harness {
        engine,
        store,
        identity,
        alerts,
    }
}

pub(super) fn ngo_profile(uid: &str, name: &str, phone: &str) -> UserProfile {
    UserProfile {
        uid: Uid(uid.to_string()),
        role: UserRole::NgoOrg,
        display_name: Some(name.to_string()),
        victim_name: None,
        victim_phone: None,
        ngo_org_name: Some(name.to_string()),
        ngo_org_phone: Some(phone.to_string()),
        address: None,
        created_at: 0,
        updated_at: 0,
    }
}

/// Bare request fixture; tweak fields per test.
pub(super) fn request(id: &str, created_by: &str) -> Request {
    Request {
        id: RequestId(id.to_string()),
        kind: RequestKind::Rescue,
        resource_type: None,
        title: format!("Request {id}"),
        notes: None,
        lat: 28.61,
        lng: 77.21,
        priority: Priority::Medium,
        status: RequestStatus::NotServed,
        created_by: Uid(created_by.to_string()),
        claimed_by: None,
        claimed_by_ngo_name: None,
        claimed_by_ngo_phone: None,
        eta: None,
        created_at: 1_700_000_000_000,
        updated_at: 1_700_000_000_000,
        estimated_days_covered: None,
    }
}
