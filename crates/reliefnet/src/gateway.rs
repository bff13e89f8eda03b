//! Ports to the external collaborators: the document store, the identity
//! provider, and device notification dispatch. The engine receives concrete
//! implementations by constructor injection and never reaches for process-wide
//! singletons.
//!
//! Subscriptions follow the managed store's listener model: every change to
//! the underlying collection delivers a fresh whole-collection snapshot, and
//! store failures arrive as error events rather than silently terminating the
//! stream. Dropping the receiver unsubscribes.

use std::future::Future;

use tokio::sync::mpsc;

use crate::profiles::{Uid, UserProfile};
use crate::requests::domain::{ClaimUpdate, CompletionUpdate, NewRequest, Request, RequestId};
use crate::shelters::{NewShelter, SafeShelter};

/// One delivery on a collection subscription: a full snapshot or a store error.
pub type SnapshotEvent<T> = Result<Vec<T>, GatewayError>;

/// Push-based snapshot stream for one collection.
pub type Subscription<T> = mpsc::UnboundedReceiver<SnapshotEvent<T>>;

/// Sending half kept by gateway implementations for fan-out.
pub type SnapshotSender<T> = mpsc::UnboundedSender<SnapshotEvent<T>>;

pub fn subscription_channel<T>() -> (SnapshotSender<T>, Subscription<T>) {
    mpsc::unbounded_channel()
}

/// Store/network failures, surfaced verbatim with no automatic retry.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GatewayError {
    #[error("document not found")]
    NotFound,
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("authentication failed: {0}")]
    Auth(String),
}

/// Document-store operations for the requests collection.
pub trait RequestGateway: Send + Sync {
    /// Persist a new request. The store assigns the id and stamps
    /// created_at/updated_at.
    fn create_request(
        &self,
        new: NewRequest,
    ) -> impl Future<Output = Result<RequestId, GatewayError>> + Send;

    /// Apply the claim field patch. Conditional on the stored status still
    /// being NotServed; a lost race surfaces as `Conflict`.
    fn claim_request(
        &self,
        id: &RequestId,
        update: ClaimUpdate,
    ) -> impl Future<Output = Result<(), GatewayError>> + Send;

    /// Mark the request served. Unconditional: the caller UI restricts who may
    /// complete, the store does not.
    fn complete_request(
        &self,
        id: &RequestId,
        update: CompletionUpdate,
    ) -> impl Future<Output = Result<(), GatewayError>> + Send;

    /// Subscribe to whole-collection snapshots, starting with the current one.
    fn subscribe_requests(&self) -> Subscription<Request>;
}

/// Document-store operations for the safe-shelters collection.
pub trait ShelterGateway: Send + Sync {
    fn put_shelter(
        &self,
        new: NewShelter,
    ) -> impl Future<Output = Result<String, GatewayError>> + Send;

    /// Active shelters only; inactive entries are never surfaced to clients.
    fn subscribe_shelters(&self) -> Subscription<SafeShelter>;
}

/// Document-store operations for user profiles, keyed by uid.
pub trait ProfileGateway: Send + Sync {
    fn get_profile(
        &self,
        uid: &Uid,
    ) -> impl Future<Output = Result<Option<UserProfile>, GatewayError>> + Send;

    fn set_profile(
        &self,
        profile: UserProfile,
    ) -> impl Future<Output = Result<(), GatewayError>> + Send;
}

/// Anonymous identity issuance, as provided by the managed auth service.
pub trait IdentityProvider: Send + Sync {
    fn current_uid(&self) -> Option<Uid>;

    fn sign_in_anonymously(&self) -> impl Future<Output = Result<Uid, GatewayError>> + Send;
}
