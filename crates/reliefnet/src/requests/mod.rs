//! Rescue/resource request lifecycle: domain records, filtering and ordering,
//! the snapshot-driven engine, and the HTTP surface over it.

pub mod domain;
pub mod engine;
pub mod router;
pub mod view;

#[cfg(test)]
mod tests;

pub use domain::{
    ClaimUpdate, CompletionUpdate, NewRequest, Priority, Request, RequestDraft, RequestId,
    RequestKind, RequestStatus,
};
pub use engine::{EngineError, LifecycleEngine};
pub use router::{request_router, RequestRow, ShelterRow};
pub use view::{FilterState, SortOrder};
