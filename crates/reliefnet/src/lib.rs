//! Core coordination engine for disaster-relief rescue and resource requests.
//!
//! Victims submit geolocated rescue or resource requests, NGO organizations
//! claim and complete them, and safe-shelter locations are surfaced alongside.
//! The library owns the domain model, field validation, the request lifecycle
//! engine with its notification deltas, and the gateway traits a hosting
//! service implements against its document store.

pub mod config;
pub mod error;
pub mod gateway;
pub mod geo;
pub mod notify;
pub mod profiles;
pub mod requests;
pub mod shelters;
pub mod telemetry;
pub mod validation;
