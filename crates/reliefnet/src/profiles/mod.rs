//! User profiles and the role-selection/profile-edit service.
//!
//! One profile per authenticated identity, keyed by uid. Exactly one of the
//! victim or NGO field pairs is semantically active, selected by role; the
//! inactive pair stays `None`.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, put};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::gateway::{GatewayError, IdentityProvider, ProfileGateway};
use crate::validation::{self, ValidationError};

/// Opaque identity issued by the auth service.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Uid(pub String);

impl std::fmt::Display for Uid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    NgoOrg,
    Victim,
}

impl UserRole {
    pub const fn label(self) -> &'static str {
        match self {
            UserRole::NgoOrg => "NGO",
            UserRole::Victim => "Victim",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub uid: Uid,
    pub role: UserRole,
    pub display_name: Option<String>,
    pub victim_name: Option<String>,
    pub victim_phone: Option<String>,
    pub ngo_org_name: Option<String>,
    pub ngo_org_phone: Option<String>,
    pub address: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl UserProfile {
    /// The role-active name, if present.
    pub fn contact_name(&self) -> Option<&str> {
        match self.role {
            UserRole::Victim => self.victim_name.as_deref(),
            UserRole::NgoOrg => self.ngo_org_name.as_deref(),
        }
    }

    /// The role-active phone, if present.
    pub fn contact_phone(&self) -> Option<&str> {
        match self.role {
            UserRole::Victim => self.victim_phone.as_deref(),
            UserRole::NgoOrg => self.ngo_org_phone.as_deref(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ProfileError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("Not signed in")]
    NotSignedIn,
    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

/// Loads and updates the current identity's profile, validating the
/// role-active contact fields before any write.
pub struct ProfileService<P, I> {
    profiles: Arc<P>,
    identity: Arc<I>,
}

impl<P, I> ProfileService<P, I>
where
    P: ProfileGateway,
    I: IdentityProvider,
{
    pub fn new(profiles: Arc<P>, identity: Arc<I>) -> Self {
        Self { profiles, identity }
    }

    /// Fetch the current identity's profile. `Ok(None)` means the identity has
    /// not yet completed role selection.
    pub async fn load(&self) -> Result<Option<UserProfile>, ProfileError> {
        let uid = self.identity.current_uid().ok_or(ProfileError::NotSignedIn)?;
        Ok(self.profiles.get_profile(&uid).await?)
    }

    /// Validate and upsert the current identity's profile. Also serves as the
    /// first-use role-selection step.
    pub async fn save(&self, mut profile: UserProfile) -> Result<(), ProfileError> {
        let uid = self.identity.current_uid().ok_or(ProfileError::NotSignedIn)?;

        validation::name(profile.contact_name().unwrap_or(""))?;
        validation::phone(profile.contact_phone().unwrap_or(""))?;
        if let Some(address) = profile.address.as_deref() {
            if !address.trim().is_empty() {
                validation::address(address, false)?;
            }
        }

        profile.uid = uid;
        self.profiles.set_profile(profile).await?;
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
pub struct ProfileUpdate {
    pub role: UserRole,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub victim_name: Option<String>,
    #[serde(default)]
    pub victim_phone: Option<String>,
    #[serde(default)]
    pub ngo_org_name: Option<String>,
    #[serde(default)]
    pub ngo_org_phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

/// HTTP surface for profile load and edit.
pub fn profile_router<P, I>(service: Arc<ProfileService<P, I>>) -> Router
where
    P: ProfileGateway + 'static,
    I: IdentityProvider + 'static,
{
    Router::new()
        .route("/api/v1/profile", get(load_handler::<P, I>))
        .route("/api/v1/profile", put(save_handler::<P, I>))
        .with_state(service)
}

async fn load_handler<P, I>(State(service): State<Arc<ProfileService<P, I>>>) -> Response
where
    P: ProfileGateway + 'static,
    I: IdentityProvider + 'static,
{
    match service.load().await {
        Ok(Some(profile)) => (StatusCode::OK, Json(profile)).into_response(),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "profile not created yet" })),
        )
            .into_response(),
        Err(err) => profile_error_response(err),
    }
}

async fn save_handler<P, I>(
    State(service): State<Arc<ProfileService<P, I>>>,
    Json(update): Json<ProfileUpdate>,
) -> Response
where
    P: ProfileGateway + 'static,
    I: IdentityProvider + 'static,
{
    let profile = UserProfile {
        // Overwritten by the service from the current identity.
        uid: Uid(String::new()),
        role: update.role,
        display_name: update.display_name,
        victim_name: update.victim_name,
        victim_phone: update.victim_phone,
        ngo_org_name: update.ngo_org_name,
        ngo_org_phone: update.ngo_org_phone,
        address: update.address,
        created_at: 0,
        updated_at: 0,
    };

    match service.save(profile).await {
        Ok(()) => (StatusCode::OK, Json(json!({ "status": "saved" }))).into_response(),
        Err(err) => profile_error_response(err),
    }
}

fn profile_error_response(err: ProfileError) -> Response {
    let status = match &err {
        ProfileError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        ProfileError::NotSignedIn => StatusCode::UNAUTHORIZED,
        ProfileError::Gateway(GatewayError::NotFound) => StatusCode::NOT_FOUND,
        ProfileError::Gateway(GatewayError::Conflict(_)) => StatusCode::CONFLICT,
        ProfileError::Gateway(_) => StatusCode::SERVICE_UNAVAILABLE,
    };
    (status, Json(json!({ "error": err.to_string() }))).into_response()
}
