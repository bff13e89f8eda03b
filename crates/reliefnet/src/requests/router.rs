use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::gateway::{GatewayError, IdentityProvider, ProfileGateway, RequestGateway};
use crate::geo::GeoPoint;
use crate::notify::AlertSink;

use super::domain::{Priority, Request, RequestDraft, RequestId, RequestKind, RequestStatus};
use super::engine::{EngineError, LifecycleEngine};
use super::view::{FilterState, SortOrder};

/// Router builder exposing the request lifecycle and shelter map endpoints.
pub fn request_router<R, P, I, N>(engine: Arc<LifecycleEngine<R, P, I, N>>) -> Router
where
    R: RequestGateway + 'static,
    P: ProfileGateway + 'static,
    I: IdentityProvider + 'static,
    N: AlertSink + 'static,
{
    Router::new()
        .route("/api/v1/requests", post(create_handler::<R, P, I, N>))
        .route("/api/v1/requests", get(list_handler::<R, P, I, N>))
        .route(
            "/api/v1/requests/:request_id/claim",
            post(claim_handler::<R, P, I, N>),
        )
        .route(
            "/api/v1/requests/:request_id/complete",
            post(complete_handler::<R, P, I, N>),
        )
        .route("/api/v1/shelters", get(shelters_handler::<R, P, I, N>))
        .with_state(engine)
}

#[derive(Debug, Deserialize)]
pub(crate) struct CreateRequestBody {
    pub kind: RequestKind,
    #[serde(default)]
    pub resource_type: Option<String>,
    pub title: String,
    #[serde(default)]
    pub notes: Option<String>,
    pub priority: Priority,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lng: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ClaimBody {
    #[serde(default)]
    pub eta: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CompleteBody {
    #[serde(default)]
    pub estimated_days_covered: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ListQuery {
    #[serde(default)]
    kind: Option<RequestKind>,
    #[serde(default)]
    mine_only: bool,
    #[serde(default)]
    priority: Option<Priority>,
    #[serde(default)]
    status: Option<RequestStatus>,
    #[serde(default)]
    sort: Option<SortOrder>,
    #[serde(default)]
    lat: Option<f64>,
    #[serde(default)]
    lng: Option<f64>,
}

/// One row of the rendered request list.
#[derive(Debug, Serialize)]
pub struct RequestRow {
    pub id: RequestId,
    pub kind: RequestKind,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub priority: Priority,
    pub priority_label: &'static str,
    pub status: RequestStatus,
    pub status_label: &'static str,
    pub lat: f64,
    pub lng: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub claimed_by_ngo_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub claimed_by_ngo_phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eta: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_days_covered: Option<u32>,
}

impl From<Request> for RequestRow {
    fn from(request: Request) -> Self {
        Self {
            priority_label: request.priority.label(),
            status_label: request.status.label(),
            id: request.id,
            kind: request.kind,
            title: request.title,
            resource_type: request.resource_type,
            notes: request.notes,
            priority: request.priority,
            status: request.status,
            lat: request.lat,
            lng: request.lng,
            claimed_by_ngo_name: request.claimed_by_ngo_name,
            claimed_by_ngo_phone: request.claimed_by_ngo_phone,
            eta: request.eta,
            created_at: request.created_at,
            updated_at: request.updated_at,
            estimated_days_covered: request.estimated_days_covered,
        }
    }
}

/// One shelter as rendered on the map screen. `location` is absent when the
/// seed row carried no usable coordinates.
#[derive(Debug, Serialize)]
pub struct ShelterRow {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<GeoPoint>,
    pub availability: String,
    pub capacity: u32,
    pub available_spots: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_email: Option<String>,
    pub facilities: Vec<String>,
}

async fn create_handler<R, P, I, N>(
    State(engine): State<Arc<LifecycleEngine<R, P, I, N>>>,
    Json(body): Json<CreateRequestBody>,
) -> Response
where
    R: RequestGateway + 'static,
    P: ProfileGateway + 'static,
    I: IdentityProvider + 'static,
    N: AlertSink + 'static,
{
    let CreateRequestBody {
        kind,
        resource_type,
        title,
        notes,
        priority,
        lat,
        lng,
    } = body;

    let draft = RequestDraft {
        kind,
        resource_type,
        title,
        notes,
        priority,
    };

    match engine.create_request(draft, lat, lng).await {
        Ok(id) => (StatusCode::CREATED, Json(json!({ "id": id }))).into_response(),
        Err(err) => engine_error_response(err),
    }
}

async fn list_handler<R, P, I, N>(
    State(engine): State<Arc<LifecycleEngine<R, P, I, N>>>,
    Query(query): Query<ListQuery>,
) -> Json<Vec<RequestRow>>
where
    R: RequestGateway + 'static,
    P: ProfileGateway + 'static,
    I: IdentityProvider + 'static,
    N: AlertSink + 'static,
{
    let filters = FilterState {
        kind: query.kind,
        mine_only: query.mine_only,
        priority: query.priority,
        status: query.status,
    };
    let location = match (query.lat, query.lng) {
        (Some(lat), Some(lng)) => Some(GeoPoint::new(lat, lng)).filter(GeoPoint::is_set),
        _ => None,
    };
    let sort = query.sort.unwrap_or_default();

    let rows = engine
        .query_requests(filters, sort, location)
        .into_iter()
        .map(RequestRow::from)
        .collect();
    Json(rows)
}

async fn claim_handler<R, P, I, N>(
    State(engine): State<Arc<LifecycleEngine<R, P, I, N>>>,
    Path(request_id): Path<String>,
    Json(body): Json<ClaimBody>,
) -> Response
where
    R: RequestGateway + 'static,
    P: ProfileGateway + 'static,
    I: IdentityProvider + 'static,
    N: AlertSink + 'static,
{
    let id = RequestId(request_id);
    match engine.claim_request(&id, body.eta).await {
        Ok(()) => (StatusCode::OK, Json(json!({ "status": "claimed" }))).into_response(),
        Err(err) => engine_error_response(err),
    }
}

async fn complete_handler<R, P, I, N>(
    State(engine): State<Arc<LifecycleEngine<R, P, I, N>>>,
    Path(request_id): Path<String>,
    Json(body): Json<CompleteBody>,
) -> Response
where
    R: RequestGateway + 'static,
    P: ProfileGateway + 'static,
    I: IdentityProvider + 'static,
    N: AlertSink + 'static,
{
    let id = RequestId(request_id);
    match engine
        .complete_request(&id, body.estimated_days_covered)
        .await
    {
        Ok(()) => (StatusCode::OK, Json(json!({ "status": "served" }))).into_response(),
        Err(err) => engine_error_response(err),
    }
}

async fn shelters_handler<R, P, I, N>(
    State(engine): State<Arc<LifecycleEngine<R, P, I, N>>>,
) -> Json<Vec<ShelterRow>>
where
    R: RequestGateway + 'static,
    P: ProfileGateway + 'static,
    I: IdentityProvider + 'static,
    N: AlertSink + 'static,
{
    let rows = engine
        .active_shelters()
        .into_iter()
        .map(|shelter| ShelterRow {
            location: shelter
                .has_mappable_location()
                .then(|| shelter.location()),
            availability: shelter.availability_text(),
            id: shelter.id,
            name: shelter.name,
            address: shelter.address,
            capacity: shelter.capacity,
            available_spots: shelter.available_spots,
            contact_phone: shelter.contact_phone,
            contact_email: shelter.contact_email,
            facilities: shelter.facilities,
        })
        .collect();
    Json(rows)
}

fn engine_error_response(err: EngineError) -> Response {
    let status = match &err {
        EngineError::Validation(_) | EngineError::LocationUnavailable => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        EngineError::NotSignedIn => StatusCode::UNAUTHORIZED,
        EngineError::Gateway(GatewayError::NotFound) => StatusCode::NOT_FOUND,
        EngineError::Gateway(GatewayError::Conflict(_)) => StatusCode::CONFLICT,
        EngineError::Gateway(GatewayError::Unavailable(_))
        | EngineError::Gateway(GatewayError::Auth(_)) => StatusCode::SERVICE_UNAVAILABLE,
    };
    (status, Json(json!({ "error": err.to_string() }))).into_response()
}
