use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use reliefnet::gateway::{IdentityProvider, ProfileGateway, RequestGateway};
use reliefnet::notify::AlertSink;
use reliefnet::profiles::{profile_router, ProfileService};
use reliefnet::requests::{request_router, LifecycleEngine};
use serde_json::json;
use std::sync::Arc;

/// Full application router: the request lifecycle and shelter endpoints, the
/// profile endpoints, and the operational probes.
pub(crate) fn with_coordination_routes<R, P, I, N>(
    engine: Arc<LifecycleEngine<R, P, I, N>>,
    profiles: Arc<ProfileService<P, I>>,
) -> axum::Router
where
    R: RequestGateway + 'static,
    P: ProfileGateway + 'static,
    I: IdentityProvider + 'static,
    N: AlertSink + 'static,
{
    request_router(engine)
        .merge(profile_router(profiles))
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}
