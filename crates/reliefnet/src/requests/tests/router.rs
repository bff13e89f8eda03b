use axum::body::Body;
use axum::http::{header, Request as HttpRequest, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;

use super::common::*;
use crate::profiles::Uid;
use crate::requests::domain::{NewRequest, Priority, RequestKind};
use crate::requests::router::request_router;
use crate::shelters::NewShelter;
use crate::gateway::{RequestGateway, ShelterGateway};

async fn send(router: axum::Router, request: HttpRequest<Body>) -> (StatusCode, Value) {
    let response = router.oneshot(request).await.expect("router responds");
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body reads");
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("json body")
    };
    (status, value)
}

fn post_json(uri: &str, body: Value) -> HttpRequest<Body> {
    HttpRequest::post(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("request builds")
}

fn get(uri: &str) -> HttpRequest<Body> {
    HttpRequest::get(uri).body(Body::empty()).expect("request builds")
}

async fn seed_request(h: &Harness, title: &str, created_by: &str) -> String {
    h.store
        .create_request(NewRequest {
            kind: RequestKind::Rescue,
            resource_type: None,
            title: title.to_string(),
            notes: None,
            lat: 28.61,
            lng: 77.21,
            priority: Priority::High,
            created_by: Uid(created_by.to_string()),
        })
        .await
        .expect("seeded")
        .0
}

#[tokio::test]
async fn create_endpoint_returns_the_assigned_id() {
    let h = harness(FixedIdentity::signed_in("victim-1"));
    let router = request_router(h.engine.clone());

    let (status, body) = send(
        router,
        post_json(
            "/api/v1/requests",
            json!({
                "kind": "RESCUE",
                "title": "Trapped on roof",
                "priority": "HIGH",
                "lat": 28.61,
                "lng": 77.21,
            }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["id"], "req-000001");
}

#[tokio::test]
async fn create_endpoint_maps_validation_failures_to_422() {
    let h = harness(FixedIdentity::signed_in("victim-1"));
    let router = request_router(h.engine.clone());

    let (status, body) = send(
        router,
        post_json(
            "/api/v1/requests",
            json!({
                "kind": "RESCUE",
                "title": "ab",
                "priority": "HIGH",
                "lat": 28.61,
                "lng": 77.21,
            }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["error"].as_str().unwrap().contains("at least 3"));
}

#[tokio::test]
async fn claim_endpoint_rejects_anonymous_callers_with_401() {
    let h = harness(FixedIdentity::default());
    let router = request_router(h.engine.clone());

    let (status, _) = send(
        router,
        post_json("/api/v1/requests/req-000001/claim", json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn claim_endpoint_maps_missing_requests_to_404() {
    let h = harness(FixedIdentity::signed_in("ngo-1"));
    let router = request_router(h.engine.clone());

    let (status, _) = send(
        router,
        post_json("/api/v1/requests/req-999999/claim", json!({ "eta": "2 hours" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn second_claim_gets_a_409() {
    let h = harness(FixedIdentity::signed_in("ngo-1"));
    let id = seed_request(&h, "Trapped on roof", "victim-1").await;

    let router = request_router(h.engine.clone());
    let uri = format!("/api/v1/requests/{id}/claim");

    let (status, _) = send(router.clone(), post_json(&uri, json!({}))).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(router, post_json(&uri, json!({}))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].as_str().unwrap().contains("already claimed"));
}

#[tokio::test]
async fn complete_endpoint_rejects_out_of_range_days() {
    let h = harness(FixedIdentity::signed_in("ngo-1"));
    let id = seed_request(&h, "Need rations", "victim-1").await;
    let router = request_router(h.engine.clone());

    let (status, _) = send(
        router,
        post_json(
            &format!("/api/v1/requests/{id}/complete"),
            json!({ "estimated_days_covered": 366 }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn list_endpoint_applies_query_filters() {
    let h = harness(FixedIdentity::signed_in("victim-1"));
    seed_request(&h, "Trapped on roof", "victim-1").await;
    seed_request(&h, "Need water", "victim-2").await;
    h.engine.ingest_request_snapshot(h.store.request_snapshot());

    let router = request_router(h.engine.clone());
    let (status, body) = send(router, get("/api/v1/requests?mine_only=true")).await;

    assert_eq!(status, StatusCode::OK);
    let rows = body.as_array().expect("array body");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["title"], "Trapped on roof");
    assert_eq!(rows[0]["status"], "NOT_SERVED");
    assert_eq!(rows[0]["status_label"], "Not served");
}

#[tokio::test]
async fn shelters_endpoint_omits_unmappable_locations() {
    let h = harness(FixedIdentity::signed_in("victim-1"));
    h.store
        .put_shelter(NewShelter {
            name: "Community Center".to_string(),
            address: None,
            lat: 28.6139,
            lng: 77.2090,
            capacity: 200,
            current_occupancy: 45,
            available_spots: 155,
            contact_phone: None,
            contact_email: None,
            facilities: vec!["Food".to_string()],
            is_active: true,
        })
        .await
        .expect("seeded");
    h.store
        .put_shelter(NewShelter {
            name: "Unlocated Camp".to_string(),
            address: None,
            lat: 0.0,
            lng: 0.0,
            capacity: 50,
            current_occupancy: 0,
            available_spots: 50,
            contact_phone: None,
            contact_email: None,
            facilities: Vec::new(),
            is_active: true,
        })
        .await
        .expect("seeded");

    let mut sub = h.store.subscribe_shelters();
    let snapshot = sub.recv().await.expect("initial snapshot").expect("ok");
    h.engine.ingest_shelter_snapshot(snapshot);

    let router = request_router(h.engine.clone());
    let (status, body) = send(router, get("/api/v1/shelters")).await;

    assert_eq!(status, StatusCode::OK);
    let rows = body.as_array().expect("array body");
    assert_eq!(rows.len(), 2);

    let by_name = |name: &str| {
        rows.iter()
            .find(|row| row["name"] == name)
            .expect("row present")
    };
    assert_eq!(by_name("Community Center")["availability"], "155 / 200");
    assert!(by_name("Community Center")["location"].is_object());
    assert!(by_name("Unlocated Camp").get("location").is_none());
}
