//! End-to-end tests for the full safelinkd stack.
//!
//! Each test spins up the complete application (in-memory `SQLite`, real
//! stores, real event bus and handlers, real axum router) and exercises the
//! HTTP layer via `tower::ServiceExt::oneshot`; no TCP port is bound.

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;

use safelink_adapter_http_axum::router;
use safelink_adapter_http_axum::state::AppState;
use safelink_adapter_storage_sqlite_sqlx::{Config, SqliteEmergencyStore, SqliteUserStore};
use safelink_app::event_bus::InProcessEventBus;
use safelink_app::wiring;
use safelink_domain::emergency::NeverAutoResolve;
use safelink_domain::id::{EmergencyId, UserId};

/// Build a fully-wired router backed by an in-memory `SQLite` database.
async fn app() -> Router {
    let db = Config {
        database_url: "sqlite::memory:".to_string(),
    }
    .build()
    .await
    .expect("in-memory database should initialise");

    let emergencies = SqliteEmergencyStore::new(db.pool().clone());
    let users = SqliteUserStore::new(db.pool().clone());
    let routes = wiring::routes(
        emergencies.clone(),
        users.clone(),
        Arc::new(NeverAutoResolve),
    );
    let bus = Arc::new(InProcessEventBus::new(routes, 16));

    router::build(AppState::new(
        bus,
        emergencies,
        users,
        CancellationToken::new(),
    ))
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    send(app, Request::builder().uri(uri).body(Body::empty()).unwrap()).await
}

async fn write(app: &Router, method: &str, uri: &str, body: &Value) -> (StatusCode, Value) {
    send(
        app,
        Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
    )
    .await
}

async fn post(app: &Router, uri: &str, body: &Value) -> (StatusCode, Value) {
    write(app, "POST", uri, body).await
}

async fn register(app: &Router, name: &str, requires_approval: bool) -> String {
    let (status, body) = post(
        app,
        "/api/users",
        &json!({
            "name": name,
            "email": format!("{name}@example.com"),
            "phone_number": "+972500000000",
            "requires_approval": requires_approval
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["id"].as_str().unwrap().to_string()
}

/// Scenario A: an `EmergencyStarted` event creates an active emergency.
async fn start_weather_alert(app: &Router) -> EmergencyId {
    let id = EmergencyId::new();
    let (status, _) = post(
        app,
        "/api/events",
        &json!({
            "type": "emergency_started",
            "emergency_id": id,
            "initiator_user_id": UserId::new(),
            "emergency_type": "weather_alert",
            "location": { "latitude": 32.08, "longitude": 34.78 }
        }),
    )
    .await;
    assert_eq!(status, StatusCode::ACCEPTED);
    id
}

// ---------------------------------------------------------------------------
// Health check
// ---------------------------------------------------------------------------

#[tokio::test]
async fn should_return_ok_when_health_check_called() {
    let app = app().await;
    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

// ---------------------------------------------------------------------------
// Emergency lifecycle
// ---------------------------------------------------------------------------

#[tokio::test]
async fn should_store_active_emergency_with_default_area_when_started() {
    let app = app().await;
    let id = start_weather_alert(&app).await;

    let (status, body) = get(&app, &format!("/api/emergencies/{id}")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "active");
    assert_eq!(body["emergency_type"], "weather_alert");
    let areas = body["affected_areas"].as_array().unwrap();
    assert_eq!(areas.len(), 1);
    assert_eq!(areas[0]["radius_in_meters"], 500.0);
}

#[tokio::test]
async fn should_record_response_when_user_marks_status() {
    let app = app().await;
    let id = start_weather_alert(&app).await;
    let user = UserId::new();

    let (status, _) = post(
        &app,
        &format!("/api/emergencies/{id}/status"),
        &json!({ "user_id": user, "status": "safe", "message": "ok" }),
    )
    .await;
    assert_eq!(status, StatusCode::ACCEPTED);

    let (_, body) = get(&app, &format!("/api/emergencies/{id}")).await;
    let responses = body["responses"].as_array().unwrap();
    assert_eq!(responses.len(), 1);
    assert_eq!(responses[0]["user_id"], json!(user));
    assert_eq!(responses[0]["is_safe"], true);
    assert_eq!(responses[0]["message"], "ok");
    assert_eq!(body["version"], 2);
}

#[tokio::test]
async fn should_resolve_emergency_when_ended() {
    let app = app().await;
    let id = start_weather_alert(&app).await;

    let (status, _) = post(&app, &format!("/api/emergencies/{id}/end"), &json!({})).await;
    assert_eq!(status, StatusCode::ACCEPTED);

    let (_, body) = get(&app, &format!("/api/emergencies/{id}")).await;
    assert_eq!(body["status"], "resolved");
    assert!(!body["resolved_at"].is_null());
}

#[tokio::test]
async fn should_accept_and_ignore_end_of_unknown_emergency() {
    let app = app().await;
    let unknown = EmergencyId::new();

    let (status, _) = post(&app, &format!("/api/emergencies/{unknown}/end"), &json!({})).await;
    assert_eq!(status, StatusCode::ACCEPTED);

    let (status, _) = get(&app, &format!("/api/emergencies/{unknown}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (_, all) = get(&app, "/api/emergencies").await;
    assert_eq!(all, json!([]));
}

#[tokio::test]
async fn should_start_emergency_through_api_and_list_it() {
    let app = app().await;
    let initiator = UserId::new();

    let (status, body) = post(
        &app,
        "/api/emergencies",
        &json!({
            "initiator_user_id": initiator,
            "emergency_type": "fire",
            "location": { "latitude": 31.0, "longitude": 35.0, "description": "kitchen" },
            "severity": "critical",
            "description": "smoke"
        }),
    )
    .await;
    assert_eq!(status, StatusCode::ACCEPTED);
    let id = body["id"].clone();

    let (_, active) = get(&app, "/api/emergencies?status=active").await;
    assert_eq!(active.as_array().unwrap().len(), 1);
    assert_eq!(active[0]["id"], id);
    assert_eq!(active[0]["severity"], "critical");

    let (_, mine) = get(&app, &format!("/api/emergencies?user_id={initiator}")).await;
    assert_eq!(mine.as_array().unwrap().len(), 1);
    let (_, resolved) = get(&app, "/api/emergencies?status=resolved").await;
    assert_eq!(resolved, json!([]));
}

#[tokio::test]
async fn should_create_emergency_from_legacy_event_shape() {
    let app = app().await;
    let id = EmergencyId::new();

    let (status, _) = post(
        &app,
        "/api/events",
        &json!({
            "type": "emergency_situation_started",
            "emergency_situation_id": id,
            "initiator_id": UserId::new(),
            "emergency_type": "fire",
            "location": { "latitude": 32.08, "longitude": 34.78 },
            "affected_area": {
                "center": { "latitude": 32.08, "longitude": 34.78 },
                "radius_in_meters": 250.0
            },
            "date_time_occurred_utc": "2024-05-01T10:00:00Z"
        }),
    )
    .await;
    assert_eq!(status, StatusCode::ACCEPTED);

    let (_, body) = get(&app, &format!("/api/emergencies/{id}")).await;
    assert_eq!(body["affected_areas"][0]["radius_in_meters"], 250.0);
    assert_eq!(body["severity"], "medium");
}

#[tokio::test]
async fn should_reject_started_event_without_location() {
    let app = app().await;

    let (status, _) = post(
        &app,
        "/api/events",
        &json!({
            "type": "emergency_started",
            "emergency_id": EmergencyId::new(),
            "initiator_user_id": UserId::new()
        }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (_, all) = get(&app, "/api/emergencies").await;
    assert_eq!(all, json!([]));
}

// ---------------------------------------------------------------------------
// Users and subscriptions
// ---------------------------------------------------------------------------

#[tokio::test]
async fn should_move_subscription_from_pending_to_approved() {
    let app = app().await;
    let a = register(&app, "a", true).await;
    let b = register(&app, "b", true).await;
    let pair = json!({ "subscriber_id": a, "subscribed_to_id": b });

    let (status, _) = post(&app, "/api/subscriptions", &pair).await;
    assert_eq!(status, StatusCode::ACCEPTED);

    let (_, owner) = get(&app, &format!("/api/users/{b}")).await;
    assert_eq!(owner["subscriptions"][0]["status"], "pending");
    assert!(owner["subscriptions"][0]["approved_at"].is_null());

    let (status, _) = post(&app, "/api/subscriptions/approve", &pair).await;
    assert_eq!(status, StatusCode::ACCEPTED);

    let (_, owner) = get(&app, &format!("/api/users/{b}")).await;
    assert_eq!(owner["subscriptions"][0]["status"], "approved");
    assert!(!owner["subscriptions"][0]["approved_at"].is_null());

    let (_, following) = get(&app, &format!("/api/users/{a}/subscriptions")).await;
    assert_eq!(following.as_array().unwrap().len(), 1);
    assert_eq!(following[0]["subscribed_to_id"], json!(b));
}

#[tokio::test]
async fn should_reject_pending_subscription() {
    let app = app().await;
    let a = register(&app, "a", true).await;
    let b = register(&app, "b", true).await;
    let pair = json!({ "subscriber_id": a, "subscribed_to_id": b });
    post(&app, "/api/subscriptions", &pair).await;

    let (status, _) = post(&app, "/api/subscriptions/reject", &pair).await;
    assert_eq!(status, StatusCode::ACCEPTED);

    let (_, owner) = get(&app, &format!("/api/users/{b}")).await;
    assert_eq!(owner["subscriptions"][0]["status"], "rejected");
    assert!(owner["subscriptions"][0]["approved_at"].is_null());
}

#[tokio::test]
async fn should_cache_latest_status_for_followers() {
    let app = app().await;
    let follower = register(&app, "follower", true).await;
    let open = register(&app, "open", false).await;
    post(
        &app,
        "/api/subscriptions",
        &json!({ "subscriber_id": follower, "subscribed_to_id": open }),
    )
    .await;
    let emergency = start_weather_alert(&app).await;

    post(
        &app,
        &format!("/api/emergencies/{emergency}/status"),
        &json!({ "user_id": open, "status": "help_needed" }),
    )
    .await;

    let (_, following) = get(&app, &format!("/api/users/{follower}/subscriptions")).await;
    assert_eq!(following[0]["status"], "approved");
    assert!(following[0]["approved_at"].is_null());
    assert_eq!(following[0]["last_known_status"], "help_needed");
    let (_, body) = get(&app, &format!("/api/emergencies/{emergency}")).await;
    assert_eq!(body["responses"][0]["is_safe"], false);
}

#[tokio::test]
async fn should_update_approval_setting_and_bump_version() {
    let app = app().await;
    let id = register(&app, "carol", true).await;

    let (status, body) = write(
        &app,
        "PUT",
        &format!("/api/users/{id}/approval"),
        &json!({ "requires_approval": false }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["requires_approval"], false);
    assert_eq!(body["version"], 2);
}

#[tokio::test]
async fn should_find_user_by_email_and_delete_it() {
    let app = app().await;
    let id = register(&app, "dave", true).await;

    let (_, found) = get(&app, "/api/users?email=dave@example.com").await;
    assert_eq!(found[0]["id"], json!(id));

    let (status, _) = send(
        &app,
        Request::builder()
            .method("DELETE")
            .uri(format!("/api/users/{id}"))
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = get(&app, &format!("/api/users/{id}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
