//! Integration tests for the health check endpoint and general HTTP behaviour.

mod common;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use common::{body_json, get, send};
use radio_api::state::Services;
use radio_db::memory::MemoryStore;

// ---------------------------------------------------------------------------
// Test: GET /health returns 200 with expected JSON fields
// ---------------------------------------------------------------------------

#[tokio::test]
async fn health_check_returns_ok_with_json() {
    let app = common::build_test_app(MemoryStore::new(), Services::default());
    let response = get(&app, "/health", None).await;

    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
    assert!(json["version"].is_string());
    assert_eq!(json["baas_healthy"], true);
}

// ---------------------------------------------------------------------------
// Test: an unreachable BaaS degrades the health check without failing it
// ---------------------------------------------------------------------------

#[tokio::test]
async fn health_check_reports_degraded_baas() {
    let store = MemoryStore::new();
    store.set_failing(Some(503)).await;
    let app = common::build_test_app(store, Services::default());

    let response = get(&app, "/health", None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["status"], "degraded");
    assert_eq!(json["baas_healthy"], false);
}

// ---------------------------------------------------------------------------
// Test: Unknown route returns 404
// ---------------------------------------------------------------------------

#[tokio::test]
async fn unknown_route_returns_404() {
    let app = common::build_test_app(MemoryStore::new(), Services::default());
    let response = get(&app, "/this-route-does-not-exist", None).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ---------------------------------------------------------------------------
// Test: x-request-id header is present in response
// ---------------------------------------------------------------------------

#[tokio::test]
async fn response_contains_x_request_id_header() {
    let app = common::build_test_app(MemoryStore::new(), Services::default());
    let response = get(&app, "/health", None).await;

    let request_id = response
        .headers()
        .get("x-request-id")
        .expect("Response must contain an x-request-id header");
    assert_eq!(request_id.to_str().unwrap().len(), 36);
}

// ---------------------------------------------------------------------------
// Test: CORS preflight allows the idempotency header
// ---------------------------------------------------------------------------

#[tokio::test]
async fn cors_preflight_allows_idempotency_key() {
    let app = common::build_test_app(MemoryStore::new(), Services::default());
    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/api/music/generate")
        .header("origin", "http://localhost:5173")
        .header("access-control-request-method", "POST")
        .header("access-control-request-headers", "content-type,idempotency-key")
        .body(Body::empty())
        .unwrap();

    let response = send(&app, request).await;

    assert_eq!(response.status(), StatusCode::OK);
    let allowed = response
        .headers()
        .get("access-control-allow-headers")
        .unwrap()
        .to_str()
        .unwrap()
        .to_ascii_lowercase();
    assert!(allowed.contains("idempotency-key"));
}

// ---------------------------------------------------------------------------
// Test: the proxy is disabled without a target
// ---------------------------------------------------------------------------

#[tokio::test]
async fn proxy_without_target_returns_404() {
    let app = common::build_test_app(MemoryStore::new(), Services::default());
    let response = get(&app, "/api/proxy/v1/anything", None).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = body_json(response).await;
    assert_eq!(json["code"], "NOT_FOUND");
}
