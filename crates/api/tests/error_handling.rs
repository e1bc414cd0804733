//! Tests for `AppError` → HTTP response mapping.
//!
//! These call `IntoResponse` directly on `AppError` values; no router is
//! involved.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use http_body_util::BodyExt;
use radio_api::error::AppError;
use radio_core::error::CoreError;
use radio_db::BaasError;
use radio_suno::api::SunoApiError;

/// Helper: convert an `AppError` into its status code and parsed JSON body.
async fn error_to_response(err: AppError) -> (StatusCode, serde_json::Value) {
    let response = err.into_response();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    (status, json)
}

// ---------------------------------------------------------------------------
// Test: CoreError::NotFound maps to 404 with NOT_FOUND code
// ---------------------------------------------------------------------------

#[tokio::test]
async fn not_found_error_returns_404() {
    let err = AppError::Core(CoreError::NotFound {
        entity: "Track",
        id: "abc123".into(),
    });

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["code"], "NOT_FOUND");
    assert_eq!(json["error"], "Track with id abc123 not found");
}

// ---------------------------------------------------------------------------
// Test: validation, auth and availability errors keep their messages
// ---------------------------------------------------------------------------

#[tokio::test]
async fn validation_error_returns_400() {
    let err = AppError::Core(CoreError::Validation("title is required in Custom Mode".into()));

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "VALIDATION_ERROR");
    assert_eq!(json["error"], "title is required in Custom Mode");
}

#[tokio::test]
async fn unauthorized_and_forbidden_map_to_401_and_403() {
    let (status, json) =
        error_to_response(AppError::Core(CoreError::Unauthorized("Not authenticated".into()))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["code"], "UNAUTHORIZED");

    let (status, json) =
        error_to_response(AppError::Core(CoreError::Forbidden("nope".into()))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(json["code"], "FORBIDDEN");
}

#[tokio::test]
async fn unavailable_returns_503() {
    let err = AppError::Core(CoreError::Unavailable("Generation API key is not configured".into()));

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(json["code"], "UNAVAILABLE");
}

// ---------------------------------------------------------------------------
// Test: internal errors hide their details
// ---------------------------------------------------------------------------

#[tokio::test]
async fn internal_error_is_sanitized() {
    let (status, json) =
        error_to_response(AppError::InternalError("db password wrong".into())).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["code"], "INTERNAL_ERROR");
    assert!(!json["error"].as_str().unwrap().contains("password"));
}

// ---------------------------------------------------------------------------
// Test: BaaS errors are classified by status
// ---------------------------------------------------------------------------

#[tokio::test]
async fn baas_errors_are_classified() {
    let not_found = AppError::Baas(BaasError::Api {
        status: 404,
        body: "missing".into(),
    });
    let (status, json) = error_to_response(not_found).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["code"], "NOT_FOUND");

    let server = AppError::Baas(BaasError::Api {
        status: 500,
        body: "stack trace".into(),
    });
    let (status, json) = error_to_response(server).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["code"], "INTERNAL_ERROR");
}

// ---------------------------------------------------------------------------
// Test: generation API rejections are forwarded verbatim
// ---------------------------------------------------------------------------

#[tokio::test]
async fn upstream_json_body_is_forwarded() {
    let err = AppError::from(SunoApiError::ApiError {
        status: 429,
        body: r#"{"code":429,"msg":"insufficient credits"}"#.into(),
    });

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(json["msg"], "insufficient credits");
}

#[tokio::test]
async fn upstream_text_body_is_wrapped() {
    let err = AppError::Upstream {
        status: 502,
        body: "Bad Gateway".into(),
    };

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(json["code"], "UPSTREAM_ERROR");
    assert_eq!(json["error"], "Bad Gateway");
}
