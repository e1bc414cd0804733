use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use radio_core::error::CoreError;
use radio_db::BaasError;
use radio_suno::api::SunoApiError;
use serde_json::{json, Value};

/// Application-level error type for HTTP handlers.
///
/// Wraps [`CoreError`] for domain errors and [`BaasError`] for persistence
/// failures, and adds HTTP-specific variants. Implements [`IntoResponse`] to
/// produce consistent JSON error responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `radio_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A BaaS read or write failed.
    #[error("BaaS error: {0}")]
    Baas(#[from] BaasError),

    /// A bad request with a human-readable message.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// An internal error with a human-readable message.
    #[error("Internal error: {0}")]
    InternalError(String),

    /// An external API rejected a call; its status and body are forwarded.
    #[error("Upstream error ({status}): {body}")]
    Upstream { status: u16, body: String },
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl From<SunoApiError> for AppError {
    fn from(err: SunoApiError) -> Self {
        match err {
            SunoApiError::ApiError { status, body } => AppError::Upstream { status, body },
            SunoApiError::Request(e) => {
                tracing::error!(error = %e, "Generation API unreachable");
                AppError::Upstream {
                    status: StatusCode::BAD_GATEWAY.as_u16(),
                    body: json!({ "error": "Generation API unreachable", "code": "UPSTREAM_ERROR" })
                        .to_string(),
                }
            }
        }
    }
}

fn internal() -> (StatusCode, &'static str, String) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "INTERNAL_ERROR",
        "An internal error occurred".to_string(),
    )
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            // --- CoreError variants ---
            AppError::Core(core) => match core {
                CoreError::NotFound { entity, id } => (
                    StatusCode::NOT_FOUND,
                    "NOT_FOUND",
                    format!("{entity} with id {id} not found"),
                ),
                CoreError::Validation(msg) => {
                    (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
                }
                CoreError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),
                CoreError::Unauthorized(msg) => {
                    (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg.clone())
                }
                CoreError::Forbidden(msg) => (StatusCode::FORBIDDEN, "FORBIDDEN", msg.clone()),
                CoreError::Unavailable(msg) => {
                    (StatusCode::SERVICE_UNAVAILABLE, "UNAVAILABLE", msg.clone())
                }
                CoreError::Internal(msg) => {
                    tracing::error!(error = %msg, "Internal core error");
                    internal()
                }
            },

            // --- BaaS errors ---
            AppError::Baas(err) => classify_baas_error(err),

            // --- HTTP-specific errors ---
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            AppError::InternalError(msg) => {
                tracing::error!(error = %msg, "Internal error");
                internal()
            }
            AppError::Upstream { status, body } => {
                return upstream_response(*status, body);
            }
        };

        let body = json!({
            "error": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}

/// Forward an upstream status and body. JSON bodies pass through as-is;
/// anything else is wrapped in the standard error envelope.
fn upstream_response(status: u16, body: &str) -> Response {
    let status = StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY);
    let body = match serde_json::from_str::<Value>(body) {
        Ok(value @ Value::Object(_)) => value,
        _ => json!({ "error": body, "code": "UPSTREAM_ERROR" }),
    };
    (status, axum::Json(body)).into_response()
}

/// Classify a BaaS error into an HTTP status, error code, and message.
///
/// - 404 maps to 404.
/// - 401 and 403 map to themselves (the BaaS rejected the session).
/// - Everything else maps to 500 with a sanitized message.
fn classify_baas_error(err: &BaasError) -> (StatusCode, &'static str, String) {
    match err {
        BaasError::Api { status: 404, .. } => (
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            "Resource not found".to_string(),
        ),
        BaasError::Api { status: 401, .. } => (
            StatusCode::UNAUTHORIZED,
            "UNAUTHORIZED",
            "Unauthorized".to_string(),
        ),
        BaasError::Api { status: 403, .. } => (
            StatusCode::FORBIDDEN,
            "FORBIDDEN",
            "Forbidden".to_string(),
        ),
        other => {
            tracing::error!(error = %other, "BaaS error");
            internal()
        }
    }
}
