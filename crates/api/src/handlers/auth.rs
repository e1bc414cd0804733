//! Handlers for the session cookie.
//!
//! Sign-in happens against the BaaS directly; these endpoints only move the
//! resulting token into (or out of) the server's session cookie.

use axum::extract::State;
use axum::http::header::SET_COOKIE;
use axum::response::IntoResponse;
use axum::Json;
use radio_core::session::extract_cookie_token;
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::{clear_session_cookie, session_cookie};
use crate::response::SuccessResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SetCookieRequest {
    /// A raw cookie string as exported by the BaaS client.
    pub cookie: Option<String>,
}

/// POST /api/auth/set-cookie
///
/// Extract the session token from a cookie string and store it in the
/// session cookie.
pub async fn set_cookie(
    State(state): State<AppState>,
    Json(input): Json<SetCookieRequest>,
) -> AppResult<impl IntoResponse> {
    let raw = input
        .cookie
        .filter(|c| !c.trim().is_empty())
        .ok_or_else(|| AppError::BadRequest("Cookie data required".into()))?;

    let token = extract_cookie_token(&raw, &state.config.session_cookie_name).ok_or_else(|| {
        AppError::BadRequest(format!(
            "Cookie data has no {} value",
            state.config.session_cookie_name
        ))
    })?;

    let cookie = session_cookie(&state.config, &token)?;
    Ok((
        [(SET_COOKIE, cookie)],
        Json(SuccessResponse::ok()),
    ))
}

/// GET|POST /api/auth/logout
///
/// Clear the session cookie.
pub async fn logout(State(state): State<AppState>) -> impl IntoResponse {
    (
        [(SET_COOKIE, clear_session_cookie(&state.config))],
        Json(SuccessResponse::ok()),
    )
}
