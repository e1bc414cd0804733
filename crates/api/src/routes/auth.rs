//! Route definitions for the `/auth` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::auth;
use crate::state::AppState;

/// Routes mounted at `/auth`.
///
/// ```text
/// POST /set-cookie   -> set_cookie
/// GET  /logout       -> logout
/// POST /logout       -> logout
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/set-cookie", post(auth::set_cookie))
        .route("/logout", get(auth::logout).post(auth::logout))
}
