//! Route definitions for the `/user` resource.

use axum::routing::get;
use axum::Router;

use crate::handlers::user;
use crate::state::AppState;

/// Routes mounted at `/user`.
///
/// ```text
/// GET /tracks   -> tracks (session required)
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/tracks", get(user::tracks))
}
