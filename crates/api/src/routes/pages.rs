//! Route definitions for page data.

use axum::routing::get;
use axum::Router;

use crate::handlers::pages;
use crate::state::AppState;

/// Routes mounted at `/pages`.
///
/// ```text
/// GET /layout       -> layout
/// GET /home         -> home
/// GET /track/{id}   -> track
/// GET /me           -> me (redirects to /login without a session)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/layout", get(pages::layout))
        .route("/home", get(pages::home))
        .route("/track/{id}", get(pages::track))
        .route("/me", get(pages::me))
}
