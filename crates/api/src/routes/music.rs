//! Route definitions for the `/music` resource.

use axum::routing::{delete, get, post};
use axum::Router;

use crate::handlers::music;
use crate::state::AppState;

/// Routes mounted at `/music`.
///
/// ```text
/// POST   /generate       -> generate (session required)
/// POST   /enhance        -> enhance
/// POST   /callback       -> callback (generation API webhook)
/// GET    /latest         -> latest
/// GET    /tracks         -> tracks
/// DELETE /tracks/{id}    -> delete_track (owner only)
/// POST   /reaction       -> reaction (session required)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/generate", post(music::generate))
        .route("/enhance", post(music::enhance))
        .route("/callback", post(music::callback))
        .route("/latest", get(music::latest))
        .route("/tracks", get(music::tracks))
        .route("/tracks/{id}", delete(music::delete_track))
        .route("/reaction", post(music::reaction))
}
