//! Route definitions for the `/room` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::room;
use crate::state::AppState;

/// Routes mounted at `/room`.
///
/// ```text
/// GET  /           -> get_room
/// POST /advance    -> advance
/// POST /generate   -> generate
/// POST /play       -> play
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(room::get_room))
        .route("/advance", post(room::advance))
        .route("/generate", post(room::generate))
        .route("/play", post(room::play))
}
