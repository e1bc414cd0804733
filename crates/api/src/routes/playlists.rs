//! Route definitions for the `/playlists` resource.

use axum::routing::{delete, get, post};
use axum::Router;

use crate::handlers::playlists;
use crate::state::AppState;

/// Routes mounted at `/playlists`. All require a session.
///
/// ```text
/// GET    /                          -> list
/// POST   /                          -> create
/// GET    /liked                     -> liked
/// GET    /{id}                      -> get
/// DELETE /{id}                      -> delete
/// POST   /{id}/tracks               -> add_track
/// DELETE /{id}/tracks/{entry_id}    -> remove_track
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(playlists::list).post(playlists::create))
        .route("/liked", get(playlists::liked))
        .route("/{id}", get(playlists::get).delete(playlists::delete))
        .route("/{id}/tracks", post(playlists::add_track))
        .route("/{id}/tracks/{entry_id}", delete(playlists::remove_track))
}
