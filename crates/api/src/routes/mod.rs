pub mod auth;
pub mod health;
pub mod music;
pub mod pages;
pub mod playlists;
pub mod proxy;
pub mod room;
pub mod user;

use axum::Router;

use crate::state::AppState;

/// Build the `/api` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /music/generate                        submit generation (session, POST)
/// /music/enhance                         enhance a prompt (POST)
/// /music/callback                        generation webhook (POST)
/// /music/latest                          newest track (GET)
/// /music/tracks                          catalog page (GET)
/// /music/tracks/{id}                     soft delete (DELETE, owner)
/// /music/reaction                        toggle reaction (session, POST)
///
/// /room                                  room with tracks (GET)
/// /room/advance                          advance (POST)
/// /room/generate                         generate next track (POST)
/// /room/play                             play a track now (POST)
///
/// /auth/set-cookie                       store session token (POST)
/// /auth/logout                           clear session (GET, POST)
///
/// /user/tracks                           own tracks (session, GET)
///
/// /pages/layout                          layout data (GET)
/// /pages/home                            home data (GET)
/// /pages/track/{id}                      track page data (GET)
/// /pages/me                              profile data (GET, redirects)
///
/// /playlists                             list, create (session)
/// /playlists/liked                       liked songs (GET)
/// /playlists/{id}                        get, delete
/// /playlists/{id}/tracks                 add track (POST)
/// /playlists/{id}/tracks/{entry_id}      remove entry (DELETE)
///
/// /proxy/{*path}                         pass-through proxy
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Generation, webhook and catalog.
        .nest("/music", music::router())
        // Shared room.
        .nest("/room", room::router())
        // Session cookie management.
        .nest("/auth", auth::router())
        // Signed-in user's data.
        .nest("/user", user::router())
        // Page data for the web client.
        .nest("/pages", pages::router())
        // Playlists and liked songs.
        .nest("/playlists", playlists::router())
        // Optional pass-through proxy.
        .nest("/proxy", proxy::router())
}
