//! Page data endpoints.
//!
//! Each endpoint returns the JSON a page of the web client renders from.
//! A session cookie that no longer validates is cleared on every page;
//! protected pages additionally redirect to the login page.

use axum::extract::{Path, State};
use axum::http::header::{LOCATION, SET_COOKIE};
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use radio_core::error::CoreError;
use radio_core::reaction::ReactionKind;
use radio_core::session::{is_public_path, LOGIN_PATH};
use radio_db::models::playlist::PlaylistWithStats;
use radio_db::models::track::{Track, TrackSummary};
use radio_db::models::user::User;
use radio_db::repositories::{PlaylistRepo, ReactionRepo, TrackRepo, UserRepo};
use radio_db::RecordStore;
use serde::Serialize;

use crate::error::AppError;
use crate::middleware::auth::{clear_if_stale, clear_session_cookie, OptionalSession};
use crate::state::AppState;

/// Tracks shown on the profile page.
const PROFILE_TRACKS: u32 = 50;

/// Resolve the page's user, or the redirect to send instead.
fn page_user<'a>(
    state: &AppState,
    session: &'a OptionalSession,
    path: &str,
) -> Result<Option<&'a User>, Response> {
    match &session.user {
        Some(user) => Ok(Some(user)),
        None if is_public_path(path) => Ok(None),
        None => {
            let mut headers = HeaderMap::new();
            headers.insert(LOCATION, HeaderValue::from_static(LOGIN_PATH));
            if session.stale {
                headers.insert(SET_COOKIE, clear_session_cookie(&state.config));
            }
            Err((StatusCode::FOUND, headers).into_response())
        }
    }
}

/// Attach the stale-cookie removal to a page response.
fn respond(state: &AppState, session: &OptionalSession, body: impl IntoResponse) -> Response {
    (clear_if_stale(&state.config, session.stale), body).into_response()
}

async fn playlists_or_empty(store: &dyn RecordStore, user: &str) -> Vec<PlaylistWithStats> {
    PlaylistRepo::list_with_stats(store, user)
        .await
        .unwrap_or_else(|e| {
            tracing::warn!(user, error = %e, "Failed to load playlists");
            Vec::new()
        })
}

// ---------------------------------------------------------------------------
// Layout
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutData {
    pub user: Option<User>,
    pub playlists: Vec<PlaylistWithStats>,
    pub liked_track_ids: Vec<String>,
}

/// GET /api/pages/layout
///
/// Shared data of every page: the user, their playlists and liked tracks.
pub async fn layout(State(state): State<AppState>, session: OptionalSession) -> Response {
    let Some(user) = session.user.clone() else {
        return respond(
            &state,
            &session,
            Json(LayoutData {
                user: None,
                playlists: Vec::new(),
                liked_track_ids: Vec::new(),
            }),
        );
    };

    let store = session.store(&state);
    let (playlists, liked) = futures::join!(
        playlists_or_empty(store.as_ref(), &user.id),
        ReactionRepo::liked_track_ids(store.as_ref(), &user.id),
    );
    let liked_track_ids = liked.unwrap_or_else(|e| {
        tracing::warn!(user_id = %user.id, error = %e, "Failed to load liked tracks");
        Vec::new()
    });

    respond(
        &state,
        &session,
        Json(LayoutData {
            user: Some(user),
            playlists,
            liked_track_ids,
        }),
    )
}

// ---------------------------------------------------------------------------
// Home
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct HomeData {
    pub user: Option<User>,
    pub tracks: Vec<TrackSummary>,
}

/// GET /api/pages/home
///
/// Radio candidates, optionally restricted to `HOME_TRACK_FILTER`.
pub async fn home(State(state): State<AppState>, session: OptionalSession) -> Response {
    let user = match page_user(&state, &session, "/") {
        Ok(user) => user.cloned(),
        Err(redirect) => return redirect,
    };

    let filter = state.config.home_track_filter.as_deref();
    let tracks = match TrackRepo::candidates(state.store.as_ref(), filter, None).await {
        Ok(tracks) => tracks.iter().map(Track::summary).collect(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to load radio tracks");
            Vec::new()
        }
    };

    respond(&state, &session, Json(HomeData { user, tracks }))
}

// ---------------------------------------------------------------------------
// Track
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackPageData {
    pub track: Track,
    pub owner: Option<User>,
    pub user_reaction: Option<ReactionKind>,
    pub user: Option<User>,
}

/// GET /api/pages/track/{id}
///
/// A single track with its owner and the viewer's reaction.
pub async fn track(
    State(state): State<AppState>,
    session: OptionalSession,
    Path(id): Path<String>,
) -> Response {
    let user = match page_user(&state, &session, &format!("/track/{id}")) {
        Ok(user) => user.cloned(),
        Err(redirect) => return redirect,
    };
    let store = session.store(&state);

    let track = match TrackRepo::find_active(store.as_ref(), &id).await {
        Ok(Some(track)) => track,
        Ok(None) => {
            let err = AppError::Core(CoreError::NotFound {
                entity: "Track",
                id,
            });
            return respond(&state, &session, err);
        }
        Err(e) => return respond(&state, &session, AppError::from(e)),
    };

    let owner = match track.user.as_deref() {
        Some(owner) => UserRepo::find(store.as_ref(), owner).await.unwrap_or_else(|e| {
            tracing::debug!(owner, error = %e, "Track owner not readable");
            None
        }),
        None => None,
    };

    let user_reaction = match &user {
        Some(user) => ReactionRepo::find(store.as_ref(), &user.id, &track.id)
            .await
            .unwrap_or_else(|e| {
                tracing::warn!(track_id = %track.id, error = %e, "Failed to load reaction");
                None
            })
            .map(|r| r.reaction),
        None => None,
    };

    respond(
        &state,
        &session,
        Json(TrackPageData {
            track,
            owner,
            user_reaction,
            user,
        }),
    )
}

// ---------------------------------------------------------------------------
// Profile
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct ProfileData {
    pub user: User,
    pub tracks: Vec<TrackSummary>,
    pub playlists: Vec<PlaylistWithStats>,
}

/// GET /api/pages/me
///
/// The user's own tracks and playlists. Redirects to the login page
/// without a valid session.
pub async fn me(State(state): State<AppState>, session: OptionalSession) -> Response {
    let user = match page_user(&state, &session, "/me") {
        Ok(Some(user)) => user.clone(),
        Ok(None) => return (StatusCode::FOUND, [(LOCATION, LOGIN_PATH)]).into_response(),
        Err(redirect) => return redirect,
    };
    let store = session.store(&state);

    let (tracks, playlists) = futures::join!(
        TrackRepo::list_by_user(store.as_ref(), &user.id, 1, PROFILE_TRACKS),
        playlists_or_empty(store.as_ref(), &user.id),
    );
    let tracks = match tracks {
        Ok(page) => page.items.iter().map(Track::summary).collect(),
        Err(e) => {
            tracing::error!(user_id = %user.id, error = %e, "Failed to load user tracks");
            Vec::new()
        }
    };

    respond(
        &state,
        &session,
        Json(ProfileData {
            user,
            tracks,
            playlists,
        }),
    )
}
