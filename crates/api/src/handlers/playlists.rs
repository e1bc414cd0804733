//! Handlers for user playlists and the virtual "Liked Songs" playlist.
//!
//! Every endpoint requires a session; reads and writes go through the
//! user's own BaaS handle.

use std::collections::HashMap;

use axum::extract::Path;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use radio_core::error::CoreError;
use radio_core::reaction::ReactionKind;
use radio_core::types::RecordId;
use radio_db::models::playlist::{CreatePlaylist, Playlist, PlaylistEntry};
use radio_db::models::reaction::Reaction;
use radio_db::models::track::Track;
use radio_db::repositories::{AddEntryOutcome, PlaylistRepo, ReactionRepo, TrackRepo};
use radio_db::RecordStore;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::SessionUser;
use crate::response::{DataResponse, SuccessResponse};

/// Id of the virtual liked-songs playlist.
pub const LIKED_PLAYLIST_ID: &str = "liked";

// ---------------------------------------------------------------------------
// Payloads
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Validate)]
pub struct CreatePlaylistRequest {
    #[validate(length(min = 1, max = 100, message = "name must be 1 to 100 characters"))]
    pub name: String,
    #[serde(default)]
    #[validate(length(max = 500, message = "description must be 500 characters or less"))]
    pub description: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddTrackRequest {
    pub track_id: Option<String>,
}

/// A track as listed in a playlist. `playlist_track_id` identifies the
/// entry for removal; it is absent in the liked-songs playlist.
#[derive(Debug, Serialize)]
pub struct PlaylistSong {
    #[serde(flatten)]
    pub track: Track,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub playlist_track_id: Option<RecordId>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistDetail<P: Serialize> {
    pub playlist: P,
    pub songs: Vec<PlaylistSong>,
    pub user_reactions: HashMap<RecordId, ReactionKind>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VirtualPlaylist {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub is_virtual: bool,
}

#[derive(Debug, Serialize)]
pub struct AddTrackResponse {
    pub status: &'static str,
    pub entry: PlaylistEntry,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Load a playlist and check the session user owns it.
async fn owned_playlist(session: &SessionUser, id: &str) -> AppResult<Playlist> {
    let playlist = PlaylistRepo::find(session.client.as_ref(), id)
        .await?
        .ok_or_else(|| CoreError::NotFound {
            entity: "Playlist",
            id: id.to_string(),
        })?;
    if playlist.user != session.user.id {
        return Err(CoreError::Forbidden("Playlist belongs to another user".into()).into());
    }
    Ok(playlist)
}

/// Map of track id to the user's reaction, for the given tracks.
pub(crate) async fn reaction_map(
    store: &dyn RecordStore,
    user: &str,
    tracks: &[RecordId],
) -> HashMap<RecordId, ReactionKind> {
    if tracks.is_empty() {
        return HashMap::new();
    }
    match ReactionRepo::for_tracks(store, user, tracks).await {
        Ok(reactions) => into_map(reactions),
        Err(e) => {
            tracing::warn!(user, error = %e, "Failed to load reactions");
            HashMap::new()
        }
    }
}

fn into_map(reactions: Vec<Reaction>) -> HashMap<RecordId, ReactionKind> {
    reactions.into_iter().map(|r| (r.track, r.reaction)).collect()
}

// ---------------------------------------------------------------------------
// Playlists
// ---------------------------------------------------------------------------

/// GET /api/playlists
///
/// The user's playlists with track counts and durations.
pub async fn list(session: SessionUser) -> AppResult<impl IntoResponse> {
    let playlists = PlaylistRepo::list_with_stats(session.client.as_ref(), &session.user.id).await?;
    Ok(Json(DataResponse { data: playlists }))
}

/// POST /api/playlists
pub async fn create(
    session: SessionUser,
    Json(input): Json<CreatePlaylistRequest>,
) -> AppResult<impl IntoResponse> {
    let input = CreatePlaylistRequest {
        name: input.name.trim().to_string(),
        description: input.description.trim().to_string(),
    };
    input
        .validate()
        .map_err(|e| AppError::Core(CoreError::Validation(e.to_string())))?;

    let playlist = PlaylistRepo::create(
        session.client.as_ref(),
        &CreatePlaylist {
            user: session.user.id.clone(),
            name: input.name,
            description: input.description,
        },
    )
    .await?;

    tracing::info!(
        playlist_id = %playlist.id,
        user_id = %session.user.id,
        name = %playlist.name,
        "Playlist created",
    );

    Ok((StatusCode::CREATED, Json(DataResponse { data: playlist })))
}

/// GET /api/playlists/{id}
///
/// A playlist with its songs (newest entry first) and the user's reactions.
pub async fn get(
    session: SessionUser,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let playlist = owned_playlist(&session, &id).await?;
    let store = session.client.as_ref();

    let mut entries = PlaylistRepo::entries(store, &playlist.id).await?;
    entries.reverse();
    let track_ids: Vec<RecordId> = entries.iter().map(|e| e.track.clone()).collect();
    let tracks = TrackRepo::find_many(store, &track_ids).await?;

    let songs: Vec<PlaylistSong> = entries
        .iter()
        .filter_map(|entry| {
            tracks
                .iter()
                .find(|t| t.id == entry.track)
                .map(|track| PlaylistSong {
                    track: track.clone(),
                    playlist_track_id: Some(entry.id.clone()),
                })
        })
        .collect();
    let user_reactions = reaction_map(store, &session.user.id, &track_ids).await;

    Ok(Json(DataResponse {
        data: PlaylistDetail {
            playlist,
            songs,
            user_reactions,
        },
    }))
}

/// DELETE /api/playlists/{id}
pub async fn delete(
    session: SessionUser,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let playlist = owned_playlist(&session, &id).await?;
    PlaylistRepo::delete(session.client.as_ref(), &playlist.id).await?;

    tracing::info!(playlist_id = %playlist.id, user_id = %session.user.id, "Playlist deleted");
    Ok(Json(SuccessResponse::ok()))
}

// ---------------------------------------------------------------------------
// Entries
// ---------------------------------------------------------------------------

/// POST /api/playlists/{id}/tracks
///
/// Add a track. A track already in the playlist answers 200 with
/// `status: "exists"` instead of adding a duplicate.
pub async fn add_track(
    session: SessionUser,
    Path(id): Path<String>,
    Json(input): Json<AddTrackRequest>,
) -> AppResult<impl IntoResponse> {
    let track_id = input
        .track_id
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::BadRequest("trackId is required".into()))?;

    let playlist = owned_playlist(&session, &id).await?;
    let store = session.client.as_ref();
    let track = TrackRepo::find_active(store, &track_id)
        .await?
        .ok_or_else(|| CoreError::NotFound {
            entity: "Track",
            id: track_id.clone(),
        })?;

    let (status, body) =
        match PlaylistRepo::add_entry(store, &playlist.id, &track.id, &session.user.id).await? {
            AddEntryOutcome::Added(entry) => (
                StatusCode::CREATED,
                AddTrackResponse {
                    status: "added",
                    entry,
                },
            ),
            AddEntryOutcome::AlreadyPresent(entry) => (
                StatusCode::OK,
                AddTrackResponse {
                    status: "exists",
                    entry,
                },
            ),
        };

    tracing::debug!(
        playlist_id = %playlist.id,
        track_id = %track.id,
        status = body.status,
        "Playlist track added",
    );
    Ok((status, Json(body)))
}

/// DELETE /api/playlists/{id}/tracks/{entry_id}
pub async fn remove_track(
    session: SessionUser,
    Path((id, entry_id)): Path<(String, String)>,
) -> AppResult<impl IntoResponse> {
    let playlist = owned_playlist(&session, &id).await?;
    let store = session.client.as_ref();

    let entry = PlaylistRepo::find_entry(store, &entry_id)
        .await?
        .filter(|e| e.playlist == playlist.id)
        .ok_or_else(|| CoreError::NotFound {
            entity: "PlaylistEntry",
            id: entry_id.clone(),
        })?;
    PlaylistRepo::remove_entry(store, &entry.id).await?;

    Ok(Json(SuccessResponse::ok()))
}

// ---------------------------------------------------------------------------
// Liked songs
// ---------------------------------------------------------------------------

/// GET /api/playlists/liked
///
/// The user's liked, non-deleted tracks plus all of the user's reactions.
pub async fn liked(session: SessionUser) -> AppResult<impl IntoResponse> {
    let store = session.client.as_ref();
    let liked_ids = ReactionRepo::liked_track_ids(store, &session.user.id).await?;
    let songs = TrackRepo::find_many(store, &liked_ids)
        .await?
        .into_iter()
        .map(|track| PlaylistSong {
            track,
            playlist_track_id: None,
        })
        .collect();
    let user_reactions = into_map(ReactionRepo::all_for_user(store, &session.user.id).await?);

    Ok(Json(DataResponse {
        data: PlaylistDetail {
            playlist: VirtualPlaylist {
                id: LIKED_PLAYLIST_ID,
                name: "Liked Songs",
                description: "Your collection of liked tracks",
                is_virtual: true,
            },
            songs,
            user_reactions,
        },
    }))
}
