//! Handlers for the shared listening room.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use radio_core::types::{RecordId, Timestamp};
use radio_db::models::room::Room;
use radio_db::models::track::TrackSummary;
use radio_db::repositories::TrackRepo;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::{AppError, AppResult};
use crate::response::SuccessResponse;
use crate::state::AppState;

/// Room with its tracks resolved into summaries.
#[derive(Debug, Serialize)]
pub struct RoomView {
    pub id: RecordId,
    pub current_track: Option<TrackSummary>,
    pub current_start: Option<Timestamp>,
    pub next_track: Option<TrackSummary>,
    pub prompt: Option<String>,
    pub active_request: Option<RecordId>,
    pub created: Option<Timestamp>,
    pub updated: Option<Timestamp>,
}

async fn track_summary(state: &AppState, id: Option<&str>) -> Option<TrackSummary> {
    let id = id?;
    match TrackRepo::find(state.store.as_ref(), id).await {
        Ok(track) => track.map(|t| t.summary()),
        Err(e) => {
            tracing::error!(track_id = id, error = %e, "Failed to load room track");
            None
        }
    }
}

async fn room_view(state: &AppState, room: Room) -> RoomView {
    let (current_track, next_track) = tokio::join!(
        track_summary(state, room.current_track.as_deref()),
        track_summary(state, room.next_track.as_deref()),
    );
    RoomView {
        current_track,
        next_track,
        current_start: room.current_start,
        prompt: Some(room.prompt).filter(|p| !p.is_empty()),
        active_request: room.active_request,
        created: room.created,
        updated: room.updated,
        id: room.id,
    }
}

/// GET /api/room
///
/// The room with current and next tracks. When nothing is queued a room
/// generation is started in the background.
pub async fn get_room(State(state): State<AppState>) -> Response {
    let room = match state.advancer.current_room().await {
        Ok(Some(room)) => room,
        Ok(None) => {
            return Json(json!({ "room": null, "error": "No room available yet" })).into_response();
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to load room");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "room": null, "error": "Failed to load room" })),
            )
                .into_response();
        }
    };

    if room.next_track.is_none()
        && room.active_request.is_none()
        && !room.disable_generate
        && state.coordinator.can_generate()
    {
        let advancer = state.advancer.clone();
        tokio::spawn(async move {
            if let Err(e) = advancer.generate().await {
                tracing::debug!(error = %e, "Background room generation skipped");
            }
        });
    }

    Json(json!({ "room": room_view(&state, room).await })).into_response()
}

/// POST /api/room/advance
///
/// Promote the queued track and refill the queue.
pub async fn advance(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    state.advancer.advance().await?;
    Ok(Json(SuccessResponse::ok()))
}

/// POST /api/room/generate
///
/// Ask the generation API for the room's next track.
pub async fn generate(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let generation = state.advancer.generate().await?;
    Ok(Json(RoomGenerateResponse {
        success: true,
        data: generation.upstream_body,
        record_id: generation.request_id,
    }))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomGenerateResponse {
    pub success: bool,
    pub data: Value,
    pub record_id: RecordId,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayRequest {
    pub track_id: Option<String>,
}

/// POST /api/room/play
///
/// Start a track now and queue a related one after it.
pub async fn play(
    State(state): State<AppState>,
    Json(input): Json<PlayRequest>,
) -> AppResult<impl IntoResponse> {
    let track_id = input
        .track_id
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::BadRequest("Track ID is required".into()))?;

    state.advancer.play(&track_id).await?;
    Ok(Json(SuccessResponse::ok()))
}
