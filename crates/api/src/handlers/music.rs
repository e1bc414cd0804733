//! Handlers for music generation, the generation webhook and the catalog.

use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use radio_core::error::CoreError;
use radio_core::generation::{parse_generation_params, EnhancedPrompt};
use radio_core::reaction::ReactionKind;
use radio_db::models::track::TrackSummary;
use radio_db::repositories::{ReactionRepo, TrackRepo};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::error::{AppError, AppResult};
use crate::middleware::auth::{SessionUser, SubmitterSession};
use crate::query::PageParams;
use crate::response::SuccessResponse;
use crate::state::AppState;

/// Header carrying the client's idempotency key for submissions.
pub const IDEMPOTENCY_KEY_HEADER: &str = "idempotency-key";

// ---------------------------------------------------------------------------
// Generation
// ---------------------------------------------------------------------------

/// POST /api/music/generate
///
/// Validate and submit a generation job for the signed-in user. The
/// generation API's status and body are forwarded with `recordId` added.
/// With `"enhance": true` the plain prompt is first expanded into custom
/// mode fields by the prompt enhancer.
pub async fn generate(
    SubmitterSession(session): SubmitterSession,
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> AppResult<Response> {
    let body: Value = serde_json::from_slice(&body)
        .map_err(|_| AppError::BadRequest("Invalid JSON in request body".into()))?;

    let mut params = parse_generation_params(&body)?;

    let enhanced = if body.get("enhance").and_then(Value::as_bool).unwrap_or(false) {
        let enhanced = enhance_prompt(&state, params.prompt.as_deref()).await?;
        params.apply_enhancement(&enhanced);
        Some(enhanced.clamped_for(params.model))
    } else {
        None
    };

    let idempotency_key = headers
        .get(IDEMPOTENCY_KEY_HEADER)
        .and_then(|v| v.to_str().ok());

    let submission = state
        .coordinator
        .submit(
            session.client.as_ref(),
            params,
            Some(&session.user.id),
            idempotency_key,
        )
        .await?;

    let mut response = match submission.upstream_body {
        Value::Object(map) => map,
        other => {
            let mut map = Map::new();
            map.insert("data".into(), other);
            map
        }
    };
    response.insert("recordId".into(), json!(submission.request.id));
    if let Some(enhanced) = enhanced {
        response.insert("enhanced".into(), json!(enhanced));
    }

    let status = StatusCode::from_u16(submission.upstream_status).unwrap_or(StatusCode::OK);
    Ok((status, Json(Value::Object(response))).into_response())
}

#[derive(Debug, Deserialize)]
pub struct EnhanceRequest {
    pub prompt: Option<String>,
}

/// POST /api/music/enhance
///
/// Turn a plain song description into custom-mode fields.
pub async fn enhance(
    State(state): State<AppState>,
    Json(input): Json<EnhanceRequest>,
) -> AppResult<impl IntoResponse> {
    let enhanced = enhance_prompt(&state, input.prompt.as_deref()).await?;
    Ok(Json(enhanced))
}

async fn enhance_prompt(state: &AppState, prompt: Option<&str>) -> AppResult<EnhancedPrompt> {
    let prompt = prompt
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .ok_or_else(|| AppError::BadRequest("Prompt is required".into()))?;
    let enhancer = state.enhancer.as_ref().ok_or_else(|| {
        CoreError::Unavailable("Enhance feature is not available (Missing API Key)".into())
    })?;

    enhancer.enhance(prompt).await.map_err(|e| {
        tracing::error!(error = %e, "Prompt enhancement failed");
        AppError::InternalError(format!("Failed to enhance prompt: {e}"))
    })
}

/// POST /api/music/callback
///
/// Webhook for the generation API. Always answers 200.
pub async fn callback(State(state): State<AppState>, body: Bytes) -> impl IntoResponse {
    Json(state.coordinator.handle_callback(&body).await)
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

/// GET /api/music/latest
pub async fn latest(State(state): State<AppState>) -> Response {
    match TrackRepo::latest(state.store.as_ref()).await {
        Ok(Some(track)) => Json(json!({ "track": track.summary() })).into_response(),
        Ok(None) => Json(json!({ "track": null, "error": "No tracks available yet" })).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to load latest track");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "track": null, "error": "Failed to load track" })),
            )
                .into_response()
        }
    }
}

/// One page of track summaries in the catalog wire shape.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackPage {
    pub tracks: Vec<TrackSummary>,
    pub page: u32,
    pub per_page: u32,
    pub total_items: u64,
    pub total_pages: u64,
}

impl TrackPage {
    pub fn from_page(page: radio_db::ListPage<radio_db::models::track::Track>) -> Self {
        Self {
            tracks: page.items.iter().map(|t| t.summary()).collect(),
            page: page.page,
            per_page: page.per_page,
            total_items: page.total_items,
            total_pages: page.total_pages,
        }
    }
}

/// GET /api/music/tracks?page=&perPage=
pub async fn tracks(State(state): State<AppState>, Query(params): Query<PageParams>) -> Response {
    let (page, per_page) = params.resolve();
    match TrackRepo::list(state.store.as_ref(), page, per_page).await {
        Ok(list) => Json(TrackPage::from_page(list)).into_response(),
        Err(e) => {
            tracing::error!(error = %e, page, per_page, "Failed to load tracks");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "tracks": [], "error": "Failed to load tracks" })),
            )
                .into_response()
        }
    }
}

/// DELETE /api/music/tracks/{id}
///
/// Soft-delete a track owned by the signed-in user.
pub async fn delete_track(
    session: SessionUser,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let store = session.client.as_ref();
    let track = TrackRepo::find_active(store, &id)
        .await?
        .ok_or_else(|| CoreError::NotFound {
            entity: "Track",
            id: id.clone(),
        })?;

    if track.user.as_deref() != Some(session.user.id.as_str()) {
        return Err(CoreError::Forbidden("Only the owner can delete this track".into()).into());
    }

    TrackRepo::soft_delete(store, &track.id).await?;
    tracing::info!(track_id = %track.id, user_id = %session.user.id, "Track deleted");

    Ok(Json(SuccessResponse::ok()))
}

// ---------------------------------------------------------------------------
// Reactions
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReactionRequest {
    pub track_id: Option<String>,
    pub reaction: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ReactionResponse {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reaction: Option<ReactionKind>,
}

/// POST /api/music/reaction
///
/// Toggle a like or dislike on a track.
pub async fn reaction(
    session: SessionUser,
    Json(input): Json<ReactionRequest>,
) -> AppResult<impl IntoResponse> {
    let track_id = input
        .track_id
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::BadRequest("trackId is required".into()))?;
    let kind = input
        .reaction
        .as_deref()
        .and_then(ReactionKind::parse)
        .ok_or_else(|| AppError::BadRequest("reaction must be \"like\" or \"dislike\"".into()))?;

    let action =
        ReactionRepo::toggle(session.client.as_ref(), &session.user.id, &track_id, kind).await?;

    tracing::debug!(
        user_id = %session.user.id,
        track_id = %track_id,
        status = action.status(),
        "Reaction toggled",
    );

    Ok(Json(ReactionResponse {
        status: action.status(),
        reaction: action.resulting(),
    }))
}
