//! Generation request coordinator.
//!
//! Owns both halves of a generation job: [`GenerationCoordinator::submit`]
//! persists a request record and hands the job to the generation API, and
//! [`GenerationCoordinator::handle_callback`] folds the API's webhook
//! deliveries back into track records and the room queue.
//!
//! Request lifecycle: `pending -> submitted | failed`. Completion has no
//! status of its own; the tracks carrying the request's task id are the
//! terminal signal.

use std::sync::Arc;
use std::time::Duration;

use radio_core::error::CoreError;
use radio_core::generation::{validate_generation_params, GenerationParams};
use radio_core::types::RecordId;
use radio_db::models::generation::{
    CreateGenerationRequest, GenerationRequest, RequestStatus, UpdateGenerationRequest,
    UpsertGenerationCallback,
};
use radio_db::models::room::RoomUpdate;
use radio_db::models::track::{Track, TrackBackfill, TrackFields};
use radio_db::repositories::track_repo;
use radio_db::repositories::{GenerationCallbackRepo, GenerationRequestRepo, RoomRepo, TrackRepo};
use radio_db::{BaasError, FileUpload, RecordStore};
use radio_suno::api::{GenerateRequest, MusicGenerator, SunoApiError};
use radio_suno::media::MediaFetcher;
use radio_suno::messages::{CallbackPayload, CallbackTrack};
use serde::Serialize;
use serde_json::{json, Value};
use tokio::sync::Mutex;

use crate::error::{AppError, AppResult};

/// Upper bound on callback processing. The generation API expects an
/// answer within 15 seconds.
pub const CALLBACK_DEADLINE: Duration = Duration::from_secs(12);

/// Upper bound on a single media download during callback processing.
pub const MEDIA_FETCH_TIMEOUT: Duration = Duration::from_secs(4);

/// Result of a submission.
#[derive(Debug, Clone)]
pub struct Submission {
    /// The persisted request record.
    pub request: GenerationRequest,
    /// Status the generation API answered with.
    pub upstream_status: u16,
    /// Body the generation API answered with.
    pub upstream_body: Value,
    /// `true` when an earlier submission with the same idempotency key was
    /// returned instead of calling upstream again.
    pub replayed: bool,
}

impl Submission {
    /// The job was queued upstream.
    pub fn accepted(&self) -> bool {
        self.request.status == RequestStatus::Submitted
    }

    pub fn task_id(&self) -> Option<&str> {
        self.request.task_id.as_deref()
    }
}

/// Acknowledgement body for a webhook delivery. Always sent with HTTP 200.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum CallbackAck {
    Received {
        #[serde(rename = "taskId")]
        task_id: String,
    },
    Error {
        message: String,
    },
}

/// Coordinates generation submissions and their webhook callbacks.
pub struct GenerationCoordinator {
    store: Arc<dyn RecordStore>,
    generator: Option<Arc<dyn MusicGenerator>>,
    media: Option<Arc<dyn MediaFetcher>>,
    callback_url: String,
    room_id: Option<String>,
    room_lock: Arc<Mutex<()>>,
    media_timeout: Duration,
}

impl GenerationCoordinator {
    pub fn new(
        store: Arc<dyn RecordStore>,
        generator: Option<Arc<dyn MusicGenerator>>,
        media: Option<Arc<dyn MediaFetcher>>,
        callback_url: String,
        room_id: Option<String>,
        room_lock: Arc<Mutex<()>>,
    ) -> Self {
        Self {
            store,
            generator,
            media,
            callback_url,
            room_id,
            room_lock,
            media_timeout: MEDIA_FETCH_TIMEOUT,
        }
    }

    /// Override the per-download media timeout.
    pub fn with_media_timeout(mut self, timeout: Duration) -> Self {
        self.media_timeout = timeout;
        self
    }

    /// Whether a generation API is configured.
    pub fn can_generate(&self) -> bool {
        self.generator.is_some()
    }

    /// The anonymous store handle the coordinator writes callbacks with.
    pub fn store(&self) -> &Arc<dyn RecordStore> {
        &self.store
    }

    // -----------------------------------------------------------------------
    // Submission
    // -----------------------------------------------------------------------

    /// Validate, persist and submit a generation job.
    ///
    /// `store` is the handle the request is written with (the user's session
    /// handle for user submissions). The request is persisted before the
    /// generation API is called; if that write fails nothing is sent.
    pub async fn submit(
        &self,
        store: &dyn RecordStore,
        params: GenerationParams,
        user: Option<&str>,
        idempotency_key: Option<&str>,
    ) -> AppResult<Submission> {
        validate_generation_params(&params)?;
        let generator = self.generator.as_ref().ok_or_else(|| {
            CoreError::Unavailable("Generation API key is not configured".into())
        })?;

        let idempotency_key = idempotency_key.map(str::trim).filter(|k| !k.is_empty());
        if let Some(key) = idempotency_key {
            if let Some(existing) =
                GenerationRequestRepo::find_by_idempotency_key(store, user, key).await?
            {
                match existing.status {
                    RequestStatus::Submitted => {
                        tracing::info!(request_id = %existing.id, key, "Replaying idempotent submission");
                        return Ok(replayed(existing));
                    }
                    RequestStatus::Pending => {
                        return Err(CoreError::Conflict(
                            "A submission with this idempotency key is still in progress".into(),
                        )
                        .into());
                    }
                    RequestStatus::Failed => {
                        tracing::info!(request_id = %existing.id, key, "Retrying failed idempotent submission");
                    }
                }
            }
        }

        let request = GenerationRequestRepo::create(
            store,
            &CreateGenerationRequest {
                params: params.clone(),
                callback_url: self.callback_url.clone(),
                user: user.map(str::to_string),
                status: RequestStatus::Pending,
                idempotency_key: idempotency_key.map(str::to_string),
            },
        )
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to persist generation request");
            AppError::InternalError(format!("Failed to persist generation request: {e}"))
        })?;

        tracing::info!(request_id = %request.id, model = params.model.as_str(), "Submitting generation job");

        let upstream = generator
            .submit(&GenerateRequest {
                params,
                callback_url: self.callback_url.clone(),
            })
            .await;

        match upstream {
            Ok(response) => {
                let (status, task_id, error) = if response.is_accepted() {
                    (
                        RequestStatus::Submitted,
                        response.task_id().map(str::to_string),
                        None,
                    )
                } else {
                    (
                        RequestStatus::Failed,
                        None,
                        Some(response.message().unwrap_or("Job rejected").to_string()),
                    )
                };
                let request = self
                    .record_outcome(store, request, status, task_id, error)
                    .await;
                tracing::info!(
                    request_id = %request.id,
                    status = request.status.as_str(),
                    task_id = request.task_id.as_deref().unwrap_or_default(),
                    "Generation job submitted",
                );
                Ok(Submission {
                    request,
                    upstream_status: response.status,
                    upstream_body: response.body,
                    replayed: false,
                })
            }
            Err(e) => {
                tracing::error!(request_id = %request.id, error = %e, "Generation API call failed");
                let reason = match &e {
                    SunoApiError::ApiError { status, .. } => format!("Generation API returned {status}"),
                    SunoApiError::Request(err) => format!("Generation API unreachable: {err}"),
                };
                self.record_outcome(store, request, RequestStatus::Failed, None, Some(reason))
                    .await;
                Err(e.into())
            }
        }
    }

    /// Write the upstream outcome. A failed write is logged and the
    /// in-memory record is updated so the caller still sees the outcome.
    async fn record_outcome(
        &self,
        store: &dyn RecordStore,
        mut request: GenerationRequest,
        status: RequestStatus,
        task_id: Option<String>,
        error: Option<String>,
    ) -> GenerationRequest {
        let outcome = UpdateGenerationRequest {
            status,
            task_id,
            error,
        };
        match GenerationRequestRepo::record_outcome(store, &request.id, &outcome).await {
            Ok(updated) => updated,
            Err(e) => {
                tracing::error!(request_id = %request.id, error = %e, "Failed to record generation outcome");
                request.status = outcome.status;
                request.task_id = outcome.task_id;
                request.error = outcome.error;
                request
            }
        }
    }

    // -----------------------------------------------------------------------
    // Webhook
    // -----------------------------------------------------------------------

    /// Process a raw webhook body. Never fails: problems are logged and
    /// reported in the acknowledgement only.
    pub async fn handle_callback(&self, body: &[u8]) -> CallbackAck {
        let payload: CallbackPayload = match serde_json::from_slice(body) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::error!(error = %e, "Malformed generation callback");
                return CallbackAck::Error {
                    message: format!("Malformed callback payload: {e}"),
                };
            }
        };

        let task_id = payload.data.task_id.clone();
        tracing::info!(
            task_id = %task_id,
            code = payload.code,
            callback_type = payload.data.callback_type.as_str(),
            tracks = payload.tracks().len(),
            "Received generation callback",
        );

        match tokio::time::timeout(CALLBACK_DEADLINE, self.process_callback(&payload)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                tracing::error!(task_id = %task_id, error = %e, "Generation callback processing failed");
            }
            Err(_) => {
                tracing::error!(task_id = %task_id, "Generation callback processing timed out");
            }
        }

        CallbackAck::Received { task_id }
    }

    async fn process_callback(&self, payload: &CallbackPayload) -> Result<(), BaasError> {
        let store = self.store.as_ref();
        let task_id = payload.data.task_id.as_str();

        if let Err(e) = GenerationCallbackRepo::upsert(
            store,
            &UpsertGenerationCallback {
                task_id: task_id.to_string(),
                code: payload.code,
                msg: payload.msg.clone(),
                callback_type: payload.data.callback_type.as_str().to_string(),
                data: serde_json::to_value(payload.tracks()).unwrap_or(Value::Null),
            },
        )
        .await
        {
            tracing::error!(task_id, error = %e, "Failed to record generation callback");
        }

        let request = match GenerationRequestRepo::find_by_task_id(store, task_id).await {
            Ok(request) => request,
            Err(e) => {
                tracing::error!(task_id, error = %e, "Failed to look up generation request");
                None
            }
        };

        if !payload.is_success() {
            tracing::warn!(
                task_id,
                code = payload.code,
                msg = %payload.msg,
                reason = payload.failure_reason(),
                "Generation failed",
            );
            return self.release_room(request.as_ref().map(|r| r.id.as_str())).await;
        }

        let backfill = TrackBackfill {
            task_id: Some(task_id.to_string()),
            generation_prompt: request.as_ref().and_then(GenerationRequest::generation_prompt),
            user: request.as_ref().and_then(|r| r.user.clone()),
        };

        let mut saved = Vec::new();
        for delivered in payload.tracks() {
            match self.save_track(delivered, &backfill).await {
                Ok(track) => saved.push((delivered, track)),
                Err(e) => {
                    tracing::error!(task_id, track_id = %delivered.id, error = %e, "Failed to save generated track");
                }
            }
        }

        // The room is settled before any media download starts.
        let first_playable = saved.iter().find(|(_, track)| track.is_playable());
        if let (Some(request), Some((_, first))) = (&request, first_playable) {
            if let Err(e) = self.queue_in_room(&request.id, &first.id).await {
                tracing::error!(task_id, error = %e, "Failed to queue generated track");
            }
        }

        if let Some(media) = &self.media {
            for (delivered, track) in saved {
                self.attach_media(media.as_ref(), delivered, track).await;
            }
        }
        Ok(())
    }

    /// Upsert one delivered track and backfill request fields.
    async fn save_track(
        &self,
        delivered: &CallbackTrack,
        backfill: &TrackBackfill,
    ) -> Result<Track, BaasError> {
        let store = self.store.as_ref();
        let fields = TrackFields {
            track_id: delivered.id.clone(),
            title: delivered.title.clone(),
            prompt: delivered.prompt.clone(),
            tags: delivered.tags.clone(),
            model_name: delivered.model_name.clone(),
            duration: delivered.duration.unwrap_or_default(),
            audio_url: delivered.audio_url.clone(),
            source_audio_url: delivered.source_audio_url.clone(),
            stream_audio_url: delivered.stream_audio_url.clone(),
            source_stream_audio_url: delivered.source_stream_audio_url.clone(),
            image_url: delivered.image_url.clone(),
            source_image_url: delivered.source_image_url.clone(),
            create_time: delivered.create_time_text(),
        };

        let track = TrackRepo::upsert_from_callback(store, &fields).await?;
        let track = TrackRepo::backfill(store, track, backfill).await?;
        tracing::debug!(track_id = %track.id, external_id = %delivered.id, "Saved generated track");
        Ok(track)
    }

    /// Store the audio and cover files a track does not have yet.
    async fn attach_media(&self, media: &dyn MediaFetcher, delivered: &CallbackTrack, mut track: Track) {
        if track.audio.is_none() {
            if let Some(url) = delivered.audio_source() {
                track = self
                    .attach(media, track, url, track_repo::AUDIO_FIELD, "mp3")
                    .await;
            }
        }
        if track.image.is_none() {
            if let Some(url) = delivered.image_source() {
                self.attach(media, track, url, track_repo::IMAGE_FIELD, "jpeg")
                    .await;
            }
        }
    }

    /// Fetch one media URL and attach it. Failures leave the field empty
    /// for a later delivery to fill.
    async fn attach(
        &self,
        media: &dyn MediaFetcher,
        track: Track,
        url: &str,
        field: &str,
        extension: &str,
    ) -> Track {
        let file = match tokio::time::timeout(self.media_timeout, media.fetch(url)).await {
            Ok(Ok(file)) => file,
            Ok(Err(e)) => {
                tracing::warn!(track_id = %track.id, field, error = %e, "Media download failed");
                return track;
            }
            Err(_) => {
                tracing::warn!(track_id = %track.id, field, url, "Media download timed out");
                return track;
            }
        };
        let file_name = if file.file_name.contains('.') && file.file_name != "media.bin" {
            file.file_name
        } else {
            format!("{}.{extension}", uuid::Uuid::new_v4())
        };
        let upload = FileUpload {
            file_name,
            content_type: file.content_type,
            bytes: file.bytes,
        };
        match TrackRepo::attach_media(self.store.as_ref(), &track.id, field, upload).await {
            Ok(updated) => updated,
            Err(e) => {
                tracing::warn!(track_id = %track.id, field, error = %e, "Media attach failed");
                track
            }
        }
    }

    // -----------------------------------------------------------------------
    // Room effects
    // -----------------------------------------------------------------------

    /// Queue a finished track when the room is waiting on `request_id`.
    async fn queue_in_room(&self, request_id: &str, track_id: &RecordId) -> Result<(), BaasError> {
        let _guard = self.room_lock.lock().await;
        let store = self.store.as_ref();
        let Some(room) = RoomRepo::resolve(store, self.room_id.as_deref()).await? else {
            return Ok(());
        };
        if room.active_request.as_deref() != Some(request_id) {
            return Ok(());
        }

        let mut update = RoomUpdate {
            active_request: Some(None),
            ..Default::default()
        };
        if radio_core::room::should_queue_generated(&room.state(), request_id) {
            update.next_track = Some(Some(track_id.clone()));
        }
        RoomRepo::update(store, &room.id, &update).await?;
        tracing::info!(room_id = %room.id, request_id, track_id = %track_id, "Generated track queued");
        Ok(())
    }

    /// Clear the room's in-flight marker after a failed generation.
    ///
    /// Cleared when it points at the failed request, or when the failed task
    /// cannot be matched to any request.
    async fn release_room(&self, request_id: Option<&str>) -> Result<(), BaasError> {
        let _guard = self.room_lock.lock().await;
        let store = self.store.as_ref();
        let Some(room) = RoomRepo::resolve(store, self.room_id.as_deref()).await? else {
            return Ok(());
        };
        let Some(active) = room.active_request.as_deref() else {
            return Ok(());
        };
        if request_id.is_some_and(|id| id != active) {
            return Ok(());
        }

        RoomRepo::update(
            store,
            &room.id,
            &RoomUpdate {
                active_request: Some(None),
                ..Default::default()
            },
        )
        .await?;
        tracing::info!(room_id = %room.id, "Room generation slot released after failure");
        Ok(())
    }
}

fn replayed(request: GenerationRequest) -> Submission {
    let body = json!({
        "code": 200,
        "msg": "replayed",
        "data": { "taskId": request.task_id },
    });
    Submission {
        upstream_status: 200,
        upstream_body: body,
        replayed: true,
        request,
    }
}
