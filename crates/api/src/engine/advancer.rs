//! Room advancement.
//!
//! The room record is read-modify-written by several callers (the advance
//! endpoint, the ticker, manual play, room generation and the generation
//! webhook). All of them serialize on one shared mutex so that, within this
//! process, a mutation always starts from the latest room state.

use std::sync::Arc;

use axum::http::StatusCode;
use chrono::Utc;
use radio_core::error::CoreError;
use radio_core::generation::GenerationParams;
use radio_core::room::{plan_advance, Refill};
use radio_core::types::RecordId;
use radio_db::models::room::{Room, RoomUpdate};
use radio_db::models::track::Track;
use radio_db::repositories::{RoomRepo, TrackRepo};
use radio_db::RecordStore;
use rand::seq::IndexedRandom;
use serde_json::Value;
use tokio::sync::Mutex;

use crate::engine::coordinator::GenerationCoordinator;
use crate::error::{AppError, AppResult};

/// What an advance tick did.
#[derive(Debug, Clone)]
pub struct AdvanceOutcome {
    pub room: Room,
    /// The track promoted to the current slot, if any.
    pub promoted: Option<RecordId>,
    /// Request id of a generation submitted for the queue slot.
    pub submitted: Option<RecordId>,
    /// Track picked at random for the queue slot.
    pub picked: Option<RecordId>,
}

impl AdvanceOutcome {
    pub fn changed(&self) -> bool {
        self.promoted.is_some() || self.submitted.is_some() || self.picked.is_some()
    }
}

/// Result of a room generation request.
#[derive(Debug, Clone)]
pub struct RoomGeneration {
    pub request_id: RecordId,
    pub upstream_body: Value,
}

/// Serializes every mutation of the shared room.
pub struct RoomAdvancer {
    store: Arc<dyn RecordStore>,
    coordinator: Arc<GenerationCoordinator>,
    lock: Arc<Mutex<()>>,
    room_id: Option<String>,
    play_tag: String,
}

impl RoomAdvancer {
    pub fn new(
        store: Arc<dyn RecordStore>,
        coordinator: Arc<GenerationCoordinator>,
        lock: Arc<Mutex<()>>,
        room_id: Option<String>,
        play_tag: String,
    ) -> Self {
        Self {
            store,
            coordinator,
            lock,
            room_id,
            play_tag,
        }
    }

    /// Load the configured room without taking the lock.
    pub async fn current_room(&self) -> AppResult<Option<Room>> {
        Ok(RoomRepo::resolve(self.store.as_ref(), self.room_id.as_deref()).await?)
    }

    async fn load_room(&self) -> AppResult<Room> {
        self.current_room().await?.ok_or_else(|| {
            CoreError::NotFound {
                entity: "Room",
                id: self.room_id.clone().unwrap_or_else(|| "latest".into()),
            }
            .into()
        })
    }

    /// Promote the queued track and refill the queue slot.
    ///
    /// Refilling prefers a new generation; when generation is disabled for
    /// the room or the submission fails, a random catalog track is queued
    /// instead. At most one room update is written.
    pub async fn advance(&self) -> AppResult<AdvanceOutcome> {
        let _guard = self.lock.lock().await;
        let mut room = self.load_room().await?;
        let plan = plan_advance(&room.state(), Utc::now());

        let mut update = RoomUpdate::default();
        let mut outcome = AdvanceOutcome {
            room: room.clone(),
            promoted: None,
            submitted: None,
            picked: None,
        };

        if let Some(promotion) = plan.promotion {
            update.current_track = Some(Some(promotion.track.clone()));
            update.next_track = Some(None);
            update.current_start = Some(promotion.started_at);
            outcome.promoted = Some(promotion.track);
        }

        match plan.refill {
            Refill::Nothing => {}
            Refill::Generate => match self.submit_for_room(&room).await {
                Ok(request_id) => {
                    update.active_request = Some(Some(request_id.clone()));
                    outcome.submitted = Some(request_id);
                }
                Err(e) => {
                    tracing::warn!(room_id = %room.id, error = %e, "Room generation failed, picking a random track");
                    let track = self.pick_fallback().await?;
                    update.next_track = Some(Some(track.clone()));
                    outcome.picked = Some(track);
                }
            },
            Refill::PickRandom => {
                let track = self.pick_fallback().await?;
                update.next_track = Some(Some(track.clone()));
                outcome.picked = Some(track);
            }
        }

        if !update.is_empty() {
            room = RoomRepo::update(self.store.as_ref(), &room.id, &update).await?;
            tracing::info!(
                room_id = %room.id,
                promoted = outcome.promoted.as_deref().unwrap_or_default(),
                submitted = outcome.submitted.as_deref().unwrap_or_default(),
                picked = outcome.picked.as_deref().unwrap_or_default(),
                "Room advanced",
            );
        }
        outcome.room = room;
        Ok(outcome)
    }

    /// Submit a generation for the room's queue slot on explicit request.
    pub async fn generate(&self) -> AppResult<RoomGeneration> {
        let _guard = self.lock.lock().await;
        let room = self.load_room().await?;

        if room.active_request.is_some() {
            return Err(CoreError::Conflict("Generation already in progress".into()).into());
        }
        if room.prompt.trim().is_empty() {
            return Err(CoreError::Validation("No prompt available for generation".into()).into());
        }
        if !self.coordinator.can_generate() {
            return Err(CoreError::Unavailable("Generation API key is not configured".into()).into());
        }

        let submission = self
            .coordinator
            .submit(
                self.store.as_ref(),
                GenerationParams::for_room(&room.prompt, room.instrumental),
                None,
                None,
            )
            .await?;
        if !submission.accepted() {
            return Err(AppError::Upstream {
                status: StatusCode::BAD_GATEWAY.as_u16(),
                body: submission.upstream_body.to_string(),
            });
        }

        let request_id = submission.request.id.clone();
        RoomRepo::update(
            self.store.as_ref(),
            &room.id,
            &RoomUpdate {
                active_request: Some(Some(request_id.clone())),
                ..Default::default()
            },
        )
        .await?;
        tracing::info!(room_id = %room.id, request_id = %request_id, "Room generation submitted");

        Ok(RoomGeneration {
            request_id,
            upstream_body: submission.upstream_body,
        })
    }

    /// Start `track_id` now and queue a related track after it.
    pub async fn play(&self, track_id: &str) -> AppResult<Room> {
        let _guard = self.lock.lock().await;
        let room = self.load_room().await?;
        let store = self.store.as_ref();

        let track = TrackRepo::find_active(store, track_id)
            .await?
            .ok_or_else(|| CoreError::NotFound {
                entity: "Track",
                id: track_id.to_string(),
            })?;

        let next = match self.pick_random(Some(self.play_tag.as_str()), Some(track.id.as_str())).await {
            Ok(next) => next.map(|t| t.id),
            Err(e) => {
                tracing::warn!(tag = %self.play_tag, error = %e, "Follow-up track lookup failed");
                None
            }
        };

        let update = RoomUpdate {
            current_track: Some(Some(track.id.clone())),
            next_track: Some(next),
            current_start: Some(Utc::now()),
            active_request: None,
        };
        let room = RoomRepo::update(store, &room.id, &update).await?;
        tracing::info!(room_id = %room.id, track_id = %track.id, "Room playing track");
        Ok(room)
    }

    async fn submit_for_room(&self, room: &Room) -> AppResult<RecordId> {
        if room.prompt.trim().is_empty() {
            return Err(CoreError::Validation("No prompt available for generation".into()).into());
        }
        let submission = self
            .coordinator
            .submit(
                self.store.as_ref(),
                GenerationParams::for_room(&room.prompt, room.instrumental),
                None,
                None,
            )
            .await?;
        if submission.accepted() {
            Ok(submission.request.id)
        } else {
            Err(AppError::Upstream {
                status: submission.upstream_status,
                body: submission.upstream_body.to_string(),
            })
        }
    }

    async fn pick_fallback(&self) -> AppResult<RecordId> {
        self.pick_random(None, None)
            .await?
            .map(|t| t.id)
            .ok_or_else(|| CoreError::Internal("No tracks available".into()).into())
    }

    /// A uniformly random non-deleted track, optionally restricted to a tag.
    async fn pick_random(&self, tag: Option<&str>, exclude: Option<&str>) -> AppResult<Option<Track>> {
        let candidates = TrackRepo::candidates(self.store.as_ref(), tag, exclude).await?;
        Ok(candidates.choose(&mut rand::rng()).cloned())
    }
}
