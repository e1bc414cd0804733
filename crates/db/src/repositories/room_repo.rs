//! Repository for the `radio_rooms` collection.

use crate::collections::ROOMS;
use crate::models::room::{Room, RoomUpdate};
use crate::store::{BaasError, ListQuery, RecordStore};

use super::{decode, decode_opt};

/// Provides access to the shared room record.
pub struct RoomRepo;

impl RoomRepo {
    pub async fn find(store: &dyn RecordStore, id: &str) -> Result<Option<Room>, BaasError> {
        decode_opt(store.get(ROOMS, id).await?)
    }

    /// The most recently created room.
    pub async fn latest(store: &dyn RecordStore) -> Result<Option<Room>, BaasError> {
        let page = store
            .list(ROOMS, &ListQuery::page(1, 1).sort("-created"))
            .await?;
        decode_opt(page.items.into_iter().next())
    }

    /// The configured room, or the latest one when no id is configured.
    pub async fn resolve(
        store: &dyn RecordStore,
        room_id: Option<&str>,
    ) -> Result<Option<Room>, BaasError> {
        match room_id {
            Some(id) => Self::find(store, id).await,
            None => Self::latest(store).await,
        }
    }

    /// Patch the room with every field set in `update`.
    pub async fn update(
        store: &dyn RecordStore,
        id: &str,
        update: &RoomUpdate,
    ) -> Result<Room, BaasError> {
        decode(store.update(ROOMS, id, &update.to_patch()).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;
    use serde_json::json;

    #[tokio::test]
    async fn resolve_prefers_configured_id() {
        let store = MemoryStore::new();
        store.seed(ROOMS, json!({"id": "room00000000001", "prompt": "first"})).await;
        store.seed(ROOMS, json!({"id": "room00000000002", "prompt": "second"})).await;

        let configured = RoomRepo::resolve(&store, Some("room00000000001")).await.unwrap();
        assert_eq!(configured.unwrap().prompt, "first");

        let latest = RoomRepo::resolve(&store, None).await.unwrap();
        assert_eq!(latest.unwrap().prompt, "second");
    }

    #[tokio::test]
    async fn update_clears_relations() {
        let store = MemoryStore::new();
        store
            .seed(ROOMS, json!({"id": "room00000000001", "next_track": "t1", "active_request": "q1"}))
            .await;
        let room = RoomRepo::update(
            &store,
            "room00000000001",
            &RoomUpdate {
                current_track: Some(Some("t1".into())),
                next_track: Some(None),
                active_request: Some(None),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(room.current_track.as_deref(), Some("t1"));
        assert!(room.next_track.is_none());
        assert!(room.active_request.is_none());
    }
}
