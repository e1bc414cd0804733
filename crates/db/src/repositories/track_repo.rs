//! Repository for the `radio_music_tracks` collection.
//!
//! Deletion is soft: every read except [`TrackRepo::find`] and the callback
//! upsert skips records with `deleted = true`.

use serde_json::{json, Map, Value};

use crate::collections::TRACKS;
use crate::models::track::{Track, TrackBackfill, TrackFields};
use crate::store::{BaasError, FileUpload, Filter, ListPage, ListQuery, RecordStore};

use super::{decode, decode_all, decode_opt, list_by_field};

/// Newest first.
const SORT_NEWEST: &str = "-created";

/// Media fields a track can carry as attached files.
pub const AUDIO_FIELD: &str = "audio";
pub const IMAGE_FIELD: &str = "image";

fn not_deleted() -> Filter {
    Filter::eq("deleted", false)
}

fn active_and(filter: Filter) -> Filter {
    Filter::And(vec![not_deleted(), filter])
}

pub struct TrackRepo;

impl TrackRepo {
    // -- Reads --------------------------------------------------------------

    /// Find a track by record id, including soft-deleted ones.
    pub async fn find(store: &dyn RecordStore, id: &str) -> Result<Option<Track>, BaasError> {
        decode_opt(store.get(TRACKS, id).await?)
    }

    /// Find a track that has not been deleted.
    pub async fn find_active(store: &dyn RecordStore, id: &str) -> Result<Option<Track>, BaasError> {
        Ok(Self::find(store, id).await?.filter(|t| !t.deleted))
    }

    /// Find a track by the id the generation API assigned to it.
    pub async fn find_by_track_id(
        store: &dyn RecordStore,
        track_id: &str,
    ) -> Result<Option<Track>, BaasError> {
        decode_opt(store.first(TRACKS, Filter::eq("track_id", track_id), None).await?)
    }

    pub async fn latest(store: &dyn RecordStore) -> Result<Option<Track>, BaasError> {
        decode_opt(store.first(TRACKS, not_deleted(), Some(SORT_NEWEST)).await?)
    }

    /// One page of the catalog, newest first.
    pub async fn list(
        store: &dyn RecordStore,
        page: u32,
        per_page: u32,
    ) -> Result<ListPage<Track>, BaasError> {
        let query = ListQuery::page(page, per_page)
            .sort(SORT_NEWEST)
            .filter(not_deleted());
        store.list(TRACKS, &query).await?.decode()
    }

    /// One page of the tracks generated by `user`, newest first.
    pub async fn list_by_user(
        store: &dyn RecordStore,
        user: &str,
        page: u32,
        per_page: u32,
    ) -> Result<ListPage<Track>, BaasError> {
        let query = ListQuery::page(page, per_page)
            .sort(SORT_NEWEST)
            .filter(active_and(Filter::eq("user", user)));
        store.list(TRACKS, &query).await?.decode()
    }

    /// Non-deleted tracks among `ids`, in the order of `ids`.
    pub async fn find_many(store: &dyn RecordStore, ids: &[String]) -> Result<Vec<Track>, BaasError> {
        let found: Vec<Track> =
            decode_all(list_by_field(store, TRACKS, "id", ids, Some(not_deleted())).await?)?;
        Ok(ids
            .iter()
            .filter_map(|id| found.iter().find(|t| &t.id == id).cloned())
            .collect())
    }

    /// Non-deleted tracks whose tags contain `tag` (when given), excluding
    /// `exclude`.
    pub async fn candidates(
        store: &dyn RecordStore,
        tag: Option<&str>,
        exclude: Option<&str>,
    ) -> Result<Vec<Track>, BaasError> {
        let mut parts = vec![not_deleted()];
        if let Some(tag) = tag.filter(|t| !t.trim().is_empty()) {
            parts.push(Filter::contains("tags", tag.trim()));
        }
        if let Some(id) = exclude {
            parts.push(Filter::ne("id", id));
        }
        decode_all(
            store
                .full_list(TRACKS, Some(Filter::And(parts)), Some(SORT_NEWEST))
                .await?,
        )
    }

    // -- Writes -------------------------------------------------------------

    /// Create or update the track delivered by a callback, keyed by the
    /// generation API's track id.
    pub async fn upsert_from_callback(
        store: &dyn RecordStore,
        fields: &TrackFields,
    ) -> Result<Track, BaasError> {
        let body = serde_json::to_value(fields)?;
        let record = match Self::find_by_track_id(store, &fields.track_id).await? {
            Some(existing) => store.update(TRACKS, &existing.id, &body).await?,
            None => store.create(TRACKS, &body).await?,
        };
        decode(record)
    }

    /// Copy request-derived fields onto a track where they are still unset.
    /// Returns the track unchanged when nothing needed filling.
    pub async fn backfill(
        store: &dyn RecordStore,
        track: Track,
        backfill: &TrackBackfill,
    ) -> Result<Track, BaasError> {
        let mut patch = Map::new();
        if track.task_id.is_none() {
            if let Some(task_id) = &backfill.task_id {
                patch.insert("task_id".into(), json!(task_id));
            }
        }
        if track.generation_prompt.is_none() {
            if let Some(prompt) = &backfill.generation_prompt {
                patch.insert("generation_prompt".into(), json!(prompt));
            }
        }
        if track.user.is_none() {
            if let Some(user) = &backfill.user {
                patch.insert("user".into(), json!(user));
            }
        }
        if patch.is_empty() {
            return Ok(track);
        }
        decode(store.update(TRACKS, &track.id, &Value::Object(patch)).await?)
    }

    /// Attach a stored media file to `field` of a track.
    pub async fn attach_media(
        store: &dyn RecordStore,
        id: &str,
        field: &str,
        file: FileUpload,
    ) -> Result<Track, BaasError> {
        decode(store.attach_file(TRACKS, id, field, file).await?)
    }

    pub async fn soft_delete(store: &dyn RecordStore, id: &str) -> Result<Track, BaasError> {
        decode(store.update(TRACKS, id, &json!({ "deleted": true })).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;

    fn fields(track_id: &str, title: &str) -> TrackFields {
        TrackFields {
            track_id: track_id.into(),
            title: title.into(),
            audio_url: format!("https://cdn.example.com/{track_id}.mp3"),
            duration: 120.0,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn upsert_is_keyed_by_external_track_id() {
        let store = MemoryStore::new();
        let first = TrackRepo::upsert_from_callback(&store, &fields("ext-1", "Draft"))
            .await
            .unwrap();
        let second = TrackRepo::upsert_from_callback(&store, &fields("ext-1", "Final"))
            .await
            .unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.title, "Final");
        assert_eq!(store.dump(TRACKS).await.len(), 1);
    }

    #[tokio::test]
    async fn backfill_only_sets_missing_fields() {
        let store = MemoryStore::new();
        store
            .seed(TRACKS, json!({"id": "trk000000000001", "track_id": "e", "user": "owner"}))
            .await;
        let track = TrackRepo::find(&store, "trk000000000001").await.unwrap().unwrap();

        let updated = TrackRepo::backfill(
            &store,
            track,
            &TrackBackfill {
                task_id: Some("task-1".into()),
                generation_prompt: Some("lofi".into()),
                user: Some("someone-else".into()),
            },
        )
        .await
        .unwrap();

        assert_eq!(updated.task_id.as_deref(), Some("task-1"));
        assert_eq!(updated.generation_prompt.as_deref(), Some("lofi"));
        assert_eq!(updated.user.as_deref(), Some("owner"));
    }

    #[tokio::test]
    async fn soft_deleted_tracks_are_hidden_from_listings() {
        let store = MemoryStore::new();
        store.seed(TRACKS, json!({"id": "trk000000000001", "tags": "lofi, chill"})).await;
        store.seed(TRACKS, json!({"id": "trk000000000002", "tags": "lofi"})).await;
        TrackRepo::soft_delete(&store, "trk000000000002").await.unwrap();

        let page = TrackRepo::list(&store, 1, 50).await.unwrap();
        assert_eq!(page.items.len(), 1);
        assert!(TrackRepo::find_active(&store, "trk000000000002").await.unwrap().is_none());
        assert!(TrackRepo::find(&store, "trk000000000002").await.unwrap().is_some());

        let lofi = TrackRepo::candidates(&store, Some("LOFI"), None).await.unwrap();
        assert_eq!(lofi.len(), 1);
        let excluding = TrackRepo::candidates(&store, Some("lofi"), Some("trk000000000001"))
            .await
            .unwrap();
        assert!(excluding.is_empty());
    }

    #[tokio::test]
    async fn find_many_keeps_requested_order() {
        let store = MemoryStore::new();
        store.seed(TRACKS, json!({"id": "a00000000000001"})).await;
        store.seed(TRACKS, json!({"id": "b00000000000002"})).await;
        let ids = vec!["b00000000000002".to_string(), "a00000000000001".to_string()];
        let tracks = TrackRepo::find_many(&store, &ids).await.unwrap();
        let got: Vec<&str> = tracks.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(got, ["b00000000000002", "a00000000000001"]);
    }
}
