//! Repository for `radio_playlists` and `radio_playlist_track`.

use radio_core::types::RecordId;
use serde_json::json;

use crate::collections::{PLAYLISTS, PLAYLIST_ENTRIES};
use crate::models::playlist::{CreatePlaylist, Playlist, PlaylistEntry, PlaylistWithStats};
use crate::store::{BaasError, Filter, ListQuery, RecordStore};

use super::track_repo::TrackRepo;
use super::{decode, decode_all, decode_opt, list_by_field};

/// Playlists shown per user.
const MAX_PLAYLISTS: u32 = 50;

/// Result of adding a track to a playlist.
#[derive(Debug, Clone)]
pub enum AddEntryOutcome {
    Added(PlaylistEntry),
    /// The track was already in the playlist; nothing was written.
    AlreadyPresent(PlaylistEntry),
}

pub struct PlaylistRepo;

impl PlaylistRepo {
    // -- Playlists ----------------------------------------------------------

    pub async fn find(store: &dyn RecordStore, id: &str) -> Result<Option<Playlist>, BaasError> {
        decode_opt(store.get(PLAYLISTS, id).await?)
    }

    /// The user's playlists, newest first.
    pub async fn list_for_user(
        store: &dyn RecordStore,
        user: &str,
    ) -> Result<Vec<Playlist>, BaasError> {
        let query = ListQuery::page(1, MAX_PLAYLISTS)
            .sort("-created")
            .filter(Filter::eq("user", user));
        Ok(store.list(PLAYLISTS, &query).await?.decode()?.items)
    }

    /// The user's playlists with track counts, total duration and track ids.
    ///
    /// A failure loading entries or tracks degrades to zero counts.
    pub async fn list_with_stats(
        store: &dyn RecordStore,
        user: &str,
    ) -> Result<Vec<PlaylistWithStats>, BaasError> {
        let playlists = Self::list_for_user(store, user).await?;
        let ids: Vec<RecordId> = playlists.iter().map(|p| p.id.clone()).collect();

        let entries: Vec<PlaylistEntry> = match list_by_field(store, PLAYLIST_ENTRIES, "playlist", &ids, None)
            .await
            .and_then(decode_all)
        {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(user, error = %e, "Failed to load playlist entries");
                Vec::new()
            }
        };

        let mut track_ids: Vec<RecordId> = entries.iter().map(|e| e.track.clone()).collect();
        track_ids.sort();
        track_ids.dedup();
        let tracks = match TrackRepo::find_many(store, &track_ids).await {
            Ok(tracks) => tracks,
            Err(e) => {
                tracing::warn!(user, error = %e, "Failed to load playlist tracks");
                Vec::new()
            }
        };

        Ok(playlists
            .into_iter()
            .map(|playlist| {
                let own: Vec<&PlaylistEntry> =
                    entries.iter().filter(|e| e.playlist == playlist.id).collect();
                let duration = own
                    .iter()
                    .filter_map(|e| tracks.iter().find(|t| t.id == e.track))
                    .map(|t| t.duration)
                    .sum();
                PlaylistWithStats {
                    count: own.len(),
                    duration,
                    track_ids: own.iter().map(|e| e.track.clone()).collect(),
                    playlist,
                }
            })
            .collect())
    }

    pub async fn create(store: &dyn RecordStore, input: &CreatePlaylist) -> Result<Playlist, BaasError> {
        let body = serde_json::to_value(input)?;
        decode(store.create(PLAYLISTS, &body).await?)
    }

    /// Delete a playlist and its entries. Returns `false` if it did not exist.
    pub async fn delete(store: &dyn RecordStore, id: &str) -> Result<bool, BaasError> {
        for entry in Self::entries(store, id).await? {
            store.delete(PLAYLIST_ENTRIES, &entry.id).await?;
        }
        store.delete(PLAYLISTS, id).await
    }

    // -- Entries ------------------------------------------------------------

    /// Entries of a playlist in the order they were added.
    pub async fn entries(
        store: &dyn RecordStore,
        playlist: &str,
    ) -> Result<Vec<PlaylistEntry>, BaasError> {
        decode_all(
            store
                .full_list(PLAYLIST_ENTRIES, Some(Filter::eq("playlist", playlist)), Some("created"))
                .await?,
        )
    }

    pub async fn find_entry(
        store: &dyn RecordStore,
        id: &str,
    ) -> Result<Option<PlaylistEntry>, BaasError> {
        decode_opt(store.get(PLAYLIST_ENTRIES, id).await?)
    }

    /// Add a track unless it is already in the playlist.
    pub async fn add_entry(
        store: &dyn RecordStore,
        playlist: &str,
        track: &str,
        added_by: &str,
    ) -> Result<AddEntryOutcome, BaasError> {
        let existing = store
            .first(
                PLAYLIST_ENTRIES,
                Filter::And(vec![Filter::eq("playlist", playlist), Filter::eq("track", track)]),
                None,
            )
            .await?;
        if let Some(existing) = existing {
            return Ok(AddEntryOutcome::AlreadyPresent(decode(existing)?));
        }

        let body = json!({ "playlist": playlist, "track": track, "added_by": added_by });
        let created = store.create(PLAYLIST_ENTRIES, &body).await?;
        Ok(AddEntryOutcome::Added(decode(created)?))
    }

    pub async fn remove_entry(store: &dyn RecordStore, id: &str) -> Result<bool, BaasError> {
        store.delete(PLAYLIST_ENTRIES, id).await
    }
}
