//! Playlists and their entries.

use radio_core::types::{RecordId, Timestamp};
use serde::{Deserialize, Serialize};

use super::fields;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Playlist {
    pub id: RecordId,
    pub user: RecordId,
    #[serde(default, deserialize_with = "fields::string_or_empty")]
    pub name: String,
    #[serde(default, deserialize_with = "fields::string_or_empty")]
    pub description: String,
    #[serde(default, deserialize_with = "fields::opt_timestamp")]
    pub created: Option<Timestamp>,
}

/// A (playlist, track) join row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaylistEntry {
    pub id: RecordId,
    pub playlist: RecordId,
    pub track: RecordId,
    #[serde(default, deserialize_with = "fields::opt_string")]
    pub added_by: Option<RecordId>,
    #[serde(default, deserialize_with = "fields::opt_timestamp")]
    pub created: Option<Timestamp>,
}

/// A playlist with its aggregate stats.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistWithStats {
    #[serde(flatten)]
    pub playlist: Playlist,
    pub count: usize,
    /// Sum of track durations in seconds.
    pub duration: f64,
    pub track_ids: Vec<RecordId>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreatePlaylist {
    pub user: RecordId,
    pub name: String,
    pub description: String,
}
