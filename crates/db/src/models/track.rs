//! Track entity and DTOs.

use radio_core::types::{RecordId, Timestamp};
use serde::{Deserialize, Serialize};

use super::fields;

/// Title shown for tracks the generator did not name.
pub const UNTITLED: &str = "Untitled";

/// A track record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Track {
    pub id: RecordId,
    /// Id assigned by the generation API. Upsert key for callbacks.
    #[serde(default, deserialize_with = "fields::opt_string")]
    pub track_id: Option<String>,
    #[serde(default, deserialize_with = "fields::opt_string")]
    pub task_id: Option<String>,
    #[serde(default, deserialize_with = "fields::string_or_empty")]
    pub title: String,
    #[serde(default, deserialize_with = "fields::string_or_empty")]
    pub prompt: String,
    #[serde(default, deserialize_with = "fields::opt_string")]
    pub generation_prompt: Option<String>,
    #[serde(default, deserialize_with = "fields::string_or_empty")]
    pub tags: String,
    #[serde(default, deserialize_with = "fields::string_or_empty")]
    pub model_name: String,
    #[serde(default, deserialize_with = "fields::lenient_f64")]
    pub duration: f64,
    #[serde(default, deserialize_with = "fields::string_or_empty")]
    pub audio_url: String,
    #[serde(default, deserialize_with = "fields::string_or_empty")]
    pub source_audio_url: String,
    #[serde(default, deserialize_with = "fields::string_or_empty")]
    pub stream_audio_url: String,
    #[serde(default, deserialize_with = "fields::string_or_empty")]
    pub source_stream_audio_url: String,
    #[serde(default, deserialize_with = "fields::string_or_empty")]
    pub image_url: String,
    #[serde(default, deserialize_with = "fields::string_or_empty")]
    pub source_image_url: String,
    /// Name of the attached audio file, once stored.
    #[serde(default, deserialize_with = "fields::opt_string")]
    pub audio: Option<String>,
    /// Name of the attached cover image, once stored.
    #[serde(default, deserialize_with = "fields::opt_string")]
    pub image: Option<String>,
    #[serde(default, deserialize_with = "fields::opt_string")]
    pub create_time: Option<String>,
    #[serde(default, deserialize_with = "fields::opt_string")]
    pub user: Option<RecordId>,
    #[serde(default, deserialize_with = "fields::bool_or_false")]
    pub deleted: bool,
    #[serde(default, deserialize_with = "fields::opt_timestamp")]
    pub created: Option<Timestamp>,
    #[serde(default, deserialize_with = "fields::opt_timestamp")]
    pub updated: Option<Timestamp>,
}

impl Track {
    /// A track can be queued once it has a playable audio URL.
    pub fn is_playable(&self) -> bool {
        !self.audio_url.trim().is_empty()
    }

    pub fn display_title(&self) -> &str {
        if self.title.trim().is_empty() {
            UNTITLED
        } else {
            &self.title
        }
    }

    pub fn summary(&self) -> TrackSummary {
        TrackSummary {
            id: self.id.clone(),
            track_id: self.track_id.clone().unwrap_or_else(|| self.id.clone()),
            title: self.display_title().to_string(),
            audio_url: self.audio_url.clone(),
            stream_audio_url: self.stream_audio_url.clone(),
            image_url: self.image_url.clone(),
            duration: self.duration,
            tags: self.tags.clone(),
            prompt: self.prompt.clone(),
            model_name: self.model_name.clone(),
            create_time: self.create_time.clone(),
        }
    }
}

/// The public shape of a track in catalog and room responses.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackSummary {
    pub id: RecordId,
    pub track_id: String,
    pub title: String,
    pub audio_url: String,
    pub stream_audio_url: String,
    pub image_url: String,
    pub duration: f64,
    pub tags: String,
    pub prompt: String,
    pub model_name: String,
    pub create_time: Option<String>,
}

/// Fields written when a generation callback delivers a track.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TrackFields {
    pub track_id: String,
    pub title: String,
    pub prompt: String,
    pub tags: String,
    pub model_name: String,
    pub duration: f64,
    pub audio_url: String,
    pub source_audio_url: String,
    pub stream_audio_url: String,
    pub source_stream_audio_url: String,
    pub image_url: String,
    pub source_image_url: String,
    pub create_time: String,
}

/// Fields copied from the originating request onto a track, only where the
/// track does not already have them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrackBackfill {
    pub task_id: Option<String>,
    pub generation_prompt: Option<String>,
    pub user: Option<RecordId>,
}
