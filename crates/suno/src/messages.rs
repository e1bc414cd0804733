//! Webhook payloads posted by the generation API.
//!
//! The API calls back once per completion stage (`text`, `first`,
//! `complete`) or once with `error`. Delivery is at-least-once, so
//! consumers must treat every payload as a possible duplicate.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Completion stage reported by a callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CallbackType {
    Text,
    First,
    Complete,
    Error,
    #[serde(other)]
    Unknown,
}

impl CallbackType {
    pub fn as_str(self) -> &'static str {
        match self {
            CallbackType::Text => "text",
            CallbackType::First => "first",
            CallbackType::Complete => "complete",
            CallbackType::Error => "error",
            CallbackType::Unknown => "unknown",
        }
    }
}

/// Top-level callback body: `{code, msg, data}`.
#[derive(Debug, Clone, Deserialize)]
pub struct CallbackPayload {
    pub code: i64,
    #[serde(default)]
    pub msg: String,
    pub data: CallbackData,
}

impl CallbackPayload {
    pub fn is_success(&self) -> bool {
        self.code == crate::api::CODE_OK
    }

    /// Tracks delivered with this callback (empty for text-only stages).
    pub fn tracks(&self) -> &[CallbackTrack] {
        self.data.data.as_deref().unwrap_or_default()
    }

    /// Describe what a failure code means.
    pub fn failure_reason(&self) -> &'static str {
        match self.code {
            400 => "parameter error or content violation",
            451 => "unable to download related files",
            500 => "generation server error",
            _ => "unknown error code",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CallbackData {
    #[serde(rename = "callbackType")]
    pub callback_type: CallbackType,
    pub task_id: String,
    #[serde(default)]
    pub data: Option<Vec<CallbackTrack>>,
}

/// One generated track as described by the callback.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CallbackTrack {
    /// The generation API's id for the track.
    pub id: String,
    #[serde(default)]
    pub audio_url: String,
    #[serde(default)]
    pub source_audio_url: String,
    #[serde(default)]
    pub stream_audio_url: String,
    #[serde(default)]
    pub source_stream_audio_url: String,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub source_image_url: String,
    #[serde(default)]
    pub prompt: String,
    #[serde(default)]
    pub model_name: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub tags: String,
    #[serde(rename = "createTime", default)]
    pub create_time: Value,
    #[serde(default)]
    pub duration: Option<f64>,
}

impl CallbackTrack {
    /// `createTime` as text; the API sends either a string or epoch millis.
    pub fn create_time_text(&self) -> String {
        match &self.create_time {
            Value::String(s) => s.clone(),
            Value::Number(n) => n.to_string(),
            _ => String::new(),
        }
    }

    /// Preferred audio source for downloading.
    pub fn audio_source(&self) -> Option<&str> {
        [&self.audio_url, &self.source_audio_url]
            .into_iter()
            .map(String::as_str)
            .find(|u| !u.is_empty())
    }

    /// Preferred cover image source for downloading.
    pub fn image_source(&self) -> Option<&str> {
        [&self.image_url, &self.source_image_url]
            .into_iter()
            .map(String::as_str)
            .find(|u| !u.is_empty())
    }
}
