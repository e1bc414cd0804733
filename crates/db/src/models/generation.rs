//! Generation requests and callback audit records.

use radio_core::generation::GenerationParams;
use radio_core::types::{RecordId, Timestamp};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::fields;

/// Lifecycle of a generation request. Completion is signalled by the
/// resulting tracks, not by a status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    #[default]
    Pending,
    Submitted,
    Failed,
}

impl RequestStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Submitted => "submitted",
            RequestStatus::Failed => "failed",
        }
    }
}

/// A generation request record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub id: RecordId,
    #[serde(default, deserialize_with = "fields::opt_string")]
    pub user: Option<RecordId>,
    #[serde(default)]
    pub status: RequestStatus,
    #[serde(rename = "taskId", default, deserialize_with = "fields::opt_string")]
    pub task_id: Option<String>,
    #[serde(default, deserialize_with = "fields::opt_string")]
    pub idempotency_key: Option<String>,
    #[serde(default, deserialize_with = "fields::opt_string")]
    pub error: Option<String>,
    #[serde(default, deserialize_with = "fields::string_or_empty")]
    pub prompt: String,
    #[serde(default, deserialize_with = "fields::string_or_empty")]
    pub style: String,
    #[serde(default, deserialize_with = "fields::opt_timestamp")]
    pub created: Option<Timestamp>,
}

impl GenerationRequest {
    /// The text the track was generated from: the prompt, or the style for
    /// instrumental custom-mode requests.
    pub fn generation_prompt(&self) -> Option<String> {
        [&self.prompt, &self.style]
            .into_iter()
            .map(|s| s.trim())
            .find(|s| !s.is_empty())
            .map(str::to_string)
    }
}

/// DTO for persisting a request before it is sent upstream.
#[derive(Debug, Clone, Serialize)]
pub struct CreateGenerationRequest {
    #[serde(flatten)]
    pub params: GenerationParams,
    #[serde(rename = "callBackUrl")]
    pub callback_url: String,
    pub user: Option<RecordId>,
    pub status: RequestStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub idempotency_key: Option<String>,
}

/// Outcome written back after the upstream call.
#[derive(Debug, Clone, Serialize)]
pub struct UpdateGenerationRequest {
    pub status: RequestStatus,
    #[serde(rename = "taskId", skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Raw record of a webhook delivery, one per task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationCallback {
    pub id: RecordId,
    pub task_id: String,
    #[serde(default)]
    pub code: i64,
    #[serde(default, deserialize_with = "fields::string_or_empty")]
    pub msg: String,
    #[serde(rename = "callbackType", default, deserialize_with = "fields::string_or_empty")]
    pub callback_type: String,
    #[serde(default)]
    pub data: Value,
}

/// DTO for upserting a callback record.
#[derive(Debug, Clone, Serialize)]
pub struct UpsertGenerationCallback {
    pub task_id: String,
    pub code: i64,
    pub msg: String,
    #[serde(rename = "callbackType")]
    pub callback_type: String,
    pub data: Value,
}
