//! REST client for the music generation API.
//!
//! Submits generation jobs (`POST /api/v1/generate`). Results arrive later
//! on the webhook named by `callBackUrl`; see [`crate::messages`].

use std::time::Duration;

use async_trait::async_trait;
use radio_core::generation::GenerationParams;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Default base URL of the generation API.
pub const DEFAULT_BASE_URL: &str = "https://api.sunoapi.org";

/// Success code inside a generation API response body.
pub const CODE_OK: i64 = 200;

/// Body of a generation job submission.
#[derive(Debug, Clone, Serialize)]
pub struct GenerateRequest {
    #[serde(flatten)]
    pub params: GenerationParams,
    #[serde(rename = "callBackUrl")]
    pub callback_url: String,
}

/// A 2xx response to a job submission.
#[derive(Debug, Clone)]
pub struct SubmitResponse {
    /// HTTP status of the response.
    pub status: u16,
    /// Raw JSON body, forwarded to clients as-is.
    pub body: Value,
}

impl SubmitResponse {
    /// The `code` field of the body.
    pub fn code(&self) -> Option<i64> {
        self.body.get("code").and_then(Value::as_i64)
    }

    /// Task id assigned by the API (`data.taskId`).
    pub fn task_id(&self) -> Option<&str> {
        self.body
            .pointer("/data/taskId")
            .and_then(Value::as_str)
            .filter(|id| !id.is_empty())
    }

    /// The job was queued: body code 200 and a task id.
    pub fn is_accepted(&self) -> bool {
        self.code() == Some(CODE_OK) && self.task_id().is_some()
    }

    /// The body's `msg`, used as the failure reason for rejected jobs.
    pub fn message(&self) -> Option<&str> {
        self.body.get("msg").and_then(Value::as_str)
    }
}

/// Errors from the generation API layer.
#[derive(Debug, thiserror::Error)]
pub enum SunoApiError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The API returned a non-2xx status code.
    #[error("Generation API error ({status}): {body}")]
    ApiError {
        /// HTTP status code.
        status: u16,
        /// Raw response body.
        body: String,
    },
}

/// Something that can queue music generation jobs.
#[async_trait]
pub trait MusicGenerator: Send + Sync {
    async fn submit(&self, request: &GenerateRequest) -> Result<SubmitResponse, SunoApiError>;
}

/// HTTP client for the generation API.
pub struct SunoApi {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    #[serde(default)]
    msg: Option<String>,
}

impl SunoApi {
    /// Create a client.
    ///
    /// * `base_url` - e.g. `https://api.sunoapi.org`.
    /// * `api_key` - sent as a bearer token.
    /// * `timeout` - bound applied to every request.
    pub fn new(base_url: &str, api_key: &str, timeout: Duration) -> Result<Self, SunoApiError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }

    fn generate_url(&self) -> String {
        format!("{}/api/v1/generate", self.base_url)
    }

    // ---- private helpers ----

    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, SunoApiError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(SunoApiError::ApiError {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }
}

#[async_trait]
impl MusicGenerator for SunoApi {
    async fn submit(&self, request: &GenerateRequest) -> Result<SubmitResponse, SunoApiError> {
        let response = self
            .client
            .post(self.generate_url())
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await?;
        let response = Self::ensure_success(response).await?;
        let status = response.status().as_u16();
        let body: Value = response.json().await?;

        let submitted = SubmitResponse { status, body };
        if !submitted.is_accepted() {
            tracing::warn!(
                code = ?submitted.code(),
                msg = submitted.message().unwrap_or_default(),
                "Generation API did not accept the job"
            );
        }
        Ok(submitted)
    }
}

/// Best-effort extraction of a human-readable message from an error body.
pub fn error_message(body: &str) -> Option<String> {
    serde_json::from_str::<ErrorEnvelope>(body)
        .ok()
        .and_then(|e| e.msg)
        .filter(|m| !m.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_carries_callback_url_and_params() {
        let request = GenerateRequest {
            params: GenerationParams::for_room("rainy day", true),
            callback_url: "https://radio.example.com/api/music/callback".into(),
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["callBackUrl"], "https://radio.example.com/api/music/callback");
        assert_eq!(value["instrumental"], true);
        assert_eq!(value["prompt"], "rainy day");
        assert!(value.get("style").is_none());
    }

    #[test]
    fn accepted_requires_code_and_task_id() {
        let ok = SubmitResponse {
            status: 200,
            body: json!({"code": 200, "msg": "success", "data": {"taskId": "5c79"}}),
        };
        assert!(ok.is_accepted());
        assert_eq!(ok.task_id(), Some("5c79"));

        let rejected = SubmitResponse {
            status: 200,
            body: json!({"code": 429, "msg": "insufficient credits", "data": null}),
        };
        assert!(!rejected.is_accepted());
        assert_eq!(rejected.message(), Some("insufficient credits"));
    }

    #[test]
    fn extracts_error_message() {
        assert_eq!(
            error_message(r#"{"code":401,"msg":"bad key"}"#).as_deref(),
            Some("bad key")
        );
        assert_eq!(error_message("gateway timeout"), None);
    }

    #[test]
    fn trims_base_url() {
        let api = SunoApi::new("https://api.example.com/", "k", Duration::from_secs(5)).unwrap();
        assert_eq!(api.generate_url(), "https://api.example.com/api/v1/generate");
    }
}
