//! AI text gateway client used to enhance generation prompts.
//!
//! Talks to an OpenAI-compatible `chat/completions` endpoint in JSON mode
//! and turns a plain song description into custom-mode fields.

use std::time::Duration;

use async_trait::async_trait;
use radio_core::generation::{EnhancedPrompt, VocalGender};
use serde::Deserialize;
use serde_json::json;

/// Default gateway base URL.
pub const DEFAULT_BASE_URL: &str = "https://ai-gateway.vercel.sh/v1";

/// Default model requested from the gateway.
pub const DEFAULT_MODEL: &str = "openai/gpt-5.1-thinking";

const SYSTEM_PROMPT: &str = "\
You are a music expert.
Your task is to take a simple song description and convert it into parameters for a music generation AI.

The lyrics should not be overly cliche, or generic. The lyrics should also not reference the style of the music.

Return ONLY a JSON object with the following fields:

- \"prompt\": Full lyrics or song structure with section tags like [Intro], [Verse 1], [Pre-Chorus], [Chorus], [Bridge], [Outro].
    - This field MUST contain only section headers, descriptions of instruments, tempo, or mixing in square brackets, and lines of singable lyrics.
    - DO NOT include production or arrangement notes, comments, directions or annotations, or anything that is not meant to be sung.
    - Max 5000 characters.
    - Target a 3-4 minute song.

- \"style\": Short description of genre and vibe ONLY. No lyrics here. Max 100 characters.

- \"title\": Short, catchy song title. No quotes. Max 100 characters.

- \"vocalGender\" (optional): \"m\" or \"f\".
";

/// Errors from the AI gateway layer.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Gateway API error ({status}): {body}")]
    ApiError { status: u16, body: String },

    /// The completion did not contain the expected JSON object.
    #[error("Gateway returned an unusable completion: {0}")]
    InvalidOutput(String),
}

/// Something that can turn a plain description into custom-mode fields.
#[async_trait]
pub trait PromptEnhancer: Send + Sync {
    async fn enhance(&self, description: &str) -> Result<EnhancedPrompt, GatewayError>;
}

/// HTTP client for the AI gateway.
pub struct GatewayApi {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

#[derive(Deserialize)]
struct Completion {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// The object the model is asked to produce.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawEnhancement {
    title: String,
    style: String,
    prompt: String,
    #[serde(default)]
    vocal_gender: Option<String>,
}

impl GatewayApi {
    pub fn new(
        base_url: &str,
        api_key: &str,
        model: &str,
        timeout: Duration,
    ) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
        })
    }
}

/// Parse the assistant message content into an [`EnhancedPrompt`].
///
/// Tolerates a fenced code block around the object. An unrecognised
/// `vocalGender` is dropped rather than rejected.
pub fn parse_enhancement(content: &str) -> Result<EnhancedPrompt, GatewayError> {
    let trimmed = content.trim();
    let object = match (trimmed.find('{'), trimmed.rfind('}')) {
        (Some(start), Some(end)) if start < end => &trimmed[start..=end],
        _ => return Err(GatewayError::InvalidOutput("no JSON object".into())),
    };
    let raw: RawEnhancement = serde_json::from_str(object)
        .map_err(|e| GatewayError::InvalidOutput(e.to_string()))?;
    if raw.title.trim().is_empty() || raw.style.trim().is_empty() {
        return Err(GatewayError::InvalidOutput("empty title or style".into()));
    }
    Ok(EnhancedPrompt {
        title: raw.title,
        style: raw.style,
        prompt: raw.prompt,
        vocal_gender: raw.vocal_gender.as_deref().and_then(VocalGender::parse),
    })
}

#[async_trait]
impl PromptEnhancer for GatewayApi {
    async fn enhance(&self, description: &str) -> Result<EnhancedPrompt, GatewayError> {
        let body = json!({
            "model": self.model,
            "response_format": { "type": "json_object" },
            "messages": [
                { "role": "system", "content": SYSTEM_PROMPT },
                { "role": "user", "content": description },
            ],
        });

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(GatewayError::ApiError {
                status: status.as_u16(),
                body,
            });
        }

        let completion: Completion = response.json().await?;
        let content = completion
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| GatewayError::InvalidOutput("no choices".into()))?;
        parse_enhancement(&content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn parses_plain_object() {
        let parsed = parse_enhancement(
            r#"{"title":"Paper Moons","style":"dream pop, airy","prompt":"[Verse 1]\nfolded skies","vocalGender":"f"}"#,
        )
        .unwrap();
        assert_eq!(parsed.title, "Paper Moons");
        assert_eq!(parsed.vocal_gender, Some(VocalGender::Female));
    }

    #[test]
    fn tolerates_code_fence_and_bad_gender() {
        let content = "```json\n{\"title\":\"T\",\"style\":\"S\",\"prompt\":\"P\",\"vocalGender\":\"x\"}\n```";
        let parsed = parse_enhancement(content).unwrap();
        assert_eq!(parsed.vocal_gender, None);
    }

    #[test]
    fn rejects_non_json_and_empty_fields() {
        assert_matches!(
            parse_enhancement("I cannot help with that."),
            Err(GatewayError::InvalidOutput(_))
        );
        assert_matches!(
            parse_enhancement(r#"{"title":"","style":"s","prompt":"p"}"#),
            Err(GatewayError::InvalidOutput(_))
        );
    }
}
