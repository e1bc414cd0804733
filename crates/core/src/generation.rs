//! Music generation parameters and their validation rules.
//!
//! The rules mirror the limits the generation API enforces, so a request
//! that passes here is never rejected upstream for shape reasons. Lengths
//! are counted in characters, not bytes.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Limits
// ---------------------------------------------------------------------------

/// Maximum `title` length in custom mode.
pub const MAX_TITLE_CHARS: usize = 80;
/// Maximum `style` length for legacy models (`V3_5`, `V4`).
pub const MAX_STYLE_CHARS_LEGACY: usize = 200;
/// Maximum `style` length for newer models.
pub const MAX_STYLE_CHARS: usize = 1000;
/// Maximum custom-mode `prompt` (lyrics) length for legacy models.
pub const MAX_CUSTOM_PROMPT_CHARS_LEGACY: usize = 3000;
/// Maximum custom-mode `prompt` (lyrics) length for newer models.
pub const MAX_CUSTOM_PROMPT_CHARS: usize = 5000;
/// Maximum `prompt` length outside custom mode.
pub const MAX_SIMPLE_PROMPT_CHARS: usize = 500;
/// Weights must sit within this distance of a multiple of 0.01.
pub const WEIGHT_STEP_TOLERANCE: f64 = 1e-4;

/// Model used for room generations.
pub const ROOM_MODEL: MusicModel = MusicModel::V5;

// ---------------------------------------------------------------------------
// Enumerations
// ---------------------------------------------------------------------------

/// Generation model identifiers accepted by the generation API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MusicModel {
    #[serde(rename = "V3_5")]
    V3_5,
    #[serde(rename = "V4")]
    V4,
    #[serde(rename = "V4_5")]
    V4_5,
    #[serde(rename = "V4_5PLUS")]
    V4_5Plus,
    #[serde(rename = "V5")]
    V5,
}

/// All models, in the order they are listed in error messages.
pub const ALL_MODELS: &[MusicModel] = &[
    MusicModel::V3_5,
    MusicModel::V4,
    MusicModel::V4_5,
    MusicModel::V4_5Plus,
    MusicModel::V5,
];

impl MusicModel {
    pub fn as_str(self) -> &'static str {
        match self {
            MusicModel::V3_5 => "V3_5",
            MusicModel::V4 => "V4",
            MusicModel::V4_5 => "V4_5",
            MusicModel::V4_5Plus => "V4_5PLUS",
            MusicModel::V5 => "V5",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        ALL_MODELS.iter().copied().find(|m| m.as_str() == s)
    }

    /// `V3_5` and `V4` have the tighter style and lyric limits.
    pub fn is_legacy(self) -> bool {
        matches!(self, MusicModel::V3_5 | MusicModel::V4)
    }

    pub fn max_style_chars(self) -> usize {
        if self.is_legacy() {
            MAX_STYLE_CHARS_LEGACY
        } else {
            MAX_STYLE_CHARS
        }
    }

    pub fn max_custom_prompt_chars(self) -> usize {
        if self.is_legacy() {
            MAX_CUSTOM_PROMPT_CHARS_LEGACY
        } else {
            MAX_CUSTOM_PROMPT_CHARS
        }
    }
}

impl std::fmt::Display for MusicModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VocalGender {
    #[serde(rename = "m")]
    Male,
    #[serde(rename = "f")]
    Female,
}

impl VocalGender {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "m" => Some(VocalGender::Male),
            "f" => Some(VocalGender::Female),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Parameters
// ---------------------------------------------------------------------------

/// Parameters of one generation job, in the generation API's wire shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationParams {
    pub custom_mode: bool,
    pub instrumental: bool,
    pub model: MusicModel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub persona_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub negative_tags: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vocal_gender: Option<VocalGender>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style_weight: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weirdness_constraint: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_weight: Option<f64>,
}

impl GenerationParams {
    /// Parameters the room uses when it asks for a new track.
    pub fn for_room(prompt: &str, instrumental: bool) -> Self {
        Self {
            custom_mode: false,
            instrumental,
            model: ROOM_MODEL,
            prompt: Some(prompt.trim().to_string()),
            style: None,
            title: None,
            persona_id: None,
            negative_tags: None,
            vocal_gender: None,
            style_weight: None,
            weirdness_constraint: None,
            audio_weight: None,
        }
    }

    /// Switch to custom mode using the fields produced by prompt enhancement.
    ///
    /// The enhanced fields are clamped to this model's limits first.
    pub fn apply_enhancement(&mut self, enhanced: &EnhancedPrompt) {
        let enhanced = enhanced.clamped_for(self.model);
        self.custom_mode = true;
        self.title = Some(enhanced.title);
        self.style = Some(enhanced.style);
        if !self.instrumental {
            self.prompt = Some(enhanced.prompt);
        }
        if enhanced.vocal_gender.is_some() {
            self.vocal_gender = enhanced.vocal_gender;
        }
    }
}

/// Custom-mode fields suggested by the prompt enhancer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnhancedPrompt {
    pub title: String,
    pub style: String,
    pub prompt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vocal_gender: Option<VocalGender>,
}

impl EnhancedPrompt {
    /// Truncate every field to what `model` accepts in custom mode.
    pub fn clamped_for(&self, model: MusicModel) -> Self {
        Self {
            title: truncate_chars(self.title.trim(), MAX_TITLE_CHARS),
            style: truncate_chars(self.style.trim(), model.max_style_chars()),
            prompt: truncate_chars(self.prompt.trim(), model.max_custom_prompt_chars()),
            vocal_gender: self.vocal_gender,
        }
    }
}

fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

fn validation(msg: impl Into<String>) -> CoreError {
    CoreError::Validation(msg.into())
}

// ---------------------------------------------------------------------------
// Parsing from an untyped request body
// ---------------------------------------------------------------------------

/// Parse and validate a JSON request body into [`GenerationParams`].
///
/// Type errors are reported per field with the same wording as the rule
/// violations, so clients always get a field-specific message. Unknown keys
/// (for example `enhance` or a client-supplied `callBackUrl`) are ignored.
pub fn parse_generation_params(body: &Value) -> Result<GenerationParams, CoreError> {
    let custom_mode = body
        .get("customMode")
        .and_then(Value::as_bool)
        .ok_or_else(|| validation("customMode must be a boolean"))?;

    let instrumental = body
        .get("instrumental")
        .and_then(Value::as_bool)
        .ok_or_else(|| validation("instrumental must be a boolean"))?;

    let model_str = body
        .get("model")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| validation("model is required and must be a string"))?;

    let model = MusicModel::parse(model_str).ok_or_else(|| {
        let names: Vec<&str> = ALL_MODELS.iter().map(|m| m.as_str()).collect();
        validation(format!("model must be one of: {}", names.join(", ")))
    })?;

    let vocal_gender = match body.get("vocalGender") {
        None | Some(Value::Null) => None,
        Some(v) => Some(
            v.as_str()
                .and_then(VocalGender::parse)
                .ok_or_else(|| validation("vocalGender must be \"m\" or \"f\""))?,
        ),
    };

    let params = GenerationParams {
        custom_mode,
        instrumental,
        model,
        prompt: string_field(body, "prompt"),
        style: string_field(body, "style"),
        title: string_field(body, "title"),
        persona_id: string_field(body, "personaId"),
        negative_tags: string_field(body, "negativeTags"),
        vocal_gender,
        style_weight: weight_field(body, "styleWeight")?,
        weirdness_constraint: weight_field(body, "weirdnessConstraint")?,
        audio_weight: weight_field(body, "audioWeight")?,
    };

    validate_generation_params(&params)?;
    Ok(params)
}

fn string_field(body: &Value, key: &str) -> Option<String> {
    body.get(key).and_then(Value::as_str).map(str::to_string)
}

fn weight_field(body: &Value, key: &str) -> Result<Option<f64>, CoreError> {
    match body.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(v) => v
            .as_f64()
            .map(Some)
            .ok_or_else(|| validation(format!("{key} must be a number between 0 and 1"))),
    }
}

// ---------------------------------------------------------------------------
// Rules
// ---------------------------------------------------------------------------

/// Validate typed generation parameters.
///
/// - custom mode: `style` and `title` required; title <= 80; style and
///   lyric limits depend on [`MusicModel::is_legacy`]; lyrics required
///   unless instrumental.
/// - simple mode: `prompt` required, <= 500.
/// - weights in [0, 1] on a 0.01 grid.
pub fn validate_generation_params(params: &GenerationParams) -> Result<(), CoreError> {
    let model = params.model;

    if params.custom_mode {
        let style = non_blank(&params.style)
            .ok_or_else(|| validation("style is required in Custom Mode"))?;
        let title = non_blank(&params.title)
            .ok_or_else(|| validation("title is required in Custom Mode"))?;

        if char_len(title) > MAX_TITLE_CHARS {
            return Err(validation("title must be 80 characters or less"));
        }

        if char_len(style) > model.max_style_chars() {
            return Err(validation(if model.is_legacy() {
                "style must be 200 characters or less for V3_5 and V4 models"
            } else {
                "style must be 1000 characters or less for V4_5, V4_5PLUS, and V5 models"
            }));
        }

        if !params.instrumental {
            let prompt = non_blank(&params.prompt).ok_or_else(|| {
                validation("prompt is required in Custom Mode when instrumental is false")
            })?;
            if char_len(prompt) > model.max_custom_prompt_chars() {
                return Err(validation(if model.is_legacy() {
                    "prompt must be 3000 characters or less for V3_5 and V4 models"
                } else {
                    "prompt must be 5000 characters or less for V4_5, V4_5PLUS, and V5 models"
                }));
            }
        }
    } else {
        let prompt = non_blank(&params.prompt)
            .ok_or_else(|| validation("prompt is required in Non-custom Mode"))?;
        if char_len(prompt) > MAX_SIMPLE_PROMPT_CHARS {
            return Err(validation(
                "prompt must be 500 characters or less in Non-custom Mode",
            ));
        }
    }

    validate_weight("styleWeight", params.style_weight)?;
    validate_weight("weirdnessConstraint", params.weirdness_constraint)?;
    validate_weight("audioWeight", params.audio_weight)?;

    Ok(())
}

/// Returns the untrimmed value when it has non-whitespace content.
///
/// Length limits apply to the value as submitted, not the trimmed one.
fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.trim().is_empty())
}

fn validate_weight(name: &str, value: Option<f64>) -> Result<(), CoreError> {
    let Some(w) = value else {
        return Ok(());
    };
    if !w.is_finite() || !(0.0..=1.0).contains(&w) {
        return Err(validation(format!("{name} must be a number between 0 and 1")));
    }
    let rounded = (w * 100.0).round() / 100.0;
    if (w - rounded).abs() > WEIGHT_STEP_TOLERANCE {
        return Err(validation(format!("{name} must be a multiple of 0.01")));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
