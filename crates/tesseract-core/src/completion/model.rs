use crate::session::Message;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Shape the provider is asked to answer in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResponseFormat {
    #[default]
    Text,
    /// Provider-enforced JSON output.
    Json,
}

/// One completion request: system prompt, prior turns and the new prompt.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    /// Overrides the client's default model
    pub model: Option<String>,
    pub system_instruction: Option<String>,
    /// Prior turns, forwarded verbatim in order
    pub history: Vec<Message>,
    pub prompt: String,
    pub response_format: ResponseFormat,
}

impl CompletionRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            model: None,
            system_instruction: None,
            history: Vec::new(),
            prompt: prompt.into(),
            response_format: ResponseFormat::Text,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_system_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.system_instruction = Some(instruction.into());
        self
    }

    pub fn with_history(mut self, history: Vec<Message>) -> Self {
        self.history = history;
        self
    }

    pub fn expecting_json(mut self) -> Self {
        self.response_format = ResponseFormat::Json;
        self
    }
}

/// Why the provider stopped generating.
///
/// Names follow the Gemini `finishReason` vocabulary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FinishReason {
    Stop,
    MaxTokens,
    Safety,
    Recitation,
    Language,
    Blocklist,
    ProhibitedContent,
    Spii,
    Other,
    /// No reason given
    Unspecified,
    /// A reason this crate does not know about
    Unknown(String),
}

impl FinishReason {
    /// Parses a provider value; `None` or an empty string is `Unspecified`.
    pub fn from_provider(value: Option<&str>) -> Self {
        match value.map(str::trim).unwrap_or_default() {
            "" | "FINISH_REASON_UNSPECIFIED" => Self::Unspecified,
            "STOP" => Self::Stop,
            "MAX_TOKENS" => Self::MaxTokens,
            "SAFETY" | "IMAGE_SAFETY" => Self::Safety,
            "RECITATION" => Self::Recitation,
            "LANGUAGE" => Self::Language,
            "BLOCKLIST" => Self::Blocklist,
            "PROHIBITED_CONTENT" => Self::ProhibitedContent,
            "SPII" => Self::Spii,
            "OTHER" => Self::Other,
            other => Self::Unknown(other.to_string()),
        }
    }

    /// True when the stop condition means the answer was cut off or withheld.
    pub fn is_blocking(&self) -> bool {
        !matches!(self, Self::Stop | Self::Other | Self::Unspecified)
    }
}

impl fmt::Display for FinishReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Stop => "STOP",
            Self::MaxTokens => "MAX_TOKENS",
            Self::Safety => "SAFETY",
            Self::Recitation => "RECITATION",
            Self::Language => "LANGUAGE",
            Self::Blocklist => "BLOCKLIST",
            Self::ProhibitedContent => "PROHIBITED_CONTENT",
            Self::Spii => "SPII",
            Self::Other => "OTHER",
            Self::Unspecified => "FINISH_REASON_UNSPECIFIED",
            Self::Unknown(value) => value,
        };
        f.write_str(name)
    }
}

/// Token accounting reported by the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageMetadata {
    #[serde(default, rename = "promptTokenCount")]
    pub prompt_tokens: Option<u32>,
    #[serde(default, rename = "candidatesTokenCount")]
    pub candidates_tokens: Option<u32>,
    #[serde(default, rename = "totalTokenCount")]
    pub total_tokens: Option<u32>,
}

/// Provider answer, before interpretation.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionResponse {
    /// Generated text, if any
    pub text: Option<String>,
    pub finish_reason: FinishReason,
    pub usage: Option<UsageMetadata>,
}

impl CompletionResponse {
    /// A normally finished response.
    pub fn stopped(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            finish_reason: FinishReason::Stop,
            usage: None,
        }
    }
}
