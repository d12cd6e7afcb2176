//! GeminiApiClient - Direct REST API implementation for Gemini.
//!
//! Calls the `generateContent` endpoint and reports the raw candidate text,
//! finish reason and usage. Interpreting the finish reason is left to the
//! gateway.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tesseract_core::completion::{
    CompletionClient, CompletionRequest, CompletionResponse, FinishReason, ResponseFormat,
    UsageMetadata,
};
use tesseract_core::config::{DEFAULT_GEMINI_BASE_URL, DEFAULT_GEMINI_MODEL, ModelSettings};
use tesseract_core::error::{Result, TesseractError};
use tesseract_core::secret::SecretService;
use tesseract_core::session::Message;

/// Completion client that talks to the Gemini HTTP API.
#[derive(Clone)]
pub struct GeminiApiClient {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiApiClient {
    /// Creates a new client with the provided API key and model.
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            model: model.into(),
            base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
        }
    }

    /// Builds a client from secret.json (or the environment) and the
    /// `[model]` section of config.toml.
    ///
    /// The model named in secret.json wins over the configured one, which in
    /// turn defaults to `gemini-2.5-flash`.
    ///
    /// # Errors
    ///
    /// Returns a `Config` error if no Gemini API key is available or the
    /// HTTP client cannot be built.
    pub async fn try_from_secrets(
        secrets: &dyn SecretService,
        settings: &ModelSettings,
    ) -> Result<Self> {
        let gemini_config = secrets.gemini_credentials().await?;

        let model = gemini_config
            .model_name
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| {
                if settings.name.trim().is_empty() {
                    DEFAULT_GEMINI_MODEL.to_string()
                } else {
                    settings.name.clone()
                }
            });

        let mut client = Self::new(gemini_config.api_key.trim(), model);
        if !settings.base_url.trim().is_empty() {
            client = client.with_base_url(settings.base_url.trim());
        }
        if settings.request_timeout_secs > 0 {
            client = client.with_timeout(Duration::from_secs(settings.request_timeout_secs))?;
        }

        tracing::info!("[GeminiApiClient] Using model {}", client.model);
        Ok(client)
    }

    /// Overrides the model after construction.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Overrides the endpoint prefix (everything before `/{model}`).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Applies a request timeout to every call.
    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self> {
        self.client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TesseractError::config(format!("Failed to build HTTP client: {}", e)))?;
        Ok(self)
    }

    async fn send_request(
        &self,
        model: &str,
        body: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse> {
        let url = format!(
            "{}/{model}:generateContent?key={api_key}",
            self.base_url,
            api_key = self.api_key
        );

        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|err| {
                // the URL carries the API key
                TesseractError::Gateway(format!(
                    "Gemini API request failed: {}",
                    err.without_url()
                ))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read Gemini error body".to_string());
            return Err(map_http_error(status, &body_text));
        }

        response.json().await.map_err(|err| {
            TesseractError::Gateway(format!(
                "Failed to parse Gemini response: {}",
                err.without_url()
            ))
        })
    }
}

#[async_trait]
impl CompletionClient for GeminiApiClient {
    fn default_model(&self) -> &str {
        &self.model
    }

    async fn generate(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        let model = request.model.clone().unwrap_or_else(|| self.model.clone());
        let body = GenerateContentRequest::from_request(&request);

        tracing::debug!(
            "[GeminiApiClient] generateContent model={} history={} json={}",
            model,
            request.history.len(),
            request.response_format == ResponseFormat::Json
        );

        let parsed = self.send_request(&model, &body).await?;
        let response = interpret_response(parsed);

        if let Some(usage) = &response.usage {
            tracing::debug!(
                "[GeminiApiClient] usage prompt={:?} candidates={:?} total={:?}",
                usage.prompt_tokens,
                usage.candidates_tokens,
                usage.total_tokens
            );
        }
        Ok(response)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

impl GenerateContentRequest {
    fn from_request(request: &CompletionRequest) -> Self {
        let mut contents: Vec<Content> =
            request.history.iter().map(Content::from_message).collect();
        contents.push(Content::from_message(&Message::user(request.prompt.clone())));

        let system_instruction = request
            .system_instruction
            .as_ref()
            .map(|text| Content::text("system", text));

        let generation_config = match request.response_format {
            ResponseFormat::Text => None,
            ResponseFormat::Json => Some(GenerationConfig {
                response_mime_type: "application/json".to_string(),
            }),
        };

        Self {
            contents,
            system_instruction,
            generation_config,
        }
    }
}

#[derive(Debug, Serialize)]
struct Content {
    role: String,
    parts: Vec<Part>,
}

impl Content {
    fn text(role: &str, text: &str) -> Self {
        Self {
            role: role.to_string(),
            parts: vec![Part {
                text: text.to_string(),
            }],
        }
    }

    fn from_message(message: &Message) -> Self {
        Self::text(&message.role.to_string(), &message.content)
    }
}

#[derive(Debug, Serialize)]
struct Part {
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    candidates: Option<Vec<Candidate>>,
    prompt_feedback: Option<PromptFeedback>,
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<ContentResponse>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ContentResponse {
    #[serde(default)]
    parts: Vec<PartResponse>,
}

#[derive(Debug, Deserialize)]
struct PartResponse {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Deserialize)]
struct ErrorWrapper {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
    status: Option<String>,
}

/// Reduces the wire response to text, finish reason and usage.
///
/// Only the first candidate is considered; its text parts are concatenated.
/// A prompt rejected before generation becomes a blocking finish reason with
/// no text.
fn interpret_response(response: GenerateContentResponse) -> CompletionResponse {
    let usage = response.usage_metadata;
    let first = response
        .candidates
        .and_then(|candidates| candidates.into_iter().next());

    let Some(candidate) = first else {
        let finish_reason = match response.prompt_feedback.and_then(|f| f.block_reason) {
            Some(reason) => {
                tracing::warn!("[GeminiApiClient] Prompt blocked: {}", reason);
                match FinishReason::from_provider(Some(&reason)) {
                    parsed if parsed.is_blocking() => parsed,
                    _ => FinishReason::Unknown(reason),
                }
            }
            None => FinishReason::Unspecified,
        };
        return CompletionResponse {
            text: None,
            finish_reason,
            usage,
        };
    };

    let text: String = candidate
        .content
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|part| part.text)
                .collect()
        })
        .unwrap_or_default();

    CompletionResponse {
        text: Some(text).filter(|t| !t.is_empty()),
        finish_reason: FinishReason::from_provider(candidate.finish_reason.as_deref()),
        usage,
    }
}

fn map_http_error(status: StatusCode, body: &str) -> TesseractError {
    let message = serde_json::from_str::<ErrorWrapper>(body)
        .map(|wrapper| {
            let status_text = wrapper.error.status.unwrap_or_default();
            let msg = wrapper.error.message.unwrap_or_else(|| body.to_string());
            if status_text.is_empty() {
                msg
            } else {
                format!("{status_text}: {msg}")
            }
        })
        .unwrap_or_else(|_| body.to_string());

    tracing::error!("[GeminiApiClient] HTTP {}: {}", status.as_u16(), message);
    TesseractError::Gateway(format!(
        "[{} {}] {}",
        status.as_u16(),
        status.canonical_reason().unwrap_or("Error"),
        message
    ))
}
