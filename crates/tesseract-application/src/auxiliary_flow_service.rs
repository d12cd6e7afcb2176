//! Auxiliary Flow Service
//!
//! Small single-call prompt flows around the main chat: naming chats,
//! enhancing queries, summarizing history and suggesting topics.

use serde::de::DeserializeOwned;
use std::sync::Arc;
use tesseract_core::completion::{CompletionClient, CompletionOutcome, CompletionRequest};
use tesseract_core::error::{Result, TesseractError};
use tesseract_core::session::Message;
use tesseract_interaction::TopicSuggestions;
use tesseract_interaction::prompts;

/// Service providing the auxiliary prompt flows.
///
/// Every flow makes exactly one completion call. Text results are trimmed and
/// stripped of surrounding quotes.
#[derive(Clone)]
pub struct AuxiliaryFlowService {
    client: Arc<dyn CompletionClient>,
}

impl AuxiliaryFlowService {
    pub fn new(client: Arc<dyn CompletionClient>) -> Self {
        Self { client }
    }

    /// Suggests a chat name (5 words or less) from the first user message.
    pub async fn auto_name_chat(&self, first_message: &str) -> Result<String> {
        let prompt = prompts::auto_name_chat_prompt(first_message)?;
        self.complete_text("auto_name_chat", CompletionRequest::new(prompt))
            .await
    }

    /// Rewrites a user query so the chatbot can answer it more accurately.
    pub async fn enhance_user_query(&self, query: &str) -> Result<String> {
        let prompt = prompts::enhance_user_query_prompt(query)?;
        self.complete_text("enhance_user_query", CompletionRequest::new(prompt))
            .await
    }

    pub async fn summarize_chat_history(&self, history: &[Message]) -> Result<String> {
        let prompt = prompts::summarize_chat_history_prompt(history)?;
        self.complete_text("summarize_chat_history", CompletionRequest::new(prompt))
            .await
    }

    /// Suggests three topics to explore next, using JSON output mode.
    ///
    /// # Errors
    ///
    /// Returns a `Serialization` error if the reply is not a
    /// `{"topics": [...]}` object.
    pub async fn suggest_topics(&self, history: &[Message]) -> Result<TopicSuggestions> {
        let prompt = prompts::suggest_topics_prompt(history)?;
        let raw = self
            .complete("suggest_topics", CompletionRequest::new(prompt).expecting_json())
            .await?;
        let mut suggestions: TopicSuggestions = parse_json_reply(&raw)?;
        suggestions.topics = suggestions
            .topics
            .iter()
            .map(|topic| clean_text(topic))
            .filter(|topic| !topic.is_empty())
            .collect();
        Ok(suggestions)
    }

    /// Suggests a chat title (5 words or less) from the whole history.
    pub async fn smart_chat_title(&self, history: &[Message]) -> Result<String> {
        let prompt = prompts::smart_chat_title_prompt(history)?;
        self.complete_text("smart_chat_title", CompletionRequest::new(prompt))
            .await
    }

    async fn complete_text(&self, flow: &str, request: CompletionRequest) -> Result<String> {
        let text = clean_text(&self.complete(flow, request).await?);
        if text.is_empty() {
            return Err(TesseractError::gateway(format!("{flow} returned no text")));
        }
        Ok(text)
    }

    async fn complete(&self, flow: &str, request: CompletionRequest) -> Result<String> {
        tracing::debug!("[AuxiliaryFlowService] Running {}", flow);
        let response = self.client.generate(request).await.map_err(|e| {
            tracing::warn!("[AuxiliaryFlowService] {} failed: {}", flow, e);
            TesseractError::gateway(e)
        })?;

        match CompletionOutcome::from_response(response) {
            CompletionOutcome::Completed(text) => Ok(text),
            CompletionOutcome::Blocked { reason, .. } => {
                tracing::warn!("[AuxiliaryFlowService] {} blocked: {}", flow, reason);
                Err(TesseractError::gateway(format!(
                    "{flow} response was blocked ({reason})"
                )))
            }
        }
    }
}

/// Trims whitespace and one pair of surrounding quotes.
pub fn clean_text(raw: &str) -> String {
    let trimmed = raw.trim();
    let unquoted = [('"', '"'), ('\'', '\''), ('`', '`'), ('“', '”')]
        .iter()
        .find_map(|(open, close)| {
            trimmed
                .strip_prefix(*open)
                .and_then(|rest| rest.strip_suffix(*close))
        })
        .unwrap_or(trimmed);
    unquoted.trim().to_string()
}

/// Parses a JSON reply, tolerating a surrounding ```json fence.
pub fn parse_json_reply<T: DeserializeOwned>(raw: &str) -> Result<T> {
    let trimmed = raw.trim();
    let body = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.trim_end().strip_suffix("```"))
        .unwrap_or(trimmed);
    Ok(serde_json::from_str(body.trim())?)
}
