use super::model::{CompletionResponse, FinishReason};

/// Reply used when a normal completion carries no text.
pub const EMPTY_RESPONSE_REPLY: &str = "I'm sorry, I couldn't generate a response.";

/// Reply used when a blocked completion carries no text.
pub const BLOCKED_REPLY: &str = "I'm sorry, my response was blocked. This can happen if the conversation touches on sensitive topics. Please try rephrasing your message.";

/// Appended to partial text of a blocked completion.
pub const TRUNCATION_NOTE: &str = "[Note: The response was truncated because it was blocked for safety reasons or the model reached its token limit.]";

/// Interpreted result of a completion.
///
/// Transport failures are not represented here; they surface as `Err` from
/// the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompletionOutcome {
    /// Finished normally (`STOP`, `OTHER` or unspecified)
    Completed(String),
    /// Stopped for a safety or limit reason
    Blocked {
        /// Text produced before the stop, if any
        partial: Option<String>,
        reason: FinishReason,
    },
}

impl CompletionOutcome {
    pub fn from_response(response: CompletionResponse) -> Self {
        let text = response.text.filter(|t| !t.trim().is_empty());
        if response.finish_reason.is_blocking() {
            Self::Blocked {
                partial: text,
                reason: response.finish_reason,
            }
        } else {
            Self::Completed(text.unwrap_or_default())
        }
    }

    pub fn is_blocked(&self) -> bool {
        matches!(self, Self::Blocked { .. })
    }

    /// Converts the outcome into the text shown to the user.
    pub fn into_reply(self) -> String {
        match self {
            Self::Completed(text) if text.is_empty() => EMPTY_RESPONSE_REPLY.to_string(),
            Self::Completed(text) => text,
            Self::Blocked {
                partial: Some(text),
                ..
            } => format!("{text}\n\n{TRUNCATION_NOTE}"),
            Self::Blocked { partial: None, .. } => BLOCKED_REPLY.to_string(),
        }
    }
}
