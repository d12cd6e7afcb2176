//! Chat session domain model.

use super::message::Message;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Title given to every freshly created session.
pub const DEFAULT_SESSION_TITLE: &str = "New Chat";

/// One conversation thread with its own ordered history and title.
///
/// The persisted shape uses camelCase keys (`createdAt`) so that a slot
/// written by one front end can be read by another.
///
/// Messages are append-only: there is no API to remove, reorder or edit a
/// message once it has been added.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatSession {
    /// Unique session identifier (`chat-<uuid>`)
    pub id: String,
    /// Human-readable session title
    pub title: String,
    /// Creation time, serialized as RFC 3339
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    messages: Vec<Message>,
}

impl ChatSession {
    /// Creates an empty session with a fresh id and the default title.
    pub fn new() -> Self {
        Self {
            id: format!("chat-{}", Uuid::new_v4()),
            title: DEFAULT_SESSION_TITLE.to_string(),
            created_at: Utc::now(),
            messages: Vec::new(),
        }
    }

    /// Ordered conversation history.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Appends a message at the end of the conversation.
    pub fn append(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// Returns the first user turn, if any.
    pub fn first_user_message(&self) -> Option<&Message> {
        self.messages.iter().find(|m| m.is_user())
    }
}

impl Default for ChatSession {
    fn default() -> Self {
        Self::new()
    }
}
