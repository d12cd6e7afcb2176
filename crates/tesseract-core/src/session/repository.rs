//! Session repository trait.
//!
//! Defines the interface for chat session persistence operations.

use super::model::ChatSession;
use crate::error::Result;
use crate::user::UserIdentity;
use async_trait::async_trait;
use std::fmt;

/// Namespace used when none is configured.
pub const DEFAULT_STORAGE_NAMESPACE: &str = "tesseract-chats";

/// Names one user-scoped storage slot: `<namespace>-<user-id-or-guest>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StorageSlot {
    namespace: String,
    owner: String,
}

impl StorageSlot {
    pub fn new(namespace: impl Into<String>, owner: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            owner: owner.into(),
        }
    }

    /// Slot belonging to the given identity.
    pub fn for_user(namespace: impl Into<String>, user: &UserIdentity) -> Self {
        Self::new(namespace, user.storage_key())
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// The full storage key.
    pub fn key(&self) -> String {
        format!("{}-{}", self.namespace, self.owner)
    }
}

impl fmt::Display for StorageSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.namespace, self.owner)
    }
}

/// An abstract repository for whole-collection session persistence.
///
/// Each slot holds the complete, ordered session list of one user. Writes
/// replace the slot's content entirely.
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Reads every session stored in the slot.
    ///
    /// # Returns
    ///
    /// - `Ok(vec![])`: The slot does not exist or is empty
    /// - `Ok(sessions)`: Stored sessions in stored order
    /// - `Err(_)`: The slot exists but could not be read or parsed
    async fn load(&self, slot: &StorageSlot) -> Result<Vec<ChatSession>>;

    /// Replaces the slot's content with `sessions`.
    async fn save(&self, slot: &StorageSlot, sessions: &[ChatSession]) -> Result<()>;
}
