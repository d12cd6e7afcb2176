use super::message::Message;
use super::model::ChatSession;
use super::repository::{SessionRepository, StorageSlot};
use crate::error::{Result, TesseractError};
use crate::user::UserIdentity;
use std::collections::HashSet;
use std::sync::Arc;

/// Holds one user's chat sessions and the active session id.
///
/// `ChatSessionStore` is responsible for:
/// - Creating, switching, deleting and clearing sessions
/// - Appending messages and merging late title updates by session id
/// - Writing the whole collection through to the repository after every
///   mutation
///
/// Persistence failures never fail an operation. They are logged and the
/// most recent load and write failures are kept for the front end to report.
///
/// Invariants: session ids are unique, at most one session is active, and
/// after `load` the collection is never empty.
pub struct ChatSessionStore {
    /// Sessions, newest first
    sessions: Vec<ChatSession>,
    /// Id of the active session
    active_session_id: Option<String>,
    /// Slot the collection is written to
    slot: StorageSlot,
    /// Persistent storage backend
    repository: Arc<dyn SessionRepository>,
    /// Most recent write failure, cleared by `take_persist_error`
    last_persist_error: Option<TesseractError>,
    /// Failure of the last slot read, cleared by `take_load_error`
    last_load_error: Option<TesseractError>,
}

impl ChatSessionStore {
    /// Loads the collection stored in `slot`.
    ///
    /// The first stored session becomes active. When the slot is empty or
    /// unreadable a fresh session is created (and written back).
    pub async fn load(repository: Arc<dyn SessionRepository>, slot: StorageSlot) -> Self {
        let mut store = Self {
            sessions: Vec::new(),
            active_session_id: None,
            slot,
            repository,
            last_persist_error: None,
            last_load_error: None,
        };
        store.reload().await;
        store
    }

    async fn reload(&mut self) {
        let loaded = match self.repository.load(&self.slot).await {
            Ok(sessions) => {
                self.last_load_error = None;
                sessions
            }
            Err(e) => {
                tracing::warn!(
                    "[ChatSessionStore] Could not load chat history from '{}', starting a new session: {}",
                    self.slot,
                    e
                );
                self.last_load_error = Some(e);
                Vec::new()
            }
        };

        self.sessions = dedupe_by_id(loaded);
        self.active_session_id = self.sessions.first().map(|s| s.id.clone());

        if self.sessions.is_empty() {
            self.create_session().await;
        } else {
            tracing::debug!(
                "[ChatSessionStore] Loaded {} sessions from '{}'",
                self.sessions.len(),
                self.slot
            );
        }
    }

    /// Replaces the slot (e.g. after sign-in or sign-out) and reloads.
    ///
    /// The current collection is already persisted, so nothing is written
    /// before switching.
    pub async fn switch_slot(&mut self, slot: StorageSlot) {
        if slot == self.slot {
            return;
        }
        tracing::info!("[ChatSessionStore] Switching storage slot to '{}'", slot);
        self.slot = slot;
        self.last_persist_error = None;
        self.reload().await;
    }

    /// Moves to the slot of `user` in the current namespace.
    pub async fn switch_user(&mut self, user: &UserIdentity) {
        let slot = StorageSlot::for_user(self.slot.namespace(), user);
        self.switch_slot(slot).await;
    }

    pub fn slot(&self) -> &StorageSlot {
        &self.slot
    }

    /// All sessions, newest first.
    pub fn sessions(&self) -> &[ChatSession] {
        &self.sessions
    }

    pub fn get(&self, session_id: &str) -> Option<&ChatSession> {
        self.sessions.iter().find(|s| s.id == session_id)
    }

    pub fn active_session_id(&self) -> Option<&str> {
        self.active_session_id.as_deref()
    }

    pub fn active_session(&self) -> Option<&ChatSession> {
        self.active_session_id.as_deref().and_then(|id| self.get(id))
    }

    /// Creates a new empty session at the top of the list and activates it.
    ///
    /// # Returns
    ///
    /// The id of the new session.
    pub async fn create_session(&mut self) -> String {
        let session = ChatSession::new();
        let id = session.id.clone();
        self.sessions.insert(0, session);
        self.active_session_id = Some(id.clone());
        self.persist().await;
        id
    }

    /// Makes an existing session active.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no session has this id.
    pub fn switch_session(&mut self, session_id: &str) -> Result<()> {
        if self.get(session_id).is_none() {
            return Err(TesseractError::not_found("ChatSession", session_id));
        }
        self.active_session_id = Some(session_id.to_string());
        Ok(())
    }

    /// Deletes a session.
    ///
    /// If the deleted session was active, the first remaining session becomes
    /// active; if none remain, a new session is created.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no session has this id.
    pub async fn delete_session(&mut self, session_id: &str) -> Result<()> {
        let index = self
            .sessions
            .iter()
            .position(|s| s.id == session_id)
            .ok_or_else(|| TesseractError::not_found("ChatSession", session_id))?;
        self.sessions.remove(index);

        if self.active_session_id.as_deref() == Some(session_id) {
            self.active_session_id = self.sessions.first().map(|s| s.id.clone());
        }

        if self.sessions.is_empty() {
            // create_session persists
            self.create_session().await;
        } else {
            self.persist().await;
        }
        Ok(())
    }

    /// Deletes every session and starts a fresh one.
    ///
    /// # Returns
    ///
    /// The id of the new session.
    pub async fn clear_all(&mut self) -> String {
        self.sessions.clear();
        self.active_session_id = None;
        self.create_session().await
    }

    /// Appends a message to the given session.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the session no longer exists.
    pub async fn append_message(&mut self, session_id: &str, message: Message) -> Result<()> {
        let session = self
            .sessions
            .iter_mut()
            .find(|s| s.id == session_id)
            .ok_or_else(|| TesseractError::not_found("ChatSession", session_id))?;
        session.append(message);
        self.persist().await;
        Ok(())
    }

    /// Appends a message to the active session.
    ///
    /// # Returns
    ///
    /// The id of the session the message was appended to.
    pub async fn append_to_active(&mut self, message: Message) -> Result<String> {
        let session_id = self
            .active_session_id
            .clone()
            .ok_or_else(|| TesseractError::internal("No active session"))?;
        self.append_message(&session_id, message).await?;
        Ok(session_id)
    }

    /// Sets a session's title.
    ///
    /// Titles arrive asynchronously, so a missing session (deleted in the
    /// meantime) or a blank title is silently ignored.
    ///
    /// # Returns
    ///
    /// `true` if a title was changed.
    pub async fn rename_session(&mut self, session_id: &str, title: &str) -> bool {
        let title = title.trim();
        if title.is_empty() {
            return false;
        }
        let Some(session) = self.sessions.iter_mut().find(|s| s.id == session_id) else {
            tracing::debug!(
                "[ChatSessionStore] Dropping title for vanished session {}",
                session_id
            );
            return false;
        };
        if session.title == title {
            return false;
        }
        session.title = title.to_string();
        self.persist().await;
        true
    }

    /// Returns and clears the failure of the last slot read.
    ///
    /// Set when `load`, `switch_slot` or `switch_user` found the slot
    /// unreadable and started over with a fresh session.
    pub fn take_load_error(&mut self) -> Option<TesseractError> {
        self.last_load_error.take()
    }

    /// Returns and clears the most recent write failure.
    pub fn take_persist_error(&mut self) -> Option<TesseractError> {
        self.last_persist_error.take()
    }

    async fn persist(&mut self) {
        match self.repository.save(&self.slot, &self.sessions).await {
            Ok(()) => {}
            Err(e) => {
                tracing::warn!(
                    "[ChatSessionStore] Failed to save chat history to '{}': {}",
                    self.slot,
                    e
                );
                self.last_persist_error = Some(e);
            }
        }
    }
}

fn dedupe_by_id(sessions: Vec<ChatSession>) -> Vec<ChatSession> {
    let mut seen = HashSet::new();
    sessions
        .into_iter()
        .filter(|s| {
            let fresh = seen.insert(s.id.clone());
            if !fresh {
                tracing::warn!("[ChatSessionStore] Dropping duplicate session id {}", s.id);
            }
            fresh
        })
        .collect()
}
