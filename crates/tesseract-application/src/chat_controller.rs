//! Chat controller.
//!
//! Orchestrates one chat exchange: the user turn is stored first, the AI
//! gateway is called, then the model turn (or an error turn) is appended.
//! The first message of a session also starts a background title task.

use crate::auxiliary_flow_service::AuxiliaryFlowService;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tesseract_core::error::{Result, TesseractError};
use tesseract_core::session::{ChatSession, ChatSessionStore, Message, SessionRepository, StorageSlot};
use tesseract_core::user::UserIdentity;
use tesseract_interaction::{AiGateway, ChatInput};
use tokio::sync::RwLock;
use tokio::task::JoinHandle;

/// Model turn appended when the gateway call fails.
pub const ERROR_REPLY: &str = "Sorry, I ran into an error. Please try again.";

/// Notification emitted when the gateway call fails.
pub const RESPONSE_FAILED_NOTICE: &str = "Failed to get AI response.";

/// Notification emitted when chat history could not be written.
pub const SAVE_FAILED_NOTICE: &str = "Could not save your chat history.";

/// Notification emitted when a stored chat history could not be read.
pub const LOAD_FAILED_NOTICE: &str = "Could not load chat history. Starting a new session.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatState {
    Idle,
    Sending,
}

/// User-facing notice (toast) raised by the controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    Error(String),
    Warning(String),
}

/// Callback type for notifications.
pub type NotificationCallback = Arc<dyn Fn(Notification) + Send + Sync>;

/// Result of [`ChatController::submit`].
#[derive(Debug)]
pub enum SendOutcome {
    /// Input was empty after trimming
    Ignored,
    /// Another message is still being sent
    Busy,
    Replied {
        session_id: String,
        reply: String,
        title_task: Option<JoinHandle<()>>,
    },
    /// The gateway failed; an error turn was appended
    Failed {
        session_id: String,
        error: TesseractError,
        title_task: Option<JoinHandle<()>>,
    },
}

impl SendOutcome {
    /// Takes the handle of the background title task, if one was started.
    pub fn take_title_task(&mut self) -> Option<JoinHandle<()>> {
        match self {
            Self::Replied { title_task, .. } | Self::Failed { title_task, .. } => title_task.take(),
            Self::Ignored | Self::Busy => None,
        }
    }
}

/// Resets the sending flag when the exchange ends, however it ends.
struct SendingGuard<'a>(&'a AtomicBool);

impl Drop for SendingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Drives the chat UI: session list, active chat and message exchange.
///
/// # Thread Safety
///
/// The store lives behind `Arc<RwLock<_>>` and is never locked across the
/// gateway call, so title tasks and user actions can interleave with a send.
/// Late results are merged by session id.
pub struct ChatController {
    store: Arc<RwLock<ChatSessionStore>>,
    gateway: AiGateway,
    flows: Arc<AuxiliaryFlowService>,
    identity: RwLock<UserIdentity>,
    sending: AtomicBool,
    notifier: Option<NotificationCallback>,
}

impl ChatController {
    /// Creates a controller over an already loaded store.
    pub fn new(
        store: ChatSessionStore,
        gateway: AiGateway,
        flows: AuxiliaryFlowService,
        identity: UserIdentity,
    ) -> Self {
        Self {
            store: Arc::new(RwLock::new(store)),
            gateway,
            flows: Arc::new(flows),
            identity: RwLock::new(identity),
            sending: AtomicBool::new(false),
            notifier: None,
        }
    }

    /// Loads the slot of `identity` and creates a controller over it.
    ///
    /// # Arguments
    ///
    /// * `repository` - Storage backend for chat sessions
    /// * `namespace` - Prefix of the storage slot key
    /// * `identity` - Current user (or guest)
    /// * `gateway` - Gateway for the main chat
    /// * `flows` - Auxiliary flows (title generation)
    pub async fn load(
        repository: Arc<dyn SessionRepository>,
        namespace: &str,
        identity: UserIdentity,
        gateway: AiGateway,
        flows: AuxiliaryFlowService,
    ) -> Self {
        let slot = StorageSlot::for_user(namespace, &identity);
        let store = ChatSessionStore::load(repository, slot).await;
        Self::new(store, gateway, flows, identity)
    }

    /// Sets the callback that receives notifications.
    ///
    /// Storage failures that happened before a notifier was attached (an
    /// unreadable slot at load time) are delivered to it right away.
    pub async fn with_notifier(mut self, notifier: NotificationCallback) -> Self {
        self.notifier = Some(notifier);
        let store = self.store.clone();
        self.report_store_errors(&mut *store.write().await);
        self
    }

    pub fn state(&self) -> ChatState {
        if self.sending.load(Ordering::SeqCst) {
            ChatState::Sending
        } else {
            ChatState::Idle
        }
    }

    pub fn store(&self) -> Arc<RwLock<ChatSessionStore>> {
        self.store.clone()
    }

    pub fn flows(&self) -> &AuxiliaryFlowService {
        &self.flows
    }

    pub async fn identity(&self) -> UserIdentity {
        self.identity.read().await.clone()
    }

    /// Snapshot of all sessions, newest first.
    pub async fn sessions(&self) -> Vec<ChatSession> {
        self.store.read().await.sessions().to_vec()
    }

    pub async fn active_session(&self) -> Option<ChatSession> {
        self.store.read().await.active_session().cloned()
    }

    /// Starts a new chat and makes it active.
    pub async fn new_chat(&self) -> String {
        let mut store = self.store.write().await;
        let id = store.create_session().await;
        self.report_store_errors(&mut store);
        id
    }

    pub async fn switch_chat(&self, session_id: &str) -> Result<()> {
        self.store.write().await.switch_session(session_id)
    }

    pub async fn delete_chat(&self, session_id: &str) -> Result<()> {
        let mut store = self.store.write().await;
        store.delete_session(session_id).await?;
        self.report_store_errors(&mut store);
        Ok(())
    }

    /// Deletes every chat and starts a fresh one.
    pub async fn clear_history(&self) -> String {
        let mut store = self.store.write().await;
        let id = store.clear_all().await;
        self.report_store_errors(&mut store);
        id
    }

    /// Replaces the current identity (sign-in or sign-out) and loads its
    /// chats.
    pub async fn switch_user(&self, identity: UserIdentity) {
        tracing::info!(
            "[ChatController] Switching user to '{}'",
            identity.storage_key()
        );
        let mut store = self.store.write().await;
        store.switch_user(&identity).await;
        *self.identity.write().await = identity;
        self.report_store_errors(&mut store);
    }

    /// Submits user input to the active chat.
    ///
    /// The user turn is appended before the gateway is called. On failure a
    /// single error turn is appended and a `Notification::Error` is emitted.
    ///
    /// # Returns
    ///
    /// - `SendOutcome::Ignored`: The input was blank
    /// - `SendOutcome::Busy`: A previous message is still being sent
    /// - `SendOutcome::Replied` / `SendOutcome::Failed`: The exchange finished
    pub async fn submit(&self, input: &str) -> SendOutcome {
        let text = input.trim();
        if text.is_empty() {
            return SendOutcome::Ignored;
        }

        if self
            .sending
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            tracing::debug!("[ChatController] Ignoring submit while sending");
            return SendOutcome::Busy;
        }
        let _guard = SendingGuard(&self.sending);

        let identity = self.identity().await;

        let (session_id, history) = {
            let mut store = self.store.write().await;
            let Some(session) = store.active_session() else {
                return SendOutcome::Ignored;
            };
            let session_id = session.id.clone();
            let history = session.messages().to_vec();

            if let Err(e) = store.append_message(&session_id, Message::user(text)).await {
                tracing::error!("[ChatController] Failed to append user message: {}", e);
                return SendOutcome::Ignored;
            }
            self.report_store_errors(&mut store);
            (session_id, history)
        };

        let title_task = if history.is_empty() && !identity.is_guest() {
            Some(self.spawn_title_task(session_id.clone(), text.to_string()))
        } else {
            None
        };

        let chat_input = ChatInput::new(history, text)
            .with_user_name(identity.preferred_name().map(str::to_string));

        match self.gateway.chat(chat_input).await {
            Ok(reply) => {
                self.append_reply(&session_id, Message::model(reply.clone()))
                    .await;
                SendOutcome::Replied {
                    session_id,
                    reply,
                    title_task,
                }
            }
            Err(error) => {
                tracing::error!("[ChatController] Error sending message: {}", error);
                self.append_reply(&session_id, Message::model(ERROR_REPLY))
                    .await;
                self.notify(Notification::Error(RESPONSE_FAILED_NOTICE.to_string()));
                SendOutcome::Failed {
                    session_id,
                    error,
                    title_task,
                }
            }
        }
    }

    /// Rewrites `input` with the query-enhancement flow.
    pub async fn enhance_input(&self, input: &str) -> Result<String> {
        self.flows.enhance_user_query(input.trim()).await
    }

    /// Retitles the active chat from its whole history.
    ///
    /// # Returns
    ///
    /// The new title.
    pub async fn retitle_active(&self) -> Result<String> {
        let session = self
            .active_session()
            .await
            .ok_or_else(|| TesseractError::internal("No active session"))?;
        if session.is_empty() {
            return Err(TesseractError::internal("The active chat has no messages yet"));
        }

        let title = self.flows.smart_chat_title(session.messages()).await?;
        let mut store = self.store.write().await;
        store.rename_session(&session.id, &title).await;
        self.report_store_errors(&mut store);
        Ok(title)
    }

    async fn append_reply(&self, session_id: &str, message: Message) {
        let mut store = self.store.write().await;
        match store.append_message(session_id, message).await {
            Ok(()) => self.report_store_errors(&mut store),
            // deleted while the request was in flight
            Err(e) if e.is_not_found() => {
                tracing::debug!("[ChatController] Dropping reply for {}: {}", session_id, e);
            }
            Err(e) => tracing::error!("[ChatController] Failed to append reply: {}", e),
        }
    }

    fn spawn_title_task(&self, session_id: String, first_message: String) -> JoinHandle<()> {
        let flows = self.flows.clone();
        let store = self.store.clone();

        tokio::spawn(async move {
            match flows.auto_name_chat(&first_message).await {
                Ok(title) => {
                    let mut store = store.write().await;
                    if store.rename_session(&session_id, &title).await {
                        tracing::info!("[ChatController] Named chat {} '{}'", session_id, title);
                    }
                    if let Some(e) = store.take_persist_error() {
                        tracing::warn!("[ChatController] Title not saved: {}", e);
                    }
                }
                Err(e) => {
                    tracing::warn!("[ChatController] Error auto-naming chat: {}", e);
                }
            }
        })
    }

    fn report_store_errors(&self, store: &mut ChatSessionStore) {
        if store.take_load_error().is_some() {
            self.notify(Notification::Warning(LOAD_FAILED_NOTICE.to_string()));
        }
        if store.take_persist_error().is_some() {
            self.notify(Notification::Warning(SAVE_FAILED_NOTICE.to_string()));
        }
    }

    fn notify(&self, notification: Notification) {
        if let Some(notifier) = &self.notifier {
            notifier(notification);
        }
    }
}
