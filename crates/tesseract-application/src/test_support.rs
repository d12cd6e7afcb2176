//! Hand-written test doubles shared by the application tests.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tesseract_core::completion::{CompletionClient, CompletionRequest, CompletionResponse};
use tesseract_core::error::{Result, TesseractError};
use tesseract_core::session::{ChatSession, SessionRepository, StorageSlot};
use tokio::sync::{Notify, Semaphore};

const AUTO_NAME_PREFIX: &str = "Summarize this chat message";

// Mock CompletionClient for testing
pub struct MockCompletionClient {
    default_response: Result<CompletionResponse>,
    title_response: Option<Result<CompletionResponse>>,
    requests: Mutex<Vec<CompletionRequest>>,
    /// When set, chat requests wait for a permit before answering
    chat_gate: Option<Arc<Semaphore>>,
    chat_started: Notify,
}

impl MockCompletionClient {
    pub fn new() -> Self {
        Self {
            default_response: Ok(CompletionResponse::stopped("Hi! How can I help?")),
            title_response: None,
            requests: Mutex::new(Vec::new()),
            chat_gate: None,
            chat_started: Notify::new(),
        }
    }

    pub fn with_default_reply(self, text: &str) -> Self {
        self.with_default_response(Ok(CompletionResponse::stopped(text)))
    }

    pub fn with_default_response(mut self, response: Result<CompletionResponse>) -> Self {
        self.default_response = response;
        self
    }

    /// Reply used for auto-name prompts only.
    pub fn with_title_reply(self, text: &str) -> Self {
        self.with_title_response(Ok(CompletionResponse::stopped(text)))
    }

    pub fn with_title_response(mut self, response: Result<CompletionResponse>) -> Self {
        self.title_response = Some(response);
        self
    }

    pub fn failing_chat(self, message: &str) -> Self {
        self.with_default_response(Err(TesseractError::Gateway(message.to_string())))
    }

    pub fn with_chat_gate(mut self, gate: Arc<Semaphore>) -> Self {
        self.chat_gate = Some(gate);
        self
    }

    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Requests carrying the chat system prompt.
    pub fn chat_requests(&self) -> Vec<CompletionRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.system_instruction.is_some())
            .collect()
    }

    pub fn title_requests(&self) -> Vec<CompletionRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.prompt.starts_with(AUTO_NAME_PREFIX))
            .collect()
    }

    /// Resolves once a chat request has been received.
    pub async fn chat_started(&self) {
        self.chat_started.notified().await
    }
}

#[async_trait]
impl CompletionClient for MockCompletionClient {
    fn default_model(&self) -> &str {
        "mock-model"
    }

    async fn generate(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        let is_chat = request.system_instruction.is_some();
        let is_title = request.prompt.starts_with(AUTO_NAME_PREFIX);
        self.requests.lock().unwrap().push(request);

        if is_chat {
            self.chat_started.notify_one();
            if let Some(gate) = &self.chat_gate {
                let _permit = gate.acquire().await.unwrap();
            }
        }

        match (&self.title_response, is_title) {
            (Some(title), true) => title.clone(),
            _ => self.default_response.clone(),
        }
    }
}

// Mock SessionRepository for testing
#[derive(Default)]
pub struct MockSessionRepository {
    slots: Mutex<HashMap<String, Vec<ChatSession>>>,
    pub fail_reads: AtomicBool,
    pub fail_writes: AtomicBool,
    pub saves: AtomicUsize,
}

impl MockSessionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stored(&self, slot: &StorageSlot) -> Vec<ChatSession> {
        self.slots
            .lock()
            .unwrap()
            .get(&slot.key())
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl SessionRepository for MockSessionRepository {
    async fn load(&self, slot: &StorageSlot) -> Result<Vec<ChatSession>> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(TesseractError::Serialization {
                format: "JSON".to_string(),
                message: "expected value at line 1 column 1".to_string(),
            });
        }
        Ok(self.stored(slot))
    }

    async fn save(&self, slot: &StorageSlot, sessions: &[ChatSession]) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(TesseractError::storage("disk full"));
        }
        self.saves.fetch_add(1, Ordering::SeqCst);
        self.slots
            .lock()
            .unwrap()
            .insert(slot.key(), sessions.to_vec());
        Ok(())
    }
}
