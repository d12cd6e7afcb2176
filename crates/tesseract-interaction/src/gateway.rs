//! AI Gateway: the single entry point for chat completions.

use crate::prompts;
use std::sync::Arc;
use tesseract_core::completion::{CompletionClient, CompletionOutcome, CompletionRequest};
use tesseract_core::error::{Result, TesseractError};
use tesseract_core::session::Message;

/// Prior turns plus the new user message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatInput {
    pub history: Vec<Message>,
    pub message: String,
    /// Offered to the model through the system prompt when present
    pub user_name: Option<String>,
}

impl ChatInput {
    pub fn new(history: Vec<Message>, message: impl Into<String>) -> Self {
        Self {
            history,
            message: message.into(),
            user_name: None,
        }
    }

    pub fn with_user_name(mut self, user_name: Option<String>) -> Self {
        self.user_name = user_name;
        self
    }
}

/// Forwards chat turns to the completion service with the system prompt and
/// turns the provider's answer into the text shown to the user.
///
/// Each call makes exactly one outbound request. Nothing is retried.
#[derive(Clone)]
pub struct AiGateway {
    client: Arc<dyn CompletionClient>,
}

impl AiGateway {
    pub fn new(client: Arc<dyn CompletionClient>) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &Arc<dyn CompletionClient> {
        &self.client
    }

    /// Sends one chat turn.
    ///
    /// History is forwarded verbatim; roles are not forced to alternate.
    ///
    /// # Returns
    ///
    /// The reply text. Blocked or truncated completions still return `Ok`
    /// with an apology or a truncation note.
    ///
    /// # Errors
    ///
    /// Returns `TesseractError::Gateway` if the call itself fails.
    pub async fn chat(&self, input: ChatInput) -> Result<String> {
        let outcome = self.complete(input).await.map_err(|e| {
            tracing::error!("[AiGateway] Failed to generate response: {}", e);
            TesseractError::gateway(e)
        })?;

        if let CompletionOutcome::Blocked { partial, reason } = &outcome {
            tracing::warn!(
                "[AiGateway] The response was stopped due to: {} (partial text: {})",
                reason,
                partial.is_some()
            );
        }
        Ok(outcome.into_reply())
    }

    async fn complete(&self, input: ChatInput) -> Result<CompletionOutcome> {
        let system = prompts::system_prompt(input.user_name.as_deref())?;
        let request = CompletionRequest::new(input.message)
            .with_system_instruction(system)
            .with_history(input.history);

        let response = self.client.generate(request).await?;
        Ok(CompletionOutcome::from_response(response))
    }

    /// Sends a whole conversation: the last message is the prompt and the
    /// rest is history.
    ///
    /// # Returns
    ///
    /// `None` for an empty conversation. Gateway failures are folded into a
    /// reply prefixed with `Error from AI: `.
    pub async fn send_message(&self, all_messages: &[Message]) -> Option<String> {
        let (last, history) = all_messages.split_last()?;
        let input = ChatInput::new(history.to_vec(), last.content.clone());

        match self.chat(input).await {
            Ok(reply) => Some(reply),
            Err(e) => {
                tracing::error!("[AiGateway] Error in send_message: {}", e);
                Some(format!("Error from AI: {}", e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use tesseract_core::completion::{
        BLOCKED_REPLY, CompletionResponse, EMPTY_RESPONSE_REPLY, FinishReason, TRUNCATION_NOTE,
    };

    // Mock CompletionClient for testing
    struct MockCompletionClient {
        reply: Result<CompletionResponse>,
        requests: Mutex<Vec<CompletionRequest>>,
    }

    impl MockCompletionClient {
        fn replying(reply: Result<CompletionResponse>) -> Arc<Self> {
            Arc::new(Self {
                reply,
                requests: Mutex::new(Vec::new()),
            })
        }

        fn requests(&self) -> Vec<CompletionRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl CompletionClient for MockCompletionClient {
        fn default_model(&self) -> &str {
            "mock-model"
        }

        async fn generate(&self, request: CompletionRequest) -> Result<CompletionResponse> {
            self.requests.lock().unwrap().push(request);
            self.reply.clone()
        }
    }

    fn response(text: Option<&str>, reason: FinishReason) -> Result<CompletionResponse> {
        Ok(CompletionResponse {
            text: text.map(str::to_string),
            finish_reason: reason,
            usage: None,
        })
    }

    #[tokio::test]
    async fn test_chat_forwards_history_and_system_prompt() {
        let client = MockCompletionClient::replying(response(Some("Hi!"), FinishReason::Stop));
        let gateway = AiGateway::new(client.clone());
        // Two user turns in a row are forwarded as-is
        let history = vec![Message::user("first"), Message::user("second")];

        let reply = gateway
            .chat(ChatInput::new(history.clone(), "third").with_user_name(Some("Asha".into())))
            .await
            .unwrap();

        assert_eq!(reply, "Hi!");
        let requests = client.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].history, history);
        assert_eq!(requests[0].prompt, "third");
        let system = requests[0].system_instruction.as_deref().unwrap();
        assert!(system.starts_with("You are Tesseract AI"));
        assert!(system.contains("named Asha"));
    }

    #[tokio::test]
    async fn test_blocked_without_text_is_apology() {
        let client = MockCompletionClient::replying(response(None, FinishReason::Safety));
        let gateway = AiGateway::new(client);

        let reply = gateway.chat(ChatInput::new(vec![], "x")).await.unwrap();

        assert_eq!(reply, BLOCKED_REPLY);
    }

    #[tokio::test]
    async fn test_truncated_text_gets_note() {
        let client =
            MockCompletionClient::replying(response(Some("Partial answer"), FinishReason::MaxTokens));
        let gateway = AiGateway::new(client);

        let reply = gateway.chat(ChatInput::new(vec![], "x")).await.unwrap();

        assert_eq!(reply, format!("Partial answer\n\n{}", TRUNCATION_NOTE));
    }

    #[tokio::test]
    async fn test_empty_completion_uses_fallback() {
        let client = MockCompletionClient::replying(response(Some(""), FinishReason::Other));
        let gateway = AiGateway::new(client);

        let reply = gateway.chat(ChatInput::new(vec![], "x")).await.unwrap();

        assert_eq!(reply, EMPTY_RESPONSE_REPLY);
    }

    #[tokio::test]
    async fn test_transport_failure_is_wrapped() {
        let client = MockCompletionClient::replying(Err(TesseractError::Gateway(
            "connection refused".into(),
        )));
        let gateway = AiGateway::new(client);

        let err = gateway.chat(ChatInput::new(vec![], "x")).await.unwrap_err();

        assert!(err.is_gateway());
        assert_eq!(
            err.to_string(),
            "An error occurred: connection refused. Please check the server logs for more details."
        );
    }

    #[tokio::test]
    async fn test_send_message_splits_last_message() {
        let client = MockCompletionClient::replying(response(Some("ok"), FinishReason::Stop));
        let gateway = AiGateway::new(client.clone());
        let all = vec![Message::user("a"), Message::model("b"), Message::user("c")];

        assert_eq!(gateway.send_message(&all).await.as_deref(), Some("ok"));

        let request = &client.requests()[0];
        assert_eq!(request.prompt, "c");
        assert_eq!(request.history, all[..2].to_vec());
    }

    #[tokio::test]
    async fn test_send_message_empty_and_error() {
        let client =
            MockCompletionClient::replying(Err(TesseractError::Gateway("timeout".into())));
        let gateway = AiGateway::new(client.clone());

        assert!(gateway.send_message(&[]).await.is_none());
        assert!(client.requests().is_empty());

        let reply = gateway.send_message(&[Message::user("hi")]).await.unwrap();
        assert_eq!(
            reply,
            "Error from AI: An error occurred: timeout. Please check the server logs for more details."
        );
    }
}
