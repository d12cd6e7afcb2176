use super::model::{CompletionRequest, CompletionResponse};
use crate::error::Result;
use async_trait::async_trait;

/// Boundary to a generative-AI completion service.
///
/// Implementations perform exactly one outbound call per `generate` and never
/// retry. Provider-level stop conditions are reported in the response, not
/// as errors; only transport and protocol failures are `Err`.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Model used when a request does not name one.
    fn default_model(&self) -> &str;

    /// Sends one completion request.
    async fn generate(&self, request: CompletionRequest) -> Result<CompletionResponse>;
}
