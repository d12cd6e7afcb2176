//! Completion contract with the external generative-AI provider.
//!
//! - `model`: Request/response shapes (`CompletionRequest`, `CompletionResponse`, `FinishReason`)
//! - `outcome`: Interpretation of a response (`CompletionOutcome`)
//! - `client`: The provider boundary trait (`CompletionClient`)

mod client;
mod model;
mod outcome;

pub use client::CompletionClient;
pub use model::{CompletionRequest, CompletionResponse, FinishReason, ResponseFormat, UsageMetadata};
pub use outcome::{BLOCKED_REPLY, CompletionOutcome, EMPTY_RESPONSE_REPLY, TRUNCATION_NOTE};
