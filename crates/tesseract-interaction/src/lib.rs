//! Outbound side of Tesseract: the Gemini client, prompt templates and the
//! AI gateway built on top of them.

pub mod gateway;
pub mod gemini_api_client;
pub mod prompts;

pub use gateway::{AiGateway, ChatInput};
pub use gemini_api_client::GeminiApiClient;
pub use prompts::TopicSuggestions;
