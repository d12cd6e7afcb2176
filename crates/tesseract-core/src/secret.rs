//! Access to API keys.

use crate::config::{GeminiConfig, SecretConfig};
use crate::error::{Result, TesseractError};

/// Source of provider credentials.
///
/// Implementations must keep key material out of logs and error messages.
#[async_trait::async_trait]
pub trait SecretService: Send + Sync {
    /// Loads the full secret configuration.
    async fn load_secrets(&self) -> Result<SecretConfig>;

    /// Returns the Gemini credentials, requiring a non-blank API key.
    ///
    /// # Errors
    ///
    /// Returns a `Config` error when no key is available.
    async fn gemini_credentials(&self) -> Result<GeminiConfig> {
        self.load_secrets()
            .await?
            .gemini
            .filter(|gemini| !gemini.api_key.trim().is_empty())
            .ok_or_else(|| {
                TesseractError::config(
                    "Gemini API key not found: set GEMINI_API_KEY or fill in secret.json",
                )
            })
    }
}
