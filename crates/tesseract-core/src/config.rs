//! Configuration models.
//!
//! `RootConfig` mirrors `config.toml`; `SecretConfig` mirrors `secret.json`.

use crate::session::DEFAULT_STORAGE_NAMESPACE;
use crate::user::UserIdentity;
use serde::{Deserialize, Serialize};

pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Root of `config.toml`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RootConfig {
    /// Identity supplied by the auth collaborator (guest when absent)
    pub user: UserIdentity,
    pub model: ModelSettings,
    pub storage: StorageSettings,
    pub debug: DebugSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelSettings {
    pub name: String,
    pub base_url: String,
    /// Request timeout in seconds; 0 keeps the transport default
    pub request_timeout_secs: u64,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            name: DEFAULT_GEMINI_MODEL.to_string(),
            base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
            request_timeout_secs: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    /// Prefix of every slot key
    pub namespace: String,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            namespace: DEFAULT_STORAGE_NAMESPACE.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DebugSettings {
    pub log_level: String,
}

impl Default for DebugSettings {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// Root of `secret.json`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SecretConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gemini: Option<GeminiConfig>,
}

/// Gemini API configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeminiConfig {
    pub api_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_name: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_toml_yields_defaults() {
        let config: RootConfig = toml::from_str("").unwrap();
        assert_eq!(config, RootConfig::default());
        assert!(config.user.is_guest());
        assert_eq!(config.model.name, DEFAULT_GEMINI_MODEL);
        assert_eq!(config.storage.namespace, "tesseract-chats");
    }

    #[test]
    fn test_partial_user_section() {
        let config: RootConfig = toml::from_str(
            r#"
            [user]
            uid = "abc"
            display_name = "Asha"
            is_anonymous = false
            "#,
        )
        .unwrap();
        assert_eq!(config.user.storage_key(), "abc");
        assert_eq!(config.debug.log_level, "info");
    }

    #[test]
    fn test_secret_json_shape() {
        let secret: SecretConfig =
            serde_json::from_str(r#"{"gemini":{"api_key":"k"}}"#).unwrap();
        let gemini = secret.gemini.unwrap();
        assert_eq!(gemini.api_key, "k");
        assert!(gemini.model_name.is_none());
    }
}
