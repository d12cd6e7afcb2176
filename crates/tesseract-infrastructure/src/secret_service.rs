//! Secret service implementation.
//!
//! This module provides a service for loading secret configuration (API keys)
//! stored in secret.json, with environment variable overrides.

use crate::paths::TesseractPaths;
use crate::storage::AtomicFile;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use tesseract_core::config::{GeminiConfig, SecretConfig};
use tesseract_core::error::{Result, TesseractError};
use tesseract_core::secret::SecretService;

/// Environment variables checked, in order, for a Gemini API key.
pub const API_KEY_ENV_VARS: [&str; 2] = ["GEMINI_API_KEY", "GOOGLE_API_KEY"];

/// Service for loading secret configuration.
///
/// Reads secret.json once and caches the result. A non-empty
/// `GEMINI_API_KEY` or `GOOGLE_API_KEY` replaces the file's key.
///
/// # Example
///
/// ```ignore
/// use tesseract_infrastructure::SecretServiceImpl;
/// use tesseract_core::secret::SecretService;
///
/// let service = SecretServiceImpl::from_paths(&paths)?;
/// let secrets = service.load_secrets().await?;
/// ```
#[derive(Debug, Clone)]
pub struct SecretServiceImpl {
    path: PathBuf,
    read_env: bool,
    secrets: Arc<RwLock<Option<SecretConfig>>>,
}

impl SecretServiceImpl {
    /// Creates a service reading `path`, with environment overrides enabled.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            read_env: true,
            secrets: Arc::new(RwLock::new(None)),
        }
    }

    /// Creates a service at the standard location, writing the 0600 template
    /// if no secrets file exists yet.
    pub fn from_paths(paths: &TesseractPaths) -> std::io::Result<Self> {
        Ok(Self::new(paths.ensure_secret_file()?))
    }

    /// Disables environment variable overrides.
    pub fn without_env(mut self) -> Self {
        self.read_env = false;
        self
    }

    fn load_secrets_internal(&self) -> Result<SecretConfig> {
        if let Ok(read_lock) = self.secrets.read() {
            if let Some(ref cached) = *read_lock {
                return Ok(cached.clone());
            }
        }

        let from_file = AtomicFile::<SecretConfig>::json(self.path.clone())
            .load()
            .map_err(|e| {
                TesseractError::config(format!("Failed to read secret file {:?}: {}", self.path, e))
            })?
            .unwrap_or_default();

        let loaded = if self.read_env {
            apply_env_override(from_file, |name| std::env::var(name).ok())
        } else {
            from_file
        };

        if let Ok(mut write_lock) = self.secrets.write() {
            *write_lock = Some(loaded.clone());
        }

        Ok(loaded)
    }
}

/// Replaces the Gemini API key with the first non-empty environment value.
pub fn apply_env_override(
    mut config: SecretConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> SecretConfig {
    let env_key = API_KEY_ENV_VARS
        .iter()
        .filter_map(|name| lookup(name))
        .map(|value| value.trim().to_string())
        .find(|value| !value.is_empty());

    if let Some(api_key) = env_key {
        tracing::debug!("[SecretService] Using Gemini API key from environment");
        match config.gemini.as_mut() {
            Some(gemini) => gemini.api_key = api_key,
            None => {
                config.gemini = Some(GeminiConfig {
                    api_key,
                    model_name: None,
                })
            }
        }
    }
    config
}

#[async_trait::async_trait]
impl SecretService for SecretServiceImpl {
    async fn load_secrets(&self) -> Result<SecretConfig> {
        self.load_secrets_internal()
    }
}
