//! Unified path management for tesseract configuration and chat data.
//!
//! This ensures consistency across all platforms (Linux, macOS, Windows).

use std::path::{Path, PathBuf};
use tesseract_core::config::{DEFAULT_GEMINI_MODEL, GeminiConfig, SecretConfig};
use thiserror::Error;

const APP_DIR_NAME: &str = "tesseract";

/// Errors that can occur during path resolution.
#[derive(Debug, Error)]
pub enum PathError {
    /// Home directory could not be determined.
    #[error("Cannot find home directory")]
    HomeDirNotFound,
}

/// Unified path management for tesseract.
///
/// # Directory Structure
///
/// ```text
/// ~/.config/tesseract/           # Config directory
/// ├── config.toml                # Application configuration
/// ├── secret.json                # API keys
/// └── logs/                      # Application logs
///     └── tesseract.log.YYYY-MM-DD
///
/// ~/.local/share/tesseract/      # Data directory
/// └── chats/                     # One JSON slot per user
///     ├── tesseract-chats-guest.json
///     └── tesseract-chats-<uid>.json
/// ```
///
/// With a base path (tests, `--home`), both trees collapse into that
/// directory.
#[derive(Debug, Clone, Default)]
pub struct TesseractPaths {
    base: Option<PathBuf>,
}

impl TesseractPaths {
    pub fn new(base: Option<&Path>) -> Self {
        Self {
            base: base.map(Path::to_path_buf),
        }
    }

    /// Returns the tesseract configuration directory.
    pub fn config_dir(&self) -> Result<PathBuf, PathError> {
        match &self.base {
            Some(base) => Ok(base.clone()),
            None => dirs::config_dir()
                .map(|dir| dir.join(APP_DIR_NAME))
                .ok_or(PathError::HomeDirNotFound),
        }
    }

    /// Returns the tesseract data directory.
    pub fn data_dir(&self) -> Result<PathBuf, PathError> {
        match &self.base {
            Some(base) => Ok(base.clone()),
            None => dirs::data_dir()
                .map(|dir| dir.join(APP_DIR_NAME))
                .ok_or(PathError::HomeDirNotFound),
        }
    }

    pub fn config_file(&self) -> Result<PathBuf, PathError> {
        Ok(self.config_dir()?.join("config.toml"))
    }

    /// Returns the path to the secrets file.
    ///
    /// # Security Note
    ///
    /// Ensure this file has appropriate permissions (e.g., 600) to prevent
    /// unauthorized access.
    pub fn secret_file(&self) -> Result<PathBuf, PathError> {
        Ok(self.config_dir()?.join("secret.json"))
    }

    /// Ensures the secrets file exists, writing an empty template if absent.
    ///
    /// The template is created with mode 600 on Unix.
    ///
    /// # Returns
    ///
    /// - `Ok(PathBuf)`: Path to the (possibly new) secrets file
    /// - `Err(std::io::Error)`: Could not create the file
    pub fn ensure_secret_file(&self) -> Result<PathBuf, std::io::Error> {
        let secret_path = self
            .secret_file()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::NotFound, e.to_string()))?;

        if secret_path.exists() {
            return Ok(secret_path);
        }

        if let Some(parent) = secret_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let template = SecretConfig {
            gemini: Some(GeminiConfig {
                api_key: String::new(),
                model_name: Some(DEFAULT_GEMINI_MODEL.to_string()),
            }),
        };
        let template_json =
            serde_json::to_string_pretty(&template).map_err(std::io::Error::other)?;
        std::fs::write(&secret_path, template_json)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let permissions = std::fs::Permissions::from_mode(0o600);
            std::fs::set_permissions(&secret_path, permissions)?;
        }

        tracing::info!("[TesseractPaths] Created secret template at {:?}", secret_path);
        Ok(secret_path)
    }

    /// Directory holding one JSON file per storage slot.
    pub fn chats_dir(&self) -> Result<PathBuf, PathError> {
        Ok(self.data_dir()?.join("chats"))
    }

    pub fn logs_dir(&self) -> Result<PathBuf, PathError> {
        Ok(self.config_dir()?.join("logs"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_dirs_end_with_app_name() {
        let paths = TesseractPaths::default();
        if let Ok(config_dir) = paths.config_dir() {
            assert!(config_dir.ends_with("tesseract"));
        }
        if let Ok(data_dir) = paths.data_dir() {
            assert!(data_dir.ends_with("tesseract"));
        }
    }

    #[test]
    fn test_base_override() {
        let base = Path::new("/tmp/tesseract-test");
        let paths = TesseractPaths::new(Some(base));

        assert_eq!(paths.config_file().unwrap(), base.join("config.toml"));
        assert_eq!(paths.secret_file().unwrap(), base.join("secret.json"));
        assert_eq!(paths.chats_dir().unwrap(), base.join("chats"));
        assert_eq!(paths.logs_dir().unwrap(), base.join("logs"));
    }

    #[test]
    fn test_ensure_secret_file_writes_template_once() {
        let dir = tempfile::TempDir::new().unwrap();
        let paths = TesseractPaths::new(Some(dir.path()));

        let path = paths.ensure_secret_file().unwrap();
        let template: SecretConfig =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(template.gemini.unwrap().api_key, "");

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(&path).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o600);
        }

        // An existing file is left untouched
        std::fs::write(&path, r#"{"gemini":{"api_key":"k"}}"#).unwrap();
        paths.ensure_secret_file().unwrap();
        assert!(std::fs::read_to_string(&path).unwrap().contains("\"k\""));
    }
}
