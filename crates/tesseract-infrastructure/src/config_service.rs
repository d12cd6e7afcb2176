//! Configuration service implementation.
//!
//! This module provides a ConfigService that loads the root configuration
//! from the configuration file (~/.config/tesseract/config.toml).

use crate::paths::TesseractPaths;
use crate::storage::{AtomicFile, AtomicFileError};
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use tesseract_core::config::RootConfig;

/// Configuration service that loads and caches the root configuration.
///
/// The file is written with defaults when it does not exist yet. A file that
/// cannot be parsed is left alone and the defaults are used instead.
#[derive(Debug, Clone)]
pub struct ConfigService {
    path: PathBuf,
    /// Cached configuration loaded from file.
    config: Arc<RwLock<Option<RootConfig>>>,
}

impl ConfigService {
    /// Creates a ConfigService for an explicit config.toml path.
    ///
    /// The configuration is loaded lazily on first access.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            config: Arc::new(RwLock::new(None)),
        }
    }

    /// Creates a ConfigService at the standard location.
    pub fn from_paths(paths: &TesseractPaths) -> Result<Self, crate::paths::PathError> {
        Ok(Self::new(paths.config_file()?))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Gets the root configuration, loading from file if not cached.
    pub fn get_config(&self) -> RootConfig {
        if let Ok(read_lock) = self.config.read() {
            if let Some(ref cached) = *read_lock {
                return cached.clone();
            }
        }

        let loaded = match self.load_config() {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!(
                    "[ConfigService] Failed to load {:?}, using defaults: {}",
                    self.path,
                    e
                );
                RootConfig::default()
            }
        };

        if let Ok(mut write_lock) = self.config.write() {
            *write_lock = Some(loaded.clone());
        }

        loaded
    }

    /// Invalidates the cache, forcing a reload on next access.
    pub fn invalidate_cache(&self) {
        if let Ok(mut write_lock) = self.config.write() {
            *write_lock = None;
        }
    }

    fn load_config(&self) -> Result<RootConfig, AtomicFileError> {
        let file = AtomicFile::<RootConfig>::toml(self.path.clone());
        match file.load()? {
            Some(config) => Ok(config),
            None => {
                let default_config = RootConfig::default();
                file.save(&default_config)?;
                tracing::info!("[ConfigService] Wrote default configuration to {:?}", self.path);
                Ok(default_config)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_is_created_with_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        let service = ConfigService::new(&path);

        let config = service.get_config();

        assert_eq!(config, RootConfig::default());
        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains("namespace = \"tesseract-chats\""));
    }

    #[test]
    fn test_reads_user_section() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[user]\nuid = \"u-42\"\ndisplay_name = \"Asha\"\nis_anonymous = false\n",
        )
        .unwrap();

        let config = ConfigService::new(&path).get_config();

        assert_eq!(config.user.storage_key(), "u-42");
        assert_eq!(config.user.preferred_name(), Some("Asha"));
    }

    #[test]
    fn test_invalid_file_falls_back_without_overwriting() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[user\nuid =").unwrap();

        let config = ConfigService::new(&path).get_config();

        assert_eq!(config, RootConfig::default());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "[user\nuid =");
    }

    #[test]
    fn test_config_is_cached_until_invalidated() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        let service = ConfigService::new(&path);
        service.get_config();

        std::fs::write(&path, "[debug]\nlog_level = \"trace\"\n").unwrap();
        assert_eq!(service.get_config().debug.log_level, "info");

        service.invalidate_cache();
        assert_eq!(service.get_config().debug.log_level, "trace");
    }
}
