//! JSON-file SessionRepository implementation.
//!
//! Each storage slot is a single JSON array of sessions, replaced atomically
//! on every save.

use crate::paths::TesseractPaths;
use crate::storage::AtomicFile;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tesseract_core::error::{Result, TesseractError};
use tesseract_core::session::{ChatSession, SessionRepository, StorageSlot};

/// Session repository backed by one JSON file per slot.
///
/// Directory structure:
/// ```text
/// chats_dir/
/// ├── tesseract-chats-guest.json
/// └── tesseract-chats-<encoded uid>.json
/// ```
#[derive(Debug, Clone)]
pub struct JsonSessionRepository {
    dir: PathBuf,
}

impl JsonSessionRepository {
    /// Creates a repository rooted at `dir`. The directory is created lazily
    /// on the first save.
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    /// Creates a repository at the default chats directory.
    ///
    /// # Errors
    ///
    /// Returns a `Config` error if the data directory cannot be determined.
    pub fn default_location(paths: &TesseractPaths) -> Result<Self> {
        let dir = paths
            .chats_dir()
            .map_err(|e| TesseractError::config(format!("Failed to get chats directory: {}", e)))?;
        Ok(Self::new(dir))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Returns the file backing `slot`.
    pub fn slot_path(&self, slot: &StorageSlot) -> PathBuf {
        self.dir.join(format!("{}.json", encode_file_stem(&slot.key())))
    }

    fn slot_file(&self, slot: &StorageSlot) -> AtomicFile<Vec<ChatSession>> {
        AtomicFile::json(self.slot_path(slot))
    }
}

/// Encodes a slot key as a file stem.
///
/// `[A-Za-z0-9-]` pass through; every other byte, `_` included, becomes
/// `_XX` (uppercase hex). The mapping is injective and never yields a path
/// separator or `..`.
fn encode_file_stem(key: &str) -> String {
    let mut stem = String::with_capacity(key.len());
    for byte in key.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'-' {
            stem.push(char::from(byte));
        } else {
            stem.push_str(&format!("_{:02X}", byte));
        }
    }
    stem
}

#[async_trait]
impl SessionRepository for JsonSessionRepository {
    async fn load(&self, slot: &StorageSlot) -> Result<Vec<ChatSession>> {
        let file = self.slot_file(slot);
        let loaded = tokio::task::spawn_blocking(move || file.load())
            .await
            .map_err(|e| TesseractError::internal(format!("Load task failed: {}", e)))??;

        let sessions = loaded.unwrap_or_default();
        tracing::debug!(
            "[JsonSessionRepository] Loaded {} sessions for slot '{}'",
            sessions.len(),
            slot
        );
        Ok(sessions)
    }

    async fn save(&self, slot: &StorageSlot, sessions: &[ChatSession]) -> Result<()> {
        let file = self.slot_file(slot);
        let snapshot = sessions.to_vec();
        tokio::task::spawn_blocking(move || file.save(&snapshot))
            .await
            .map_err(|e| TesseractError::internal(format!("Save task failed: {}", e)))??;
        Ok(())
    }
}
