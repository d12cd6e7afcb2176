//! Session domain module.
//!
//! This module contains all session-related domain models, the repository
//! interface, and the session store.
//!
//! # Module Structure
//!
//! - `message`: Conversation message types (`MessageRole`, `Message`)
//! - `model`: Core session domain model (`ChatSession`)
//! - `repository`: Repository trait for slot persistence (`SessionRepository`, `StorageSlot`)
//! - `store`: Session collection with write-through persistence (`ChatSessionStore`)
//!
//! # Usage
//!
//! ```ignore
//! use tesseract_core::session::{ChatSession, ChatSessionStore, SessionRepository};
//! use tesseract_core::session::{Message, MessageRole};
//! ```

mod message;
mod model;
mod repository;
mod store;
#[cfg(test)]
mod store_test;

// Re-export public API
pub use message::{Message, MessageRole};
pub use model::{ChatSession, DEFAULT_SESSION_TITLE};
pub use repository::{DEFAULT_STORAGE_NAMESPACE, SessionRepository, StorageSlot};
pub use store::ChatSessionStore;
