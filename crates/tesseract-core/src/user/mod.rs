//! User domain module.
//!
//! This module contains the identity shape consumed from the auth
//! collaborator and the service that supplies it.
//!
//! # Module Structure
//!
//! - `model`: User identity domain model
//! - `service`: User service trait and implementations
//!
//! # Usage
//!
//! ```ignore
//! use tesseract_core::user::{UserIdentity, UserService, DefaultUserService};
//! ```

mod model;
mod service;

// Re-export public API
pub use model::{GUEST_STORAGE_KEY, UserIdentity};
pub use service::{DefaultUserService, UserService};
