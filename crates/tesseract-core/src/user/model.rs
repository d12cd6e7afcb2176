//! UserIdentity domain model.
//!
//! Represents the signed-in user (or a guest) as supplied by the auth
//! collaborator. Only the shape is consumed here; sign-in itself lives
//! elsewhere.

use serde::{Deserialize, Serialize};

/// Storage partition key used for every unauthenticated user.
pub const GUEST_STORAGE_KEY: &str = "guest";

/// User identity domain model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserIdentity {
    /// Stable user id from the auth provider (empty for guests)
    pub uid: String,
    /// Display name chosen at sign-up
    pub display_name: Option<String>,
    /// Whether the user continued as guest
    pub is_anonymous: bool,
}

impl UserIdentity {
    /// Creates an anonymous identity.
    pub fn guest() -> Self {
        Self {
            uid: String::new(),
            display_name: None,
            is_anonymous: true,
        }
    }

    /// Creates an authenticated identity.
    pub fn authenticated(uid: impl Into<String>, display_name: Option<String>) -> Self {
        Self {
            uid: uid.into(),
            display_name,
            is_anonymous: false,
        }
    }

    /// True for anonymous users and for identities without a usable uid.
    pub fn is_guest(&self) -> bool {
        self.is_anonymous || self.uid.trim().is_empty()
    }

    /// Partition key for this user's chat storage.
    ///
    /// Distinct identities always get distinct keys. A uid is used as is,
    /// except that one equal to the guest key or starting with `_` gets an
    /// extra leading `_`, so no account can land in the guest partition.
    pub fn storage_key(&self) -> String {
        if self.is_guest() {
            return GUEST_STORAGE_KEY.to_string();
        }
        if self.uid == GUEST_STORAGE_KEY || self.uid.starts_with('_') {
            format!("_{}", self.uid)
        } else {
            self.uid.clone()
        }
    }

    /// Name the assistant may address the user by, if one is known.
    pub fn preferred_name(&self) -> Option<&str> {
        if self.is_guest() {
            return None;
        }
        self.display_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
    }
}

impl Default for UserIdentity {
    fn default() -> Self {
        Self::guest()
    }
}
