//! User service for resolving the current identity.

use super::model::UserIdentity;

/// Service for retrieving the current user.
///
/// This trait abstracts the auth collaborator: a configuration-backed
/// implementation lives in the infrastructure crate, a guest-only one here.
pub trait UserService: Send + Sync {
    /// Returns the identity of the current user.
    fn current_identity(&self) -> UserIdentity;

    /// Returns the current user's display name, or `"Guest"`.
    fn get_user_name(&self) -> String {
        self.current_identity()
            .preferred_name()
            .unwrap_or("Guest")
            .to_string()
    }
}

/// Default implementation that always returns a guest identity.
///
/// # Example
///
/// ```
/// use tesseract_core::user::{UserService, DefaultUserService};
///
/// let service = DefaultUserService::default();
/// assert!(service.current_identity().is_guest());
/// assert_eq!(service.get_user_name(), "Guest");
/// ```
#[derive(Debug, Clone, Default)]
pub struct DefaultUserService;

impl UserService for DefaultUserService {
    fn current_identity(&self) -> UserIdentity {
        UserIdentity::guest()
    }
}
