//! Configuration-based user service implementation.
//!
//! The auth collaborator writes the identity shape into the `[user]` section
//! of config.toml; this service reads it back.

use crate::config_service::ConfigService;
use tesseract_core::user::{UserIdentity, UserService};

/// User service that reads the identity from config.toml.
///
/// # Example
///
/// ```
/// use tesseract_infrastructure::{ConfigBasedUserService, ConfigService};
/// use tesseract_core::user::UserService;
///
/// let dir = tempfile::TempDir::new().unwrap();
/// let service = ConfigBasedUserService::new(ConfigService::new(dir.path().join("config.toml")));
/// assert_eq!(service.get_user_name(), "Guest");
/// ```
#[derive(Debug, Clone)]
pub struct ConfigBasedUserService {
    config: ConfigService,
}

impl ConfigBasedUserService {
    pub fn new(config: ConfigService) -> Self {
        Self { config }
    }
}

impl UserService for ConfigBasedUserService {
    fn current_identity(&self) -> UserIdentity {
        self.config.get_config().user
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_signed_in_user_from_config() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[user]\nuid = \"u-7\"\ndisplay_name = \"Vinit\"\nis_anonymous = false\n",
        )
        .unwrap();

        let service = ConfigBasedUserService::new(ConfigService::new(&path));

        assert_eq!(service.current_identity().storage_key(), "u-7");
        assert_eq!(service.get_user_name(), "Vinit");
    }

    #[test]
    fn test_default_config_is_guest() {
        let dir = TempDir::new().unwrap();
        let service =
            ConfigBasedUserService::new(ConfigService::new(dir.path().join("config.toml")));

        assert!(service.current_identity().is_guest());
    }
}
