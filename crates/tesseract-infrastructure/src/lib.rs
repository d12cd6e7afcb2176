pub mod config_service;
pub mod json_session_repository;
pub mod paths;
pub mod secret_service;
pub mod storage;
pub mod user_service;

pub use crate::config_service::ConfigService;
pub use crate::json_session_repository::JsonSessionRepository;
pub use crate::paths::{PathError, TesseractPaths};
pub use crate::secret_service::SecretServiceImpl;
pub use crate::user_service::ConfigBasedUserService;
