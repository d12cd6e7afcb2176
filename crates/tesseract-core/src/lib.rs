pub mod completion;
pub mod config;
pub mod error;
pub mod secret;
pub mod session;
pub mod user;

// Re-export common error type
pub use error::TesseractError;
