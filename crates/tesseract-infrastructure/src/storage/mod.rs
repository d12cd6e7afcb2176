//! File storage primitives shared by the repositories and services.

pub mod atomic_file;

pub use atomic_file::{AtomicFile, AtomicFileError, FileFormat};
