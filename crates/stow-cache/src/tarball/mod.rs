//! Tarball creation and extraction
//!
//! Archives hold entries named relative to a base directory, the way
//! `tar -C <dir> -czf - <entries>` would lay them out.

pub mod create;
pub mod extract;

// Re-export main functions
pub use create::{create_tarball, create_tarball_bytes, ArchiveOptions};
pub use extract::extract_tarball;
