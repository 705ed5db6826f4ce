//! Utility functions and helpers.
//!
//! Common functionality used across multiple stow crates.

pub mod inspect;
pub mod path;

// Re-export commonly used utilities
pub use inspect::inspect_with_kind;
pub use path::{normalize_path, resolve_path, split_file_path};
