//! Configuration for stow
//!
//! This crate parses `~/.stow/config.toml` and resolves where the
//! content-addressable cache lives, layering CLI flags, the
//! `STOW_CACHE_DIR` environment variable, the config file and the
//! built-in default.

pub mod merge;
pub mod toml;

// Re-export main types
pub use crate::merge::{ConfigLoader, ConfigSource, ResolvedConfig, CACHE_DIR_ENV};
pub use crate::toml::StowToml;

use stow_core::error::StowError;

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, StowError>;
