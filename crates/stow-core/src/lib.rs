//! # stow-core
//!
//! Core types and utilities shared across all stow crates.
//!
//! This crate provides:
//! - StowError enum for unified error handling
//! - Path resolution against a working directory
//! - Value inspection used to build argument validation messages
//!
//! ## Architecture
//!
//! The crate is organized into modules:
//! - `error`: Error types and result aliases
//! - `utils`: Utility functions and helpers

pub mod error;
pub mod utils;

// Re-export commonly used types
pub use error::{StowError, StowResult};
