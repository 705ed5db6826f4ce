//! Terminal output formatting.
//!
//! Entries are printed to stdout as pretty JSON so they can be piped into
//! other tools; status lines go to stderr.

pub mod colors;
pub mod errors;

use serde::Serialize;
use stow_core::error::{StowError, StowResult};

/// Output handler for consistent terminal formatting
pub struct OutputHandler {
    colors: colors::ColorSupport,
}

impl OutputHandler {
    /// Create a new output handler
    pub fn new() -> Self {
        Self {
            colors: colors::ColorSupport::detect(),
        }
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        eprintln!("{} {}", self.colors.green("✓"), message);
    }

    /// Print a value as pretty JSON on stdout
    pub fn json<T: Serialize>(&self, value: &T) -> StowResult<()> {
        println!("{}", render_json(value)?);
        Ok(())
    }

    /// Print one line on stdout
    pub fn line(&self, message: &str) {
        println!("{}", message);
    }
}

impl Default for OutputHandler {
    fn default() -> Self {
        Self::new()
    }
}

pub fn render_json<T: Serialize>(value: &T) -> StowResult<String> {
    serde_json::to_string_pretty(value).map_err(|e| {
        StowError::io(
            "Failed to render JSON".to_string(),
            std::io::Error::new(std::io::ErrorKind::InvalidData, e),
        )
    })
}
