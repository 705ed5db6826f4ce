//! Error message formatting with actionable suggestions.

use super::colors::ColorSupport;
use std::error::Error;
use stow_core::error::StowError;

/// Error formatter with suggestions
pub struct ErrorFormatter {
    colors: ColorSupport,
}

impl ErrorFormatter {
    /// Create a new error formatter
    pub fn new() -> Self {
        Self::with_colors(ColorSupport::detect())
    }

    pub fn with_colors(colors: ColorSupport) -> Self {
        Self { colors }
    }

    /// Format an error with its code, suggestion and source chain
    pub fn format_error(&self, error: &StowError) -> String {
        let mut output = String::new();

        output.push_str(&self.colors.red("error"));
        if let Some(code) = error.code() {
            output.push_str(&format!("[{}]", code));
        }
        output.push_str(": ");
        output.push_str(&error.to_string());

        if let Some(suggestion) = error.suggestion() {
            output.push('\n');
            output.push_str(&self.colors.dim("help"));
            output.push_str(": ");
            output.push_str(suggestion);
        }

        let mut source = error.source();
        while let Some(err) = source {
            output.push('\n');
            output.push_str(&self.colors.dim("caused by"));
            output.push_str(": ");
            output.push_str(&err.to_string());
            source = err.source();
        }

        output
    }
}

impl Default for ErrorFormatter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    fn formatter() -> ErrorFormatter {
        ErrorFormatter::with_colors(ColorSupport::disabled())
    }

    #[test]
    fn test_format_with_code_and_suggestion() {
        let error = StowError::EntryNotFound { key: "k".to_string() };
        let text = formatter().format_error(&error);
        assert!(text.starts_with("error[ENOENTRY]: "));
        assert!(text.contains("help: Run 'stow put <path> <key>'"));
    }

    #[test]
    fn test_format_source_chain() {
        let error = StowError::io(
            "Failed to stat /missing".to_string(),
            io::Error::new(io::ErrorKind::NotFound, "No such file or directory"),
        );
        let text = formatter().format_error(&error);
        assert!(text.starts_with("error[ENOENT]: IO error: Failed to stat /missing"));
        assert!(text.ends_with("caused by: No such file or directory"));
    }
}
