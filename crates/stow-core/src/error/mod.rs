//! Error types and result aliases for stow operations.
//!
//! Provides a unified error type that covers all possible error conditions
//! across the stow crates with actionable error messages.

use thiserror::Error;

/// Code attached to argument type failures
pub const ERR_INVALID_ARG_TYPE: &str = "ERR_INVALID_ARG_TYPE";
/// Code attached to argument value failures
pub const ERR_INVALID_ARG_VALUE: &str = "ERR_INVALID_ARG_VALUE";

/// Unified error type for all stow operations
#[derive(Error, Debug)]
pub enum StowError {
    // Argument errors
    #[error("Expected 2 or 3 arguments (<string>, <string>[, <Object>]), but got {} arguments.", describe_count(.got))]
    ArgumentCount { got: usize },

    #[error("Expected a file path (<string>) to save its contents to the cache folder, but got a non-string value {value}.")]
    InvalidPathType { value: String },

    #[error("Expected a file path to save its contents to the cache folder, but got '' (empty string).")]
    EmptyPath,

    #[error("Expected a cache key (<string>) used to save a file, but got a non-string value {value}.")]
    InvalidKeyType { value: String },

    #[error("Expected a cache key used to save a file, but got '' (empty string).")]
    EmptyKey,

    #[error("Expected an <Object> to set cache write options, but got {value}.")]
    InvalidOptions { value: String },

    #[error("Invalid cache write options: {reason}")]
    InvalidOptionValue { reason: String },

    // Filesystem errors
    #[error("Expected a file path to save it as a cache entry, but the entry at {path}{} is not a file.", resolved_suffix(.resolved))]
    NotAFile {
        path: String,
        resolved: Option<String>,
    },

    #[error("Cannot archive '{entry}': {reason}")]
    InvalidArchiveEntry { entry: String, reason: String },

    // Cache errors
    #[error("No cache entry found for key '{key}'")]
    EntryNotFound { key: String },

    #[error("Integrity check failed for {subject}: expected {expected}, got {actual}")]
    IntegrityFailure {
        subject: String,
        expected: String,
        actual: String,
    },

    #[error("Size check failed for {key}: expected {expected} bytes, got {actual} bytes")]
    SizeMismatch {
        key: String,
        expected: u64,
        actual: u64,
    },

    #[error("Cache write for '{key}' was dropped before its integrity was finalized")]
    WriteAborted { key: String },

    // Config errors
    #[error("Failed to parse {path}: {message}")]
    ConfigParse { path: String, message: String },

    #[error("Configuration field '{field}' is invalid: {reason}")]
    ConfigValidation { field: String, reason: String },

    // IO errors
    #[error("IO error: {message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },
}

/// Result type alias for stow operations
pub type StowResult<T> = Result<T, StowError>;

fn describe_count(count: &usize) -> String {
    if *count == 0 {
        "no".to_string()
    } else {
        count.to_string()
    }
}

fn resolved_suffix(resolved: &Option<String>) -> String {
    match resolved {
        Some(absolute) => format!(" ({})", absolute),
        None => String::new(),
    }
}

impl StowError {
    /// Create an IO error from std::io::Error
    pub fn io(message: String, source: std::io::Error) -> Self {
        Self::Io { message, source }
    }

    /// Machine-readable code for the error, if it carries one
    pub fn code(&self) -> Option<&'static str> {
        match self {
            StowError::InvalidPathType { .. } | StowError::InvalidOptions { .. } => {
                Some(ERR_INVALID_ARG_TYPE)
            },
            StowError::EmptyPath
            | StowError::InvalidKeyType { .. }
            | StowError::EmptyKey
            | StowError::InvalidOptionValue { .. } => Some(ERR_INVALID_ARG_VALUE),
            StowError::EntryNotFound { .. } => Some("ENOENTRY"),
            StowError::IntegrityFailure { .. } => Some("EINTEGRITY"),
            StowError::SizeMismatch { .. } => Some("EBADSIZE"),
            StowError::Io { source, .. } => match source.kind() {
                std::io::ErrorKind::NotFound => Some("ENOENT"),
                std::io::ErrorKind::PermissionDenied => Some("EACCES"),
                std::io::ErrorKind::AlreadyExists => Some("EEXIST"),
                _ => None,
            },
            _ => None,
        }
    }

    /// Check if this error was raised by argument validation, before any I/O
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            StowError::ArgumentCount { .. }
                | StowError::InvalidPathType { .. }
                | StowError::EmptyPath
                | StowError::InvalidKeyType { .. }
                | StowError::EmptyKey
                | StowError::InvalidOptions { .. }
                | StowError::InvalidOptionValue { .. }
        )
    }

    /// Check if this error means the target path does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(self, StowError::Io { source, .. } if source.kind() == std::io::ErrorKind::NotFound)
    }

    /// Get a user-friendly suggestion for fixing this error
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            StowError::NotAFile { .. } => {
                Some("Only regular files can be stored; archive directories with a tar tool first")
            },
            StowError::EntryNotFound { .. } => Some("Run 'stow put <path> <key>' to create the entry"),
            StowError::IntegrityFailure { .. } => {
                Some("The cached content is corrupted or the expected integrity is wrong; store it again")
            },
            StowError::InvalidOptions { .. } | StowError::InvalidOptionValue { .. } => {
                Some("Pass options as a JSON object, e.g. '{\"metadata\":{\"a\":1}}'")
            },
            StowError::ConfigParse { .. } | StowError::ConfigValidation { .. } => {
                Some("Check ~/.stow/config.toml or the STOW_CACHE_DIR environment variable")
            },
            _ => None,
        }
    }
}
