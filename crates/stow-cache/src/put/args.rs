//! Validation of untyped `(path, key[, options])` arguments
//!
//! Checks run in a fixed order (count, path, key, options) and stop at the
//! first failure, before any filesystem or cache access.

use serde_json::Value;
use stow_core::error::StowError;
use stow_core::utils::inspect_with_kind;

use crate::cas::WriteOptions;
use crate::CacheResult;

/// A validated request to store one file under a key
#[derive(Debug, Clone, PartialEq)]
pub struct FileRequest {
    /// Path as given by the caller
    pub path: String,
    /// Cache key
    pub key: String,
    /// Options forwarded to the cache writer
    pub options: WriteOptions,
}

impl FileRequest {
    /// Validate typed arguments
    pub fn new(path: &str, key: &str, options: WriteOptions) -> CacheResult<Self> {
        validate_path(path)?;
        validate_key(key)?;
        Ok(Self {
            path: path.to_string(),
            key: key.to_string(),
            options,
        })
    }

    /// Validate untyped arguments
    pub fn from_args(args: &[Value]) -> CacheResult<Self> {
        if args.len() != 2 && args.len() != 3 {
            return Err(StowError::ArgumentCount { got: args.len() });
        }

        let path = match &args[0] {
            Value::String(path) => path,
            other => {
                return Err(StowError::InvalidPathType {
                    value: inspect_with_kind(other),
                })
            }
        };
        validate_path(path)?;

        let key = match &args[1] {
            Value::String(key) => key,
            other => {
                return Err(StowError::InvalidKeyType {
                    value: inspect_with_kind(other),
                })
            }
        };
        validate_key(key)?;

        let options = match args.get(2) {
            None => WriteOptions::default(),
            Some(value) => parse_options(value)?,
        };

        Ok(Self {
            path: path.clone(),
            key: key.clone(),
            options,
        })
    }
}

fn validate_path(path: &str) -> CacheResult<()> {
    if path.is_empty() {
        return Err(StowError::EmptyPath);
    }
    Ok(())
}

fn validate_key(key: &str) -> CacheResult<()> {
    if key.is_empty() {
        return Err(StowError::EmptyKey);
    }
    Ok(())
}

/// Accept only a plain JSON object, then read the recognized fields from it
fn parse_options(value: &Value) -> CacheResult<WriteOptions> {
    if !value.is_object() {
        return Err(StowError::InvalidOptions {
            value: inspect_with_kind(value),
        });
    }

    serde_json::from_value(value.clone()).map_err(|e| StowError::InvalidOptionValue {
        reason: e.to_string(),
    })
}
