//! config.toml parsing

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};
use stow_core::error::StowError;

use crate::ConfigResult;

/// Highest gzip level accepted by the archiver
pub const MAX_COMPRESSION_LEVEL: u32 = 9;

/// Contents of `~/.stow/config.toml`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct StowToml {
    /// Root directory of the content-addressable cache
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_dir: Option<Utf8PathBuf>,

    /// Gzip level used when archiving files (0-9)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compression_level: Option<u32>,
}

/// Parse config.toml content
pub fn parse_stow_toml(content: &str, origin: &str) -> ConfigResult<StowToml> {
    // toml_edit reports syntax errors with line and column
    content
        .parse::<toml_edit::DocumentMut>()
        .map_err(|e| StowError::ConfigParse {
            path: origin.to_string(),
            message: format!("TOML syntax error: {}", e),
        })?;

    let config: StowToml = ::toml::from_str(content).map_err(|e| StowError::ConfigParse {
        path: origin.to_string(),
        message: e.message().to_string(),
    })?;

    validate_config(&config)?;

    Ok(config)
}

/// Validate field values that serde cannot express
pub fn validate_config(config: &StowToml) -> ConfigResult<()> {
    if let Some(level) = config.compression_level {
        if level > MAX_COMPRESSION_LEVEL {
            return Err(StowError::ConfigValidation {
                field: "compression-level".to_string(),
                reason: format!("must be between 0 and {}, got {}", MAX_COMPRESSION_LEVEL, level),
            });
        }
    }

    if let Some(dir) = &config.cache_dir {
        if dir.as_str().is_empty() {
            return Err(StowError::ConfigValidation {
                field: "cache-dir".to_string(),
                reason: "must not be empty".to_string(),
            });
        }
    }

    Ok(())
}

/// Load config.toml from disk
pub async fn load_from_file(path: &Utf8Path) -> ConfigResult<StowToml> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| StowError::io(format!("Failed to read {}", path), e))?;

    parse_stow_toml(&content, path.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_empty_config() {
        let config = parse_stow_toml("", "config.toml").unwrap();
        assert_eq!(config, StowToml::default());
    }

    #[test]
    fn test_parse_full_config() {
        let content = r#"
cache-dir = "/var/cache/stow"
compression-level = 9
"#;
        let config = parse_stow_toml(content, "config.toml").unwrap();
        assert_eq!(config.cache_dir, Some(Utf8PathBuf::from("/var/cache/stow")));
        assert_eq!(config.compression_level, Some(9));
    }

    #[test]
    fn test_syntax_error() {
        let err = parse_stow_toml("cache-dir = ", "config.toml").unwrap_err();
        assert!(matches!(err, StowError::ConfigParse { .. }));
        assert!(err.to_string().contains("config.toml"));
    }

    #[test]
    fn test_invalid_compression_level() {
        let err = parse_stow_toml("compression-level = 12", "config.toml").unwrap_err();
        match err {
            StowError::ConfigValidation { field, .. } => assert_eq!(field, "compression-level"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_wrong_type() {
        let err = parse_stow_toml("compression-level = \"fast\"", "config.toml").unwrap_err();
        assert!(matches!(err, StowError::ConfigParse { .. }));
    }
}
