//! Configuration layering, fallback logic, and environment overrides

use camino::Utf8PathBuf;
use stow_core::error::StowError;
use tracing::debug;

use crate::toml::{self as config_file, StowToml};
use crate::ConfigResult;

/// Environment variable selecting the cache root
pub const CACHE_DIR_ENV: &str = "STOW_CACHE_DIR";

/// Gzip level used when nothing else is configured
pub const DEFAULT_COMPRESSION_LEVEL: u32 = 6;

/// Where a resolved setting came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// CLI flag
    CommandLine,
    /// Environment variable
    Environment(String),
    /// Global config file
    ConfigFile(Utf8PathBuf),
    /// Built-in default
    Default,
}

/// Fully layered configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedConfig {
    /// Root directory of the content-addressable cache
    pub cache_dir: Utf8PathBuf,
    /// Which layer provided `cache_dir`
    pub cache_dir_source: ConfigSource,
    /// Gzip level for new archives
    pub compression_level: u32,
}

/// Main configuration loading interface
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    /// Home directory used for `~/.stow`
    home_dir: Option<Utf8PathBuf>,
}

impl ConfigLoader {
    /// Create a loader rooted at the user's home directory
    pub fn new() -> Self {
        let home_dir = dirs::home_dir().and_then(|home| Utf8PathBuf::from_path_buf(home).ok());
        Self { home_dir }
    }

    /// Create a loader rooted at an explicit home directory
    pub fn with_home(home_dir: Utf8PathBuf) -> Self {
        Self {
            home_dir: Some(home_dir),
        }
    }

    /// `~/.stow`
    fn stow_home(&self) -> ConfigResult<Utf8PathBuf> {
        self.home_dir
            .as_ref()
            .map(|home| home.join(".stow"))
            .ok_or_else(|| StowError::ConfigValidation {
                field: "home_dir".to_string(),
                reason: "Could not determine a UTF-8 home directory".to_string(),
            })
    }

    /// Path of the global config file
    pub fn global_config_path(&self) -> ConfigResult<Utf8PathBuf> {
        Ok(self.stow_home()?.join("config.toml"))
    }

    /// Load global configuration
    pub async fn load_global_config(&self) -> ConfigResult<Option<(StowToml, Utf8PathBuf)>> {
        let path = match self.global_config_path() {
            Ok(path) => path,
            // Without a home directory there is no global config to read
            Err(_) => return Ok(None),
        };

        if !path.exists() {
            return Ok(None);
        }

        let config = config_file::load_from_file(&path).await?;
        Ok(Some((config, path)))
    }

    /// Resolve configuration using the process environment
    pub async fn resolve(&self, cli_cache_dir: Option<Utf8PathBuf>) -> ConfigResult<ResolvedConfig> {
        let env_cache_dir = std::env::var(CACHE_DIR_ENV).ok();
        self.resolve_with_env(cli_cache_dir, env_cache_dir).await
    }

    /// Resolve configuration with an explicit environment override
    ///
    /// Precedence: CLI flag, environment, config file, `~/.stow/cache`.
    pub async fn resolve_with_env(
        &self,
        cli_cache_dir: Option<Utf8PathBuf>,
        env_cache_dir: Option<String>,
    ) -> ConfigResult<ResolvedConfig> {
        let global = self.load_global_config().await?;
        let compression_level = global
            .as_ref()
            .and_then(|(config, _)| config.compression_level)
            .unwrap_or(DEFAULT_COMPRESSION_LEVEL);

        let (cache_dir, cache_dir_source) = if let Some(dir) = cli_cache_dir {
            (dir, ConfigSource::CommandLine)
        } else if let Some(dir) = env_cache_dir.filter(|dir| !dir.is_empty()) {
            (Utf8PathBuf::from(dir), ConfigSource::Environment(CACHE_DIR_ENV.to_string()))
        } else if let Some((dir, path)) = global
            .as_ref()
            .and_then(|(config, path)| config.cache_dir.clone().map(|dir| (dir, path.clone())))
        {
            (dir, ConfigSource::ConfigFile(path))
        } else {
            (self.stow_home()?.join("cache"), ConfigSource::Default)
        };

        debug!("Resolved cache directory {} from {:?}", cache_dir, cache_dir_source);

        Ok(ResolvedConfig {
            cache_dir,
            cache_dir_source,
            compression_level,
        })
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}
