//! Command implementations for the stow CLI.
//!
//! Each command lives in its own module and receives a shared
//! `CommandContext` holding the opened cache.

use camino::Utf8PathBuf;
use std::path::PathBuf;
use stow_cache::CasStore;
use stow_config::{ConfigLoader, ResolvedConfig};
use stow_core::error::{StowError, StowResult};
use tracing::debug;

use crate::output::OutputHandler;
use crate::Commands;

pub mod info;
pub mod put;
pub mod restore;


/// Shared state for every command
pub struct CommandContext {
    /// Directory the command was invoked from
    pub cwd: PathBuf,
    /// Layered configuration the store was opened with
    pub config: ResolvedConfig,
    pub store: CasStore,
    pub output: OutputHandler,
}

impl CommandContext {
    /// Resolve configuration and open the cache
    pub async fn new(cli_cache_dir: Option<Utf8PathBuf>) -> StowResult<Self> {
        let cwd = std::env::current_dir()
            .map_err(|e| StowError::io("Failed to get current directory".to_string(), e))?;
        let config = ConfigLoader::new().resolve(cli_cache_dir).await?;

        debug!(
            "Using cache at {} (from {:?})",
            config.cache_dir, config.cache_dir_source
        );

        let store = CasStore::open(&config)?;
        Ok(Self {
            cwd,
            config,
            store,
            output: OutputHandler::new(),
        })
    }
}

/// Dispatch a parsed command to its implementation
pub async fn dispatch_command(command: Commands, ctx: &CommandContext) -> StowResult<()> {
    match command {
        Commands::Put { path, key, options } => {
            debug!("Executing put command: {} -> {}", path, key);
            put::execute(path, key, options, ctx).await
        }
        Commands::Info { key } => {
            debug!("Executing info command: {}", key);
            info::execute(key, ctx).await
        }
        Commands::Restore { key, cwd } => {
            debug!("Executing restore command: {}", key);
            restore::execute(key, cwd, ctx).await
        }
        Commands::Ls => {
            for key in ctx.store.keys() {
                ctx.output.line(&key);
            }
            Ok(())
        }
    }
}
