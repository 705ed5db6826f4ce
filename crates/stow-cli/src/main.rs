//! # stow-cli
//!
//! Store files as archived entries in a local content-addressable cache.
//!
//! This is the main entry point for the stow CLI tool. It handles command parsing,
//! sets up logging, and dispatches to the appropriate command handlers.

use camino::Utf8PathBuf;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use stow_core::error::{StowError, StowResult};
use tracing::debug;

mod commands;
mod output;

use commands::CommandContext;
use output::errors::ErrorFormatter;

/// Store files in a local content-addressable cache
#[derive(Parser)]
#[command(name = "stow", version, about = "Store files in a content-addressable cache")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Cache directory (overrides STOW_CACHE_DIR and ~/.stow/config.toml)
    #[arg(long, global = true, value_name = "DIR")]
    pub cache_dir: Option<Utf8PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Archive a file and store it under a key
    Put {
        /// File to store
        path: String,
        /// Cache key
        key: String,
        /// Write options as a JSON object, e.g. '{"metadata":{"a":1}}'
        options: Option<String>,
    },
    /// Show the entry stored under a key
    Info {
        key: String,
    },
    /// Extract the file stored under a key
    Restore {
        key: String,
        /// Directory to extract into (defaults to the current directory)
        #[arg(long, value_name = "DIR")]
        cwd: Option<PathBuf>,
    },
    /// List cached keys
    Ls,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    setup_logging(cli.verbose);

    debug!("Starting stow v{}", env!("CARGO_PKG_VERSION"));

    match run_cli(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("{}", ErrorFormatter::new().format_error(&error));
            ExitCode::FAILURE
        }
    }
}

fn run_cli(cli: Cli) -> StowResult<()> {
    // Create Tokio runtime for async operations
    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| StowError::io("Failed to create async runtime".to_string(), e))?;

    rt.block_on(async {
        let ctx = CommandContext::new(cli.cache_dir).await?;
        commands::dispatch_command(cli.command, &ctx).await
    })
}

fn setup_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "warn" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(format!(
            "stow={level},stow_cache={level},stow_config={level}"
        ))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
