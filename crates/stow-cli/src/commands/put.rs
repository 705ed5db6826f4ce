//! `stow put <PATH> <KEY> [OPTIONS_JSON]`

use serde_json::Value;
use stow_cache::{store_request, ArchiveOptions, CacheEntry, FileRequest};
use stow_core::error::{StowError, StowResult};

use super::CommandContext;

pub async fn execute(
    path: String,
    key: String,
    options: Option<String>,
    ctx: &CommandContext,
) -> StowResult<()> {
    let entry = store(path, key, options, ctx).await?;
    ctx.output.json(&entry)?;
    ctx.output
        .success(&format!("Stored '{}' ({} bytes)", entry.key, entry.size));
    Ok(())
}

/// Parse the CLI arguments the same way library callers' untyped arguments are
pub(crate) async fn store(
    path: String,
    key: String,
    options: Option<String>,
    ctx: &CommandContext,
) -> StowResult<CacheEntry> {
    let mut args = vec![Value::String(path), Value::String(key)];
    if let Some(raw) = options {
        args.push(parse_options_json(&raw)?);
    }

    let request = FileRequest::from_args(&args)?;
    let archive = ArchiveOptions::default().with_compression_level(ctx.config.compression_level);
    store_request(&ctx.store, request, archive).await
}

fn parse_options_json(raw: &str) -> StowResult<Value> {
    serde_json::from_str(raw).map_err(|e| StowError::InvalidOptionValue {
        reason: format!("options are not valid JSON: {}", e),
    })
}
