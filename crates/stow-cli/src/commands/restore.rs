//! `stow restore <KEY> [--cwd DIR]`
//!
//! Extracts the archived file into the target directory, creating it when
//! missing. The content's integrity is checked before anything is written.

use std::path::PathBuf;
use stow_core::error::StowResult;
use stow_core::utils::resolve_path;

use super::CommandContext;

pub async fn execute(key: String, cwd: Option<PathBuf>, ctx: &CommandContext) -> StowResult<()> {
    let dest = target_dir(cwd, ctx);
    let entry = ctx.store.restore(&key, &dest).await?;
    ctx.output.success(&format!(
        "Restored '{}' into {}",
        entry.key,
        dest.display()
    ));
    Ok(())
}

fn target_dir(cwd: Option<PathBuf>, ctx: &CommandContext) -> PathBuf {
    match cwd {
        Some(dir) => resolve_path(&ctx.cwd, &dir),
        None => ctx.cwd.clone(),
    }
}
