//! `stow info <KEY>`

use stow_core::error::{StowError, StowResult};

use super::CommandContext;

pub async fn execute(key: String, ctx: &CommandContext) -> StowResult<()> {
    let entry = ctx
        .store
        .info(&key)
        .ok_or(StowError::EntryNotFound { key })?;
    ctx.output.json(&entry)
}
