//! Purge command - delete every store

use super::open_controller;
use crate::cli::args::PurgeArgs;
use crate::config::Config;
use crate::error::SwPackResult;
use crate::ui::{self, Tone, UiContext};

/// Execute the purge command
pub async fn execute(args: PurgeArgs, config: &Config) -> SwPackResult<()> {
    let ctx = UiContext::detect().with_auto_yes(args.yes);
    let controller = open_controller(config)?;

    if !ui::confirm(
        &ctx,
        "Delete every pack store and the installed manifest?",
        false,
    )
    .await?
    {
        ui::outro(&ctx, Tone::Warn, "Purge cancelled");
        return Ok(());
    }

    let removed = controller.purge().await?;
    for name in &removed {
        ui::step(&ctx, Tone::Ok, &format!("Removed {}", name));
    }
    ui::outro(&ctx, Tone::Ok, &format!("Purged {} store(s)", removed.len()));

    Ok(())
}
