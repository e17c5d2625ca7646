//! Activate command - sweep stale stores and snapshots

use super::open_controller;
use crate::cli::args::ActivateArgs;
use crate::config::Config;
use crate::error::{SwPackError, SwPackResult};
use crate::lifecycle::ActivationReport;
use crate::ui::{self, Tone, UiContext};
use console::style;

/// Execute the activate command
pub async fn execute(args: ActivateArgs, config: &Config) -> SwPackResult<()> {
    let ctx = UiContext::detect();
    let controller = open_controller(config)?;

    let Some(current) = controller.current().await? else {
        return Err(SwPackError::NoCurrentPack);
    };

    if args.dry_run {
        let plan = controller.preview_activation().await?;
        if plan.is_empty() {
            println!("Nothing to sweep.");
            return Ok(());
        }
        println!("Would remove:");
        for name in &plan.stores {
            println!("  {} {}", style("store").dim(), name);
        }
        for key in &plan.snapshots {
            println!("  {} {}", style("snapshot").dim(), key);
        }
        return Ok(());
    }

    let report = controller.on_activate().await?;
    report_activation(&ctx, &report);
    let active = format!("Pack {} is active", ui::short_fingerprint(current.fingerprint()));
    ui::outro(&ctx, Tone::Ok, &active);

    Ok(())
}

/// Print the outcome of an activation
pub(crate) fn report_activation(ctx: &UiContext, report: &ActivationReport) {
    for fingerprint in &report.dropped {
        ui::step_with(
            ctx,
            Tone::Info,
            &format!("Dropped archived pack {}", ui::short_fingerprint(fingerprint)),
            "over size ceiling",
        );
    }

    let sweep = &report.sweep;
    if sweep.removed_stores.is_empty() && sweep.removed_snapshots.is_empty() {
        ui::step(ctx, Tone::Ok, "No stale stores");
    } else {
        ui::step_with(
            ctx,
            Tone::Ok,
            "Swept stale data",
            &format!(
                "{} stores, {} snapshots",
                sweep.removed_stores.len(),
                sweep.removed_snapshots.len()
            ),
        );
    }

    for failure in &sweep.failures {
        ui::step_with(
            ctx,
            Tone::Warn,
            &format!("Could not remove {}", failure.target),
            &failure.reason,
        );
    }
}
