//! Install command - install a pack, then activate it

use super::{activate::report_activation, open_controller};
use crate::cli::args::InstallArgs;
use crate::config::Config;
use crate::error::{SwPackError, SwPackResult};
use crate::lifecycle::EntryOutcome;
use crate::pack::Manifest;
use crate::ui::{self, InstallBar, Tone, UiContext};
use tokio::fs;

/// Execute the install command
pub async fn execute(args: InstallArgs, config: &Config) -> SwPackResult<()> {
    let ctx = UiContext::detect();

    if !args.manifest.exists() {
        return Err(SwPackError::PathNotFound(args.manifest));
    }
    let content = fs::read_to_string(&args.manifest)
        .await
        .map_err(|e| SwPackError::io(format!("reading {}", args.manifest.display()), e))?;
    let incoming = Manifest::from_json(&content)?;

    let controller = open_controller(config)?;
    let label = ui::short_fingerprint(incoming.fingerprint()).to_string();

    ui::intro(&ctx, &format!("Installing pack {}", label));

    let bar = InstallBar::new(&ctx, &label, incoming.entries().len());
    let progress = |outcome: &EntryOutcome| bar.on_entry(outcome);
    let result = controller.install_with_progress(&incoming, &progress).await;
    bar.finish();

    let report = match result {
        Ok(report) => report,
        Err(e) => {
            if let SwPackError::InstallAborted { failed, total, .. } = &e {
                ui::step_with(
                    &ctx,
                    Tone::Fail,
                    "Install aborted",
                    &format!("{} of {} entries failed", failed, total),
                );
            }
            return Err(e);
        }
    };

    if report.unchanged {
        ui::step(&ctx, Tone::Info, "Pack already current; manifest re-persisted");
    } else {
        ui::step_with(
            &ctx,
            Tone::Ok,
            "Installed",
            &format!(
                "{} reused, {} fetched",
                report.reused,
                report.fetched + report.refetched
            ),
        );
        if report.refetched > 0 {
            let message = format!(
                "{} entries were missing from the previous pack and fetched again",
                report.refetched
            );
            ui::step(&ctx, Tone::Warn, &message);
        }
    }
    if let Some(previous) = report.previous.as_deref().filter(|_| !report.unchanged) {
        ui::key_value(&ctx, "Previous", ui::short_fingerprint(previous));
    }
    ui::key_value(&ctx, "Archived", &report.archived.len().to_string());

    if args.no_activate {
        ui::outro(&ctx, Tone::Ok, "Install complete (not activated)");
        return Ok(());
    }

    let activation = controller.on_activate().await?;
    report_activation(&ctx, &activation);
    ui::outro(&ctx, Tone::Ok, &format!("Pack {} is active", label));

    Ok(())
}
