//! Status command - current pack, archive and stores

use super::open_controller;
use crate::audit::AuditLog;
use crate::cli::args::{OutputFormat, StatusArgs};
use crate::config::Config;
use crate::error::SwPackResult;
use crate::lifecycle::{StoreInfo, StoreRole};
use crate::pack::Manifest;
use crate::ui::{self, Tone, UiContext};
use console::style;
use serde::Serialize;

/// Execute the status command
pub async fn execute(args: StatusArgs, config: &Config) -> SwPackResult<()> {
    let controller = open_controller(config)?;
    let current = controller.current().await?;
    let stores = controller.inventory().await?;

    match args.format {
        OutputFormat::Table => print_table(current.as_deref(), &stores, config),
        OutputFormat::Json => print_json(current.as_deref(), &stores)?,
        OutputFormat::Plain => print_plain(&stores),
    }

    Ok(())
}

fn print_table(current: Option<&Manifest>, stores: &[StoreInfo], config: &Config) {
    let ctx = UiContext::detect();

    match current {
        Some(manifest) => {
            ui::key_value(&ctx, "Current", manifest.fingerprint());
            if let Some(version) = manifest.version() {
                ui::key_value(&ctx, "Version", version);
            }
            ui::key_value(&ctx, "Entries", &manifest.entries().len().to_string());
            ui::key_value(
                &ctx,
                "Archive",
                &format!(
                    "{} of {}",
                    manifest.archived().len(),
                    manifest.archive_versions()
                ),
            );
        }
        None => ui::step_with(
            &ctx,
            Tone::Warn,
            "No pack installed",
            "swpack install <path/to/sw-pack.json>",
        ),
    }
    ui::key_value(&ctx, "Origin", &config.origin.base_url);
    let journal = AuditLog::new(config);
    if journal.is_enabled() {
        ui::key_value(&ctx, "Journal", &journal.path().display().to_string());
    }
    println!();

    if stores.is_empty() {
        println!("No stores found.");
        return;
    }

    println!("{:<80} {:<10} {:<12} {:>10}", "STORE", "ROLE", "STATE", "SIZE");
    println!("{}", "-".repeat(115));

    let mut total = 0;
    for store in stores {
        let role = match store.role {
            StoreRole::Current => style("current").green().to_string(),
            StoreRole::Archived => style("archived").cyan().to_string(),
            StoreRole::Internal => style("internal").dim().to_string(),
            StoreRole::Stale => style("stale").yellow().to_string(),
        };
        let state = store
            .state
            .map(|s| s.to_string())
            .unwrap_or_else(|| "-".to_string());
        total += store.size_bytes;

        println!(
            "{:<80} {:<10} {:<12} {:>10}",
            store.name,
            role,
            state,
            ui::format_bytes(store.size_bytes)
        );
    }

    println!();
    println!(
        "Total: {} store(s), {}",
        stores.len(),
        ui::format_bytes(total)
    );
}

fn print_json(current: Option<&Manifest>, stores: &[StoreInfo]) -> SwPackResult<()> {
    #[derive(Serialize)]
    struct StatusJson<'a> {
        current: Option<&'a str>,
        version: Option<&'a str>,
        archived: &'a [String],
        stores: &'a [StoreInfo],
    }

    let status = StatusJson {
        current: current.map(|m| m.fingerprint()),
        version: current.and_then(|m| m.version()),
        archived: current.map(|m| m.archived()).unwrap_or_default(),
        stores,
    };

    println!("{}", serde_json::to_string_pretty(&status)?);
    Ok(())
}

fn print_plain(stores: &[StoreInfo]) {
    for store in stores {
        println!("{}", store.name);
    }
}
