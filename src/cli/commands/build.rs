//! Build command - hash resources into a pack manifest

use crate::cli::args::BuildArgs;
use crate::config::Config;
use crate::error::SwPackResult;
use crate::fetch::HttpFetcher;
use crate::pack::ManifestBuilder;
use crate::ui::{self, TaskSpinner, UiContext};
use std::time::Duration;

/// Execute the build command
pub async fn execute(args: BuildArgs, config: &Config) -> SwPackResult<()> {
    let ctx = UiContext::detect();

    let builder = ManifestBuilder::new(&args.root)
        .archive_versions(args.archive_versions)
        .version(args.pack_version);

    // Only absolute URLs are fetched at build time; the origin is unused
    let fetcher = HttpFetcher::new(
        &config.origin.base_url,
        Duration::from_secs(config.fetch.timeout_secs),
    )?;

    let mut spinner = TaskSpinner::new(&ctx);
    spinner.start(&format!("Hashing {} inputs...", args.inputs.len()));

    let manifest = match builder.build(&args.inputs, &fetcher).await {
        Ok(manifest) => manifest,
        Err(e) => {
            spinner.stop_error("Build failed");
            return Err(e);
        }
    };
    let path = builder.write(&manifest, args.out.as_deref()).await?;

    spinner.stop(&format!(
        "Built pack {}",
        ui::short_fingerprint(manifest.fingerprint())
    ));
    ui::key_value(&ctx, "Entries", &manifest.entries().len().to_string());
    ui::key_value(&ctx, "Fingerprint", manifest.fingerprint());
    if let Some(version) = manifest.version() {
        ui::key_value(&ctx, "Version", version);
    }
    ui::key_value(&ctx, "Written", &path.display().to_string());

    Ok(())
}
