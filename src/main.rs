//! swpack - versioned resource packs
//!
//! CLI entry point that dispatches to subcommands.

use clap::Parser;
use console::style;
use std::process::ExitCode;
use swpack::cli::{Cli, Commands};
use swpack::config::{Config, ConfigManager};
use swpack::error::{SwPackError, SwPackResult};
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Exit status for failures worth retrying (sysexits `EX_TEMPFAIL`)
const EXIT_TEMPFAIL: u8 = 75;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            if let Some(hint) = e.hint() {
                eprintln!("{} {}", style("Hint:").yellow(), hint);
            }
            if e.is_retryable() {
                ExitCode::from(EXIT_TEMPFAIL)
            } else {
                ExitCode::FAILURE
            }
        }
    }
}

async fn run() -> SwPackResult<()> {
    let cli = Cli::parse();

    // Completions need neither config nor logging
    if let Commands::Completions(args) = cli.command {
        swpack::cli::commands::completions(args);
        return Ok(());
    }

    let config_manager = match cli.config {
        Some(ref path) => ConfigManager::with_path(path.clone()),
        None => ConfigManager::new(),
    };

    let local_config_path = if cli.no_local {
        None
    } else {
        let cwd = std::env::current_dir()
            .map_err(|e| SwPackError::io("getting current directory", e))?;
        ConfigManager::find_local_config(&cwd)
    };

    let config = config_manager
        .load_merged(local_config_path.as_deref())
        .await?;

    init_logging(cli.verbose, &config);
    swpack::ui::init_theme();

    if let Some(ref path) = local_config_path {
        debug!("Merged local config: {}", path.display());
    }

    ConfigManager::ensure_state_dirs().await?;

    match cli.command {
        Commands::Completions(_) => unreachable!("Completions handled above"),
        Commands::Build(args) => swpack::cli::commands::build(args, &config).await,
        Commands::Install(args) => swpack::cli::commands::install(args, &config).await,
        Commands::Activate(args) => swpack::cli::commands::activate(args, &config).await,
        Commands::Route(args) => swpack::cli::commands::route(args, &config).await,
        Commands::Status(args) => swpack::cli::commands::status(args, &config).await,
        Commands::Purge(args) => swpack::cli::commands::purge(args, &config).await,
        Commands::Config(args) => {
            swpack::cli::commands::config(args, &config, &config_manager).await
        }
    }
}

/// 0 = warn, 1 = info, 2+ = debug; `general.verbose` counts as one `-v`
fn init_logging(verbose: u8, config: &Config) {
    let level = verbose.max(u8::from(config.general.verbose));
    let filter = match level {
        0 => EnvFilter::new("swpack=warn"),
        1 => EnvFilter::new("swpack=info"),
        _ => EnvFilter::new("swpack=debug"),
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    if config.general.log_format == "json" {
        builder.json().init();
    } else {
        builder.without_time().init();
    }
}
