//! CLI argument definitions using clap derive

use crate::pack::DEFAULT_ARCHIVE_VERSIONS;
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use std::path::PathBuf;

/// swpack - versioned resource packs with offline-first routing
///
/// Builds content-addressed pack manifests, installs them into named
/// stores and answers requests from the active pack.
#[derive(Parser, Debug)]
#[command(name = "swpack")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Configuration file path
    #[arg(short, long, global = true, env = "SWPACK_CONFIG")]
    pub config: Option<PathBuf>,

    /// Skip local .swpack.toml discovery
    #[arg(long, global = true)]
    pub no_local: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Hash resources and write a pack manifest
    Build(BuildArgs),

    /// Install a pack manifest, then activate it
    Install(InstallArgs),

    /// Sweep stores no longer retained by the current pack
    Activate(ActivateArgs),

    /// Resolve a request through the router
    Route(RouteArgs),

    /// Show the current pack and its stores
    Status(StatusArgs),

    /// Delete every store, including the manifest store
    Purge(PurgeArgs),

    /// Show or edit configuration
    Config(ConfigArgs),

    /// Print shell completions
    Completions(CompletionsArgs),
}

/// Arguments for the build command
#[derive(Parser, Debug)]
pub struct BuildArgs {
    /// Files (relative to --root) or absolute http(s) URLs
    #[arg(required = true)]
    pub inputs: Vec<String>,

    /// Directory entry paths are recorded relative to
    #[arg(short, long, default_value = ".")]
    pub root: PathBuf,

    /// Output file, or a directory to write sw-pack.json into
    #[arg(short, long)]
    pub out: Option<PathBuf>,

    /// Previous packs kept in the archive
    #[arg(long, default_value_t = DEFAULT_ARCHIVE_VERSIONS)]
    pub archive_versions: u32,

    /// Optional version label carried in the manifest
    #[arg(long)]
    pub pack_version: Option<String>,
}

/// Arguments for the install command
#[derive(Parser, Debug)]
pub struct InstallArgs {
    /// Path to the pack manifest (sw-pack.json)
    pub manifest: PathBuf,

    /// Stop after install; leave stale stores in place
    #[arg(long)]
    pub no_activate: bool,
}

/// Arguments for the activate command
#[derive(Parser, Debug)]
pub struct ActivateArgs {
    /// Show what would be removed
    #[arg(long)]
    pub dry_run: bool,
}

/// Arguments for the route command
#[derive(Parser, Debug)]
pub struct RouteArgs {
    /// Absolute request URL
    pub url: String,

    /// Treat the request as a navigation
    #[arg(long)]
    pub navigate: bool,
}

/// Arguments for the status command
#[derive(Parser, Debug)]
pub struct StatusArgs {
    /// Output format
    #[arg(short, long, default_value = "table")]
    pub format: OutputFormat,
}

/// Arguments for the purge command
#[derive(Parser, Debug)]
pub struct PurgeArgs {
    /// Skip confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Subcommand for config
    #[command(subcommand)]
    pub action: Option<ConfigAction>,
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,

    /// Initialize default configuration
    Init {
        /// Overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },

    /// Set a configuration value
    Set {
        /// Configuration key (e.g., origin.base_url)
        key: String,
        /// Value to set
        value: String,
        /// Write to project-local .swpack.toml instead of global config
        #[arg(long)]
        local: bool,
    },
}

/// Arguments for the completions command
#[derive(Parser, Debug)]
pub struct CompletionsArgs {
    /// Target shell
    pub shell: Shell,
}

/// Output format for status
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table
    Table,
    /// JSON output
    Json,
    /// Simple text (one store per line)
    Plain,
}
