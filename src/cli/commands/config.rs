//! Config command - show or edit configuration

use crate::cli::args::{ConfigAction, ConfigArgs};
use crate::config::{Config, ConfigManager, LOCAL_CONFIG_FILE};
use crate::error::{SwPackError, SwPackResult};
use crate::fetch::parse_origin;
use crate::lifecycle::NavigationRules;
use crate::ui::{self, Tone, UiContext};
use std::path::PathBuf;
use tokio::fs;

/// Keys accepted by `config set`
const VALID_KEYS: &[&str] = &[
    "general.verbose",
    "general.log_format",
    "general.audit_log",
    "store.root",
    "origin.base_url",
    "origin.entry_point",
    "origin.manifest_path",
    "origin.navigation",
    "fetch.timeout_secs",
    "retention.max_archive_mb",
];

/// Keys stored as comma-separated lists
const LIST_KEYS: &[&str] = &["origin.navigation"];

/// Execute the config command
pub async fn execute(args: ConfigArgs, config: &Config, manager: &ConfigManager) -> SwPackResult<()> {
    match args.action {
        None | Some(ConfigAction::Show) => show_config(config)?,
        Some(ConfigAction::Path) => println!("{}", manager.path().display()),
        Some(ConfigAction::Init { force }) => init_config(manager, force).await?,
        Some(ConfigAction::Set { key, value, local }) => {
            if local {
                set_local_value(&key, &value).await?
            } else {
                set_value(manager, &key, &value).await?
            }
        }
    }

    Ok(())
}

fn show_config(config: &Config) -> SwPackResult<()> {
    println!("{}", toml::to_string_pretty(config)?);
    Ok(())
}

async fn init_config(manager: &ConfigManager, force: bool) -> SwPackResult<()> {
    let ctx = UiContext::detect();
    let path = manager.path();

    if path.exists() && !force {
        ui::step_with(
            &ctx,
            Tone::Warn,
            &format!("Config already exists at {}", path.display()),
            "use --force to overwrite",
        );
        return Ok(());
    }

    manager.save(&Config::default()).await?;
    ui::step_with(&ctx, Tone::Ok, "Wrote default config", &path.display().to_string());

    Ok(())
}

/// Update one key in the global config file
///
/// Starts from the file alone so values merged in from a local config are
/// not written back globally.
async fn set_value(manager: &ConfigManager, key: &str, value: &str) -> SwPackResult<()> {
    let ctx = UiContext::detect();
    let mut config = manager.load().await?;
    apply_value(&mut config, key, value)?;
    manager.save(&config).await?;
    ui::step(&ctx, Tone::Ok, &format!("Set {} = {}", key, value));
    Ok(())
}

fn apply_value(config: &mut Config, key: &str, value: &str) -> SwPackResult<()> {
    let parts: Vec<&str> = key.split('.').collect();

    match parts.as_slice() {
        ["general", "verbose"] => config.general.verbose = parse_bool(value)?,
        ["general", "log_format"] => config.general.log_format = parse_log_format(value)?,
        ["general", "audit_log"] => config.general.audit_log = parse_bool(value)?,

        ["store", "root"] => config.store.root = Some(PathBuf::from(value)),

        ["origin", "base_url"] => config.origin.base_url = parse_origin(value)?.to_string(),
        ["origin", "entry_point"] => config.origin.entry_point = value.to_string(),
        ["origin", "manifest_path"] => config.origin.manifest_path = value.to_string(),
        ["origin", "navigation"] => config.origin.navigation = NavigationRules::new(split_list(value)),

        ["fetch", "timeout_secs"] => config.fetch.timeout_secs = parse_u64(value)?,
        ["retention", "max_archive_mb"] => config.retention.max_archive_mb = parse_u64(value)?,

        _ => return Err(unknown_key(key)),
    }

    Ok(())
}

async fn set_local_value(key: &str, value: &str) -> SwPackResult<()> {
    let ctx = UiContext::detect();

    let cwd = std::env::current_dir().map_err(|e| SwPackError::io("getting current directory", e))?;
    let local_path = cwd.join(LOCAL_CONFIG_FILE);

    // Validate against a scratch config before touching the file
    apply_value(&mut Config::default(), key, value)?;

    let mut doc: toml::Value = if local_path.exists() {
        let content = fs::read_to_string(&local_path)
            .await
            .map_err(|e| SwPackError::io(format!("reading {}", local_path.display()), e))?;
        content
            .parse()
            .map_err(|e: toml::de::Error| SwPackError::ConfigInvalid {
                path: local_path.clone(),
                reason: e.to_string(),
            })?
    } else {
        toml::Value::Table(toml::map::Map::new())
    };

    set_toml_value(&mut doc, key, value)?;

    // Only the keys set explicitly land in the local file
    let content = toml::to_string_pretty(&doc)?;
    fs::write(&local_path, content)
        .await
        .map_err(|e| SwPackError::io(format!("writing {}", local_path.display()), e))?;

    let message = format!("Set {} = {} in {}", key, value, local_path.display());
    ui::step(&ctx, Tone::Ok, &message);

    Ok(())
}

/// Set a dot-separated key in a TOML tree, creating intermediate tables
fn set_toml_value(doc: &mut toml::Value, key: &str, value: &str) -> SwPackResult<()> {
    let (sections, leaf) = match key.rsplit_once('.') {
        Some((sections, leaf)) => (sections.split('.').collect::<Vec<_>>(), leaf),
        None => (Vec::new(), key),
    };

    let mut current = doc;
    for part in sections {
        current = current
            .as_table_mut()
            .ok_or_else(|| SwPackError::User(format!("Expected table at key: {}", part)))?
            .entry(part)
            .or_insert_with(|| toml::Value::Table(toml::map::Map::new()));
    }

    let table = current
        .as_table_mut()
        .ok_or_else(|| SwPackError::User(format!("Expected table for key: {}", key)))?;

    let toml_value = if LIST_KEYS.contains(&key) {
        toml::Value::Array(split_list(value).into_iter().map(toml::Value::String).collect())
    } else if let Ok(flag) = value.parse::<bool>() {
        toml::Value::Boolean(flag)
    } else if let Ok(n) = value.parse::<i64>() {
        toml::Value::Integer(n)
    } else {
        toml::Value::String(value.to_string())
    };

    table.insert(leaf.to_string(), toml_value);
    Ok(())
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn parse_bool(value: &str) -> SwPackResult<bool> {
    match value.to_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(SwPackError::User(format!(
            "Invalid boolean value: {}. Use true/false",
            value
        ))),
    }
}

fn parse_u64(value: &str) -> SwPackResult<u64> {
    value
        .parse()
        .map_err(|_| SwPackError::User(format!("Invalid number: {}", value)))
}

fn parse_log_format(value: &str) -> SwPackResult<String> {
    match value {
        "text" | "json" => Ok(value.to_string()),
        _ => Err(SwPackError::User(format!(
            "Invalid log format: {}. Use text or json",
            value
        ))),
    }
}

fn unknown_key(key: &str) -> SwPackError {
    SwPackError::User(format!(
        "Unknown config key: {}. Valid keys: {}",
        key,
        VALID_KEYS.join(", ")
    ))
}
