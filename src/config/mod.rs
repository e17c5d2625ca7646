//! Configuration management for swpack

pub mod schema;

pub use schema::Config;

use crate::error::{SwPackError, SwPackResult};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

/// File name of the project-local config
pub const LOCAL_CONFIG_FILE: &str = ".swpack.toml";

/// Configuration manager
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// Create a new config manager with default path
    pub fn new() -> Self {
        Self {
            config_path: Self::default_config_path(),
        }
    }

    /// Create a config manager with a custom path
    pub fn with_path(path: PathBuf) -> Self {
        Self { config_path: path }
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("swpack")
            .join("config.toml")
    }

    /// Get the state directory path
    pub fn state_dir() -> PathBuf {
        dirs::state_dir()
            .or_else(dirs::data_local_dir)
            .unwrap_or_else(|| PathBuf::from("."))
            .join("swpack")
    }

    /// Default store root
    pub fn stores_dir() -> PathBuf {
        Self::state_dir().join("stores")
    }

    /// Get the lifecycle journal path
    pub fn journal_path() -> PathBuf {
        Self::state_dir().join("journal.log")
    }

    /// Store root from config, or the default
    pub fn store_root(config: &Config) -> PathBuf {
        config
            .store
            .root
            .clone()
            .unwrap_or_else(Self::stores_dir)
    }

    /// Find `.swpack.toml` in `start` or any ancestor
    pub fn find_local_config(start: &Path) -> Option<PathBuf> {
        start
            .ancestors()
            .map(|dir| dir.join(LOCAL_CONFIG_FILE))
            .find(|candidate| candidate.is_file())
    }

    /// Load configuration, creating default if not exists
    pub async fn load(&self) -> SwPackResult<Config> {
        if !self.config_path.exists() {
            debug!("Config file not found, using defaults");
            return Ok(Config::default());
        }

        self.load_from_file(&self.config_path).await
    }

    /// Load the global config with a local override merged on top
    ///
    /// Tables merge key by key; any other value in the local file replaces
    /// the global one.
    pub async fn load_merged(&self, local: Option<&Path>) -> SwPackResult<Config> {
        let Some(local) = local else {
            return self.load().await;
        };

        let mut merged = if self.config_path.exists() {
            Self::read_value(&self.config_path).await?
        } else {
            toml::Value::Table(toml::map::Map::new())
        };
        merge_values(&mut merged, Self::read_value(local).await?);

        merged
            .try_into::<Config>()
            .map_err(|e| SwPackError::ConfigInvalid {
                path: local.to_path_buf(),
                reason: e.to_string(),
            })
    }

    async fn read_value(path: &Path) -> SwPackResult<toml::Value> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| SwPackError::io(format!("reading config from {}", path.display()), e))?;

        content
            .parse::<toml::Value>()
            .map_err(|e| SwPackError::ConfigInvalid {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })
    }

    /// Load configuration from a specific file
    pub async fn load_from_file(&self, path: &Path) -> SwPackResult<Config> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| SwPackError::io(format!("reading config from {}", path.display()), e))?;

        toml::from_str(&content).map_err(|e| SwPackError::ConfigInvalid {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Save configuration to file
    pub async fn save(&self, config: &Config) -> SwPackResult<()> {
        self.ensure_config_dir().await?;

        let content = toml::to_string_pretty(config)?;
        fs::write(&self.config_path, content).await.map_err(|e| {
            SwPackError::io(
                format!("writing config to {}", self.config_path.display()),
                e,
            )
        })?;

        info!("Configuration saved to {}", self.config_path.display());
        Ok(())
    }

    /// Ensure the config directory exists
    async fn ensure_config_dir(&self) -> SwPackResult<()> {
        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| SwPackError::ConfigDirCreate {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
        }
        Ok(())
    }

    /// Ensure the state directory exists
    pub async fn ensure_state_dirs() -> SwPackResult<()> {
        let dir = Self::state_dir();
        fs::create_dir_all(&dir)
            .await
            .map_err(|e| SwPackError::io(format!("creating directory {}", dir.display()), e))
    }

    /// Get the config file path
    pub fn path(&self) -> &Path {
        &self.config_path
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Deep-merge `overlay` into `base`
fn merge_values(base: &mut toml::Value, overlay: toml::Value) {
    match (base, overlay) {
        (toml::Value::Table(base), toml::Value::Table(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(&key) {
                    Some(existing) => merge_values(existing, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn load_default_when_missing() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nonexistent.toml");
        let manager = ConfigManager::with_path(path);

        let config = manager.load().await.unwrap();
        assert_eq!(config.origin.entry_point, "index.html");
    }

    #[tokio::test]
    async fn save_and_load_roundtrip() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        let manager = ConfigManager::with_path(path);

        let mut config = Config::default();
        config.origin.base_url = "https://app.example.com/".to_string();
        config.store.root = Some(temp.path().join("stores"));

        manager.save(&config).await.unwrap();
        let loaded = manager.load().await.unwrap();

        assert_eq!(loaded, config);
    }

    #[tokio::test]
    async fn local_config_overrides_keys() {
        let temp = TempDir::new().unwrap();
        let global = temp.path().join("config.toml");
        tokio::fs::write(
            &global,
            "[origin]\nbase_url = \"https://global.example.com/\"\nentry_point = \"app.html\"\n",
        )
        .await
        .unwrap();
        let local = temp.path().join(LOCAL_CONFIG_FILE);
        tokio::fs::write(&local, "[origin]\nbase_url = \"https://local.example.com/\"\n")
            .await
            .unwrap();

        let config = ConfigManager::with_path(global)
            .load_merged(Some(&local))
            .await
            .unwrap();
        assert_eq!(config.origin.base_url, "https://local.example.com/");
        assert_eq!(config.origin.entry_point, "app.html");
    }

    #[tokio::test]
    async fn invalid_local_config_is_reported() {
        let temp = TempDir::new().unwrap();
        let local = temp.path().join(LOCAL_CONFIG_FILE);
        tokio::fs::write(&local, "[fetch]\ntimeout_secs = \"soon\"\n")
            .await
            .unwrap();

        let err = ConfigManager::with_path(temp.path().join("missing.toml"))
            .load_merged(Some(&local))
            .await
            .unwrap_err();
        assert!(matches!(err, SwPackError::ConfigInvalid { .. }));
    }

    #[test]
    fn finds_local_config_in_ancestor() {
        let temp = TempDir::new().unwrap();
        let nested = temp.path().join("a/b");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(temp.path().join(LOCAL_CONFIG_FILE), "").unwrap();

        assert_eq!(
            ConfigManager::find_local_config(&nested),
            Some(temp.path().join(LOCAL_CONFIG_FILE))
        );
    }
}
