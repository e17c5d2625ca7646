//! Configuration schema for swpack
//!
//! Configuration is stored at `~/.config/swpack/config.toml`, with an
//! optional project-local `.swpack.toml` layered on top.

use crate::lifecycle::NavigationRules;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Where pack stores live
    pub store: StoreConfig,

    /// Origin the packs are served for
    pub origin: OriginConfig,

    /// Network fetch settings
    pub fetch: FetchConfig,

    /// Archive retention bounds
    pub retention: RetentionConfig,
}

/// General application settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Enable verbose logging
    pub verbose: bool,

    /// Log format: "text" or "json"
    pub log_format: String,

    /// Record lifecycle events to the journal
    pub audit_log: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            verbose: false,
            log_format: "text".to_string(),
            audit_log: true,
        }
    }
}

/// Store location
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Store root directory (default: `<state dir>/swpack/stores`)
    pub root: Option<PathBuf>,
}

/// Origin and routing settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OriginConfig {
    /// Base URL relative entry paths resolve against
    pub base_url: String,

    /// Entry point document answered for navigations
    pub entry_point: String,

    /// Well-known path serving the current manifest
    pub manifest_path: String,

    /// Same-origin path patterns answered with the entry point
    pub navigation: NavigationRules,
}

impl Default for OriginConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080/".to_string(),
            entry_point: "index.html".to_string(),
            manifest_path: "sw-pack.json".to_string(),
            navigation: NavigationRules::default(),
        }
    }
}

/// Fetch settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self { timeout_secs: 30 }
    }
}

/// Retention bounds applied at activation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetentionConfig {
    /// Maximum combined size of archived packs in MB (0 = disabled)
    pub max_archive_mb: u64,
}

impl RetentionConfig {
    /// Ceiling in bytes, if enabled
    pub fn max_archive_bytes(&self) -> Option<u64> {
        (self.max_archive_mb > 0).then(|| self.max_archive_mb * 1024 * 1024)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = Config::default();
        let toml = toml::to_string_pretty(&config).unwrap();
        assert!(toml.contains("[general]"));
        assert!(toml.contains("[origin]"));
        assert!(toml.contains("navigation = ["));
    }

    #[test]
    fn config_deserializes_empty() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.origin.entry_point, "index.html");
        assert_eq!(config.origin.navigation, NavigationRules::default());
        assert_eq!(config.retention.max_archive_bytes(), None);
    }

    #[test]
    fn config_deserializes_partial() {
        let toml = r#"
            [origin]
            base_url = "https://app.example.com/"
            navigation = ["/", "/app/*"]

            [retention]
            max_archive_mb = 2
        "#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.origin.base_url, "https://app.example.com/");
        assert_eq!(config.origin.navigation.patterns(), ["/", "/app/*"]);
        assert_eq!(config.origin.manifest_path, "sw-pack.json");
        assert_eq!(config.retention.max_archive_bytes(), Some(2 * 1024 * 1024));
        assert_eq!(config.fetch.timeout_secs, 30);
    }
}
