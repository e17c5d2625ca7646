//! Pack lifecycle journal
//!
//! Appends one JSON line per lifecycle event to
//! `~/.local/state/swpack/journal.log`. Journal failures are logged and
//! never interrupt install or activation.

use crate::config::{schema::Config, ConfigManager};
use chrono::Utc;
use serde::Serialize;
use std::path::PathBuf;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tracing::warn;
use uuid::Uuid;

/// A recorded lifecycle event
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum PackEvent {
    Installed {
        attempt: Uuid,
        fingerprint: String,
        previous: Option<String>,
        reused: usize,
        fetched: usize,
    },
    InstallFailed {
        attempt: Uuid,
        fingerprint: String,
        failed: usize,
        total: usize,
        reason: String,
    },
    Activated {
        fingerprint: String,
        archived: Vec<String>,
        removed_stores: usize,
        removed_snapshots: usize,
        failures: usize,
    },
    Evicted {
        fingerprint: String,
    },
}

impl PackEvent {
    /// Event name written to the `event` field
    pub fn name(&self) -> &'static str {
        match self {
            Self::Installed { .. } => "pack.installed",
            Self::InstallFailed { .. } => "pack.install_failed",
            Self::Activated { .. } => "pack.activated",
            Self::Evicted { .. } => "pack.evicted",
        }
    }
}

/// File-based journal that appends JSON lines
#[derive(Debug, Clone)]
pub struct AuditLog {
    enabled: bool,
    path: PathBuf,
}

impl AuditLog {
    /// Journal configured by `general.audit_log`
    pub fn new(config: &Config) -> Self {
        Self {
            enabled: config.general.audit_log,
            ..Self::at(ConfigManager::journal_path())
        }
    }

    /// Journal writing to `path`
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            enabled: true,
            path: path.into(),
        }
    }

    /// Journal that records nothing
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            path: PathBuf::new(),
        }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Append `event`
    pub async fn record(&self, event: &PackEvent) {
        if !self.enabled {
            return;
        }

        let entry = serde_json::json!({
            "timestamp": Utc::now().to_rfc3339(),
            "event": event.name(),
            "data": event,
        });

        let mut line = match serde_json::to_string(&entry) {
            Ok(s) => s,
            Err(e) => {
                warn!("Failed to serialize journal event: {}", e);
                return;
            }
        };
        line.push('\n');

        if let Err(e) = self.append(&line).await {
            warn!("Failed to write journal {}: {}", self.path.display(), e);
        }
    }

    async fn append(&self, line: &str) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;

        file.write_all(line.as_bytes()).await?;
        file.flush().await
    }
}
