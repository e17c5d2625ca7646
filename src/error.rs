//! Error types for swpack
//!
//! All modules use `SwPackResult<T>` as their return type.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for swpack operations
pub type SwPackResult<T> = Result<T, SwPackError>;

/// All errors that can occur in swpack
#[derive(Error, Debug)]
pub enum SwPackError {
    // Fetch errors
    #[error("Failed to fetch {url}: {reason}")]
    Fetch { url: String, reason: String },

    #[error("Invalid origin URL {url}: {reason}")]
    OriginInvalid { url: String, reason: String },

    // Store errors
    #[error("Cache store {name} is unavailable: {reason}")]
    StoreUnavailable { name: String, reason: String },

    #[error("Cache store {store} failed on {key}: {reason}")]
    Store {
        store: String,
        key: String,
        reason: String,
    },

    // Pack errors
    #[error("Install of pack {fingerprint} aborted: {failed} of {total} entries failed")]
    InstallAborted {
        fingerprint: String,
        failed: usize,
        total: usize,
        #[source]
        source: Box<SwPackError>,
    },

    #[error("Invalid manifest: {0}")]
    ManifestInvalid(String),

    #[error("Duplicate manifest entry: {0}")]
    DuplicateEntry(String),

    #[error("Unsupported manifest revision {found} (expected {expected})")]
    ManifestRevision { found: u32, expected: u32 },

    #[error("No pack is installed")]
    NoCurrentPack,

    #[error("Nothing to pack: no inputs given")]
    EmptyPack,

    // Configuration errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("Failed to create config directory {path}: {source}")]
    ConfigDirCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    #[error("Invalid path: {path}: {reason}")]
    PathInvalid { path: PathBuf, reason: String },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    // General errors
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("{0}")]
    User(String),
}

impl SwPackError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a fetch failure for one URL
    pub fn fetch(url: impl Into<String>, reason: impl ToString) -> Self {
        Self::Fetch {
            url: url.into(),
            reason: reason.to_string(),
        }
    }

    /// Create a store-unavailable error
    pub fn store_unavailable(name: impl Into<String>, reason: impl ToString) -> Self {
        Self::StoreUnavailable {
            name: name.into(),
            reason: reason.to_string(),
        }
    }

    /// Create a per-key store operation error
    pub fn store(store: impl Into<String>, key: impl Into<String>, reason: impl ToString) -> Self {
        Self::Store {
            store: store.into(),
            key: key.into(),
            reason: reason.to_string(),
        }
    }

    /// Check if error is retryable on the next install attempt
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Fetch { .. } | Self::InstallAborted { .. } | Self::Store { .. }
        )
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::NoCurrentPack => Some("Run: swpack install <sw-pack.json>"),
            Self::InstallAborted { .. } => {
                Some("The previous pack is still current. Re-run install once the origin is reachable")
            }
            Self::StoreUnavailable { .. } => Some("Check store.root in: swpack config show"),
            Self::EmptyPack => Some("Pass at least one file or URL to: swpack build"),
            Self::ManifestRevision { .. } => Some("Rebuild the manifest with: swpack build"),
            _ => None,
        }
    }
}
