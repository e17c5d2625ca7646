//! Pack manifest model and wire format
//!
//! A manifest describes one pack: the ordered `(path, hash)` entries, the
//! pack fingerprint derived from them, and the retention bookkeeping carried
//! between installs. The persisted JSON shape is:
//!
//! ```json
//! {
//!   "hash": "<pack fingerprint>",
//!   "cache": [{ "path": "index.html", "hash": "<entry fingerprint>" }],
//!   "archiveVersions": 1,
//!   "archivedPacks": ["<older pack fingerprint>"],
//!   "_revision": 1
//! }
//! ```

use crate::error::{SwPackError, SwPackResult};
use crate::pack::fingerprint::pack_fingerprint;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Structural revision of the wire format. Bumped on breaking changes.
pub const MANIFEST_REVISION: u32 = 1;

/// One cached resource: logical path (relative or absolute URL) and its fingerprint
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PackEntry {
    /// Logical path, either origin-relative (`css/site.css`) or an absolute URL
    pub path: String,

    /// Content fingerprint of the resource bytes
    pub hash: String,
}

impl PackEntry {
    /// Create a new entry
    pub fn new(path: impl Into<String>, hash: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            hash: hash.into(),
        }
    }

    /// Whether the logical path is an absolute http(s) URL
    pub fn is_external(&self) -> bool {
        is_http(&self.path)
    }
}

/// Whether a path or URL string uses the http(s) scheme
pub fn is_http(path: &str) -> bool {
    let lower = path.get(..8).unwrap_or(path).to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// Immutable descriptor of a pack
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ManifestWire")]
pub struct Manifest {
    hash: String,

    cache: Vec<PackEntry>,

    #[serde(rename = "archiveVersions")]
    archive_versions: u32,

    #[serde(rename = "archivedPacks")]
    archived_packs: Vec<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    version: Option<String>,

    #[serde(rename = "_revision")]
    revision: u32,
}

/// Raw persisted shape, validated into a [`Manifest`]
#[derive(Debug, Deserialize)]
struct ManifestWire {
    #[serde(default)]
    hash: Option<String>,

    cache: Vec<PackEntry>,

    #[serde(default, rename = "archiveVersions")]
    archive_versions: u32,

    #[serde(default, rename = "archivedPacks")]
    archived_packs: Vec<String>,

    #[serde(default)]
    version: Option<String>,

    #[serde(default = "current_revision", rename = "_revision", alias = "_swpackRevision")]
    revision: u32,
}

fn current_revision() -> u32 {
    MANIFEST_REVISION
}

impl TryFrom<ManifestWire> for Manifest {
    type Error = SwPackError;

    fn try_from(wire: ManifestWire) -> Result<Self, Self::Error> {
        check_unique_paths(&wire.cache)?;

        // Manifests written before hashing carry a null hash
        let hash = match wire.hash {
            Some(hash) if !hash.is_empty() => hash,
            _ => pack_fingerprint(&wire.cache),
        };

        let manifest = Self {
            hash,
            cache: wire.cache,
            archive_versions: wire.archive_versions,
            archived_packs: Vec::new(),
            version: wire.version,
            revision: wire.revision,
        };
        Ok(manifest.with_archived(wire.archived_packs))
    }
}

fn check_unique_paths(entries: &[PackEntry]) -> SwPackResult<()> {
    let mut seen = HashSet::with_capacity(entries.len());
    for entry in entries {
        if entry.path.is_empty() {
            return Err(SwPackError::ManifestInvalid(
                "entry with empty path".to_string(),
            ));
        }
        if !seen.insert(entry.path.as_str()) {
            return Err(SwPackError::DuplicateEntry(entry.path.clone()));
        }
    }
    Ok(())
}

impl Manifest {
    /// Build a manifest from ordered entries, deriving the pack fingerprint
    pub fn new(entries: Vec<PackEntry>, archive_versions: u32) -> SwPackResult<Self> {
        check_unique_paths(&entries)?;
        Ok(Self {
            hash: pack_fingerprint(&entries),
            cache: entries,
            archive_versions,
            archived_packs: Vec::new(),
            version: None,
            revision: MANIFEST_REVISION,
        })
    }

    /// Attach a free-form version label
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Parse a persisted manifest, rejecting foreign revisions before interpreting it
    pub fn from_json(content: &str) -> SwPackResult<Self> {
        let value: serde_json::Value = serde_json::from_str(content)?;
        let found = value
            .get("_revision")
            .or_else(|| value.get("_swpackRevision"))
            .and_then(serde_json::Value::as_u64)
            .map(|r| r as u32)
            .unwrap_or(MANIFEST_REVISION);

        if found != MANIFEST_REVISION {
            return Err(SwPackError::ManifestRevision {
                found,
                expected: MANIFEST_REVISION,
            });
        }

        Ok(serde_json::from_value(value)?)
    }

    /// Serialize to the persisted JSON shape
    pub fn to_json(&self) -> SwPackResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Pack fingerprint
    pub fn fingerprint(&self) -> &str {
        &self.hash
    }

    /// Ordered entries
    pub fn entries(&self) -> &[PackEntry] {
        &self.cache
    }

    /// How many prior packs stay installed alongside this one
    pub fn archive_versions(&self) -> u32 {
        self.archive_versions
    }

    /// Retained pack fingerprints, most recent first
    pub fn archived(&self) -> &[String] {
        &self.archived_packs
    }

    /// Optional version label from the builder
    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    /// Wire format revision
    pub fn revision(&self) -> u32 {
        self.revision
    }

    /// Whether `fingerprint` is this pack or one of its retained packs
    pub fn retains(&self, fingerprint: &str) -> bool {
        self.hash == fingerprint || self.archived_packs.iter().any(|h| h == fingerprint)
    }

    /// Replace the archive list, deduplicated, without self, bounded by `archive_versions`
    pub fn with_archived(mut self, archived: Vec<String>) -> Self {
        let mut seen = HashSet::new();
        let limit = self.archive_versions as usize;
        let own = self.hash.clone();
        self.archived_packs = archived
            .into_iter()
            .filter(|h| !h.is_empty() && *h != own && seen.insert(h.clone()))
            .take(limit)
            .collect();
        self
    }

    /// Drop archived packs beyond `archive_versions`
    pub fn truncate_archive(&self) -> Self {
        let archived = self.archived_packs.clone();
        self.clone().with_archived(archived)
    }

    /// The manifest to persist when this pack replaces `previous` as current
    ///
    /// The previous pack goes to the front of the archive list, followed by
    /// this manifest's own archive list and then the previous one's.
    pub fn succeeding(&self, previous: Option<&Manifest>) -> Self {
        let Some(previous) = previous else {
            return self.truncate_archive();
        };

        if previous.hash == self.hash {
            let archived = previous.archived_packs.clone();
            return self.clone().with_archived(archived);
        }

        let archived = std::iter::once(previous.hash.clone())
            .chain(self.archived_packs.iter().cloned())
            .chain(previous.archived_packs.iter().cloned())
            .collect();
        self.clone().with_archived(archived)
    }
}
