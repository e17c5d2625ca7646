//! Pack model: manifests, fingerprints, entry diffing and version states
//!
//! A pack is an ordered set of `(path, fingerprint)` entries identified by a
//! fingerprint derived from all entry fingerprints. Everything in this module
//! except [`ManifestBuilder`] is pure and does no I/O.

pub mod builder;
pub mod diff;
pub mod fingerprint;
pub mod manifest;
pub mod state;

pub use builder::{BuildInput, ManifestBuilder, DEFAULT_ARCHIVE_VERSIONS};
pub use diff::{diff_entries, summarize, EntryDecision};
pub use fingerprint::{content_digest, pack_fingerprint};
pub use manifest::{is_http, Manifest, PackEntry, MANIFEST_REVISION};
pub use state::PackState;
