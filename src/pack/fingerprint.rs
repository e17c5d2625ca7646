//! Content digests for entries and packs
//!
//! Entry fingerprints are SHA-256 hex digests of the resource bytes. The pack
//! fingerprint is the SHA-256 hex digest of every entry fingerprint
//! concatenated in entry order.

use crate::pack::manifest::PackEntry;
use sha2::{Digest, Sha256};

/// Digest a resource body into its entry fingerprint
pub fn content_digest(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// Derive the pack fingerprint from an ordered entry list
pub fn pack_fingerprint(entries: &[PackEntry]) -> String {
    let mut hasher = Sha256::new();
    for entry in entries {
        hasher.update(entry.hash.as_bytes());
    }
    hex::encode(hasher.finalize())
}
