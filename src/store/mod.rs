//! Named blob stores holding pack contents
//!
//! Every pack lives in its own store named `sw-pack-<fingerprint>`, keyed by
//! logical path. One reserved store, `$$$sw-pack-internal`, holds the current
//! manifest pointer and one snapshot per retained pack.
//!
//! # Backends
//!
//! | Backend | Use |
//! |---------|-----|
//! | [`MemoryStorage`] | Embedding and tests |
//! | [`DiskStorage`] | CLI, one directory per store |

pub mod disk;
pub mod internal;
pub mod memory;

pub use disk::DiskStorage;
pub use internal::{snapshot_key, ManifestStore, MANIFEST_KEY};
pub use memory::MemoryStorage;

use crate::error::SwPackResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Prefix of every pack store name
pub const PACK_STORE_PREFIX: &str = "sw-pack";

/// Reserved store holding manifest pointer and snapshots
pub const INTERNAL_STORE: &str = "$$$sw-pack-internal";

/// Store name for a pack fingerprint
pub fn pack_store_name(fingerprint: &str) -> String {
    format!("{}-{}", PACK_STORE_PREFIX, fingerprint)
}

/// Pack fingerprint encoded in a store name, if it is a pack store
pub fn fingerprint_from_store_name(name: &str) -> Option<&str> {
    name.strip_prefix(PACK_STORE_PREFIX)?
        .strip_prefix('-')
        .filter(|fp| !fp.is_empty())
}

/// A cached response body with the metadata needed to serve it again
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedResponse {
    /// URL the bytes were retrieved from
    pub url: String,

    /// HTTP status (0 for a network error)
    pub status: u16,

    /// Content-Type header, if known
    pub content_type: Option<String>,

    /// Response body
    #[serde(skip)]
    pub body: Vec<u8>,
}

impl CachedResponse {
    /// Create a 200 response with the given body
    pub fn new(url: impl Into<String>, body: Vec<u8>) -> Self {
        Self {
            url: url.into(),
            status: 200,
            content_type: None,
            body,
        }
    }

    /// Set the content type
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Set the status code
    pub fn with_status(mut self, status: u16) -> Self {
        self.status = status;
        self
    }

    /// Response standing in for a failed network fetch
    pub fn network_error(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            status: 0,
            content_type: None,
            body: Vec::new(),
        }
    }

    /// Whether the status is 2xx
    pub fn is_ok(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Body length in bytes
    pub fn len(&self) -> usize {
        self.body.len()
    }

    /// Whether the body is empty
    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }
}

/// One opened, named key-value blob store
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Store name
    fn name(&self) -> &str;

    /// Read the object under `key`
    async fn get(&self, key: &str) -> SwPackResult<Option<CachedResponse>>;

    /// Write `response` under `key`, replacing any previous object
    async fn put(&self, key: &str, response: &CachedResponse) -> SwPackResult<()>;

    /// Delete the object under `key`, returning whether it existed
    async fn delete(&self, key: &str) -> SwPackResult<bool>;

    /// All keys, sorted
    async fn keys(&self) -> SwPackResult<Vec<String>>;

    /// Total body bytes held by the store
    async fn size_bytes(&self) -> SwPackResult<u64> {
        let mut total = 0u64;
        for key in self.keys().await? {
            if let Some(response) = self.get(&key).await? {
                total += response.len() as u64;
            }
        }
        Ok(total)
    }
}

/// The host's store capability: open-by-name, enumerate and delete stores
#[async_trait]
pub trait CacheStorage: Send + Sync {
    /// Open a store, creating it if it does not exist
    async fn open(&self, name: &str) -> SwPackResult<Arc<dyn CacheStore>>;

    /// Whether a store exists
    async fn has(&self, name: &str) -> SwPackResult<bool>;

    /// All store names, sorted
    async fn names(&self) -> SwPackResult<Vec<String>>;

    /// Delete a store and everything in it, returning whether it existed
    async fn delete(&self, name: &str) -> SwPackResult<bool>;
}

/// Copy the object under `from_key` in one store to `to_key` in another
///
/// Returns `false` when the source store has no such object.
pub async fn copy_entry(
    from: &dyn CacheStore,
    to: &dyn CacheStore,
    from_key: &str,
    to_key: &str,
) -> SwPackResult<bool> {
    match from.get(from_key).await? {
        Some(response) => {
            to.put(to_key, &response).await?;
            Ok(true)
        }
        None => Ok(false),
    }
}
