//! Internal manifest store
//!
//! Holds the canonical pointer (`sw-pack.json`) to the current manifest and
//! one fingerprint-qualified snapshot (`<fingerprint>-sw-pack.json`) per
//! retained pack.

use crate::error::{SwPackError, SwPackResult};
use crate::pack::Manifest;
use crate::store::{CacheStorage, CacheStore, CachedResponse, INTERNAL_STORE};
use std::sync::Arc;
use tracing::{debug, warn};

/// Canonical current-pointer key, also the well-known introspection path
pub const MANIFEST_KEY: &str = "sw-pack.json";

/// Snapshot key for a pack fingerprint
pub fn snapshot_key(fingerprint: &str) -> String {
    format!("{}-{}", fingerprint, MANIFEST_KEY)
}

/// Manifest persistence over the reserved internal store
#[derive(Clone)]
pub struct ManifestStore {
    store: Arc<dyn CacheStore>,
}

impl ManifestStore {
    /// Open the internal store
    pub async fn open(storage: &dyn CacheStorage) -> SwPackResult<Self> {
        let store = storage.open(INTERNAL_STORE).await?;
        Ok(Self { store })
    }

    /// Underlying store
    pub fn store(&self) -> &Arc<dyn CacheStore> {
        &self.store
    }

    /// Load the current manifest, or `None` if nothing usable is installed
    ///
    /// A manifest persisted under a different wire revision is treated as
    /// absent so the next install starts from scratch.
    pub async fn load_current(&self) -> SwPackResult<Option<Manifest>> {
        self.load(MANIFEST_KEY).await
    }

    async fn load(&self, key: &str) -> SwPackResult<Option<Manifest>> {
        let Some(response) = self.store.get(key).await? else {
            debug!("No manifest under {}", key);
            return Ok(None);
        };

        let content = String::from_utf8(response.body)
            .map_err(|e| SwPackError::store(INTERNAL_STORE, key, e))?;

        match Manifest::from_json(&content) {
            Ok(manifest) => Ok(Some(manifest)),
            Err(SwPackError::ManifestRevision { found, expected }) => {
                warn!(
                    "Ignoring manifest {} with revision {} (expected {})",
                    key, found, expected
                );
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Persist `manifest` as current
    ///
    /// The snapshot is written first and the canonical pointer last, so the
    /// pointer never names a manifest whose snapshot is missing.
    pub async fn save(&self, manifest: &Manifest) -> SwPackResult<()> {
        let body = manifest.to_json()?.into_bytes();
        let snapshot = snapshot_key(manifest.fingerprint());

        let response = CachedResponse::new(snapshot.as_str(), body.clone())
            .with_content_type("application/json");
        self.store.put(&snapshot, &response).await?;

        let response =
            CachedResponse::new(MANIFEST_KEY, body).with_content_type("application/json");
        self.store.put(MANIFEST_KEY, &response).await?;

        debug!("Persisted manifest {} as current", manifest.fingerprint());
        Ok(())
    }

    /// Raw stored object, used for introspection over the request path
    pub async fn read_raw(&self, key: &str) -> SwPackResult<Option<CachedResponse>> {
        self.store.get(key).await
    }

    /// All keys in the internal store
    pub async fn keys(&self) -> SwPackResult<Vec<String>> {
        self.store.keys().await
    }

    /// Delete one key
    pub async fn delete(&self, key: &str) -> SwPackResult<bool> {
        self.store.delete(key).await
    }
}
