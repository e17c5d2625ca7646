//! In-memory store backend

use crate::error::SwPackResult;
use crate::store::{CacheStorage, CacheStore, CachedResponse};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Store capability backed by process memory
#[derive(Debug, Default)]
pub struct MemoryStorage {
    stores: RwLock<HashMap<String, Arc<MemoryStore>>>,
}

impl MemoryStorage {
    /// Create empty storage
    pub fn new() -> Self {
        Self::default()
    }
}

/// One in-memory store
#[derive(Debug)]
pub struct MemoryStore {
    name: String,
    objects: RwLock<BTreeMap<String, CachedResponse>>,
}

impl MemoryStore {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            objects: RwLock::new(BTreeMap::new()),
        }
    }
}

#[async_trait]
impl CacheStore for MemoryStore {
    fn name(&self) -> &str {
        &self.name
    }

    async fn get(&self, key: &str) -> SwPackResult<Option<CachedResponse>> {
        Ok(self.objects.read().await.get(key).cloned())
    }

    async fn put(&self, key: &str, response: &CachedResponse) -> SwPackResult<()> {
        self.objects
            .write()
            .await
            .insert(key.to_string(), response.clone());
        Ok(())
    }

    async fn delete(&self, key: &str) -> SwPackResult<bool> {
        Ok(self.objects.write().await.remove(key).is_some())
    }

    async fn keys(&self) -> SwPackResult<Vec<String>> {
        Ok(self.objects.read().await.keys().cloned().collect())
    }

    async fn size_bytes(&self) -> SwPackResult<u64> {
        Ok(self
            .objects
            .read()
            .await
            .values()
            .map(|r| r.len() as u64)
            .sum())
    }
}

#[async_trait]
impl CacheStorage for MemoryStorage {
    async fn open(&self, name: &str) -> SwPackResult<Arc<dyn CacheStore>> {
        let mut stores = self.stores.write().await;
        let store: Arc<dyn CacheStore> = stores
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(MemoryStore::new(name)))
            .clone();
        Ok(store)
    }

    async fn has(&self, name: &str) -> SwPackResult<bool> {
        Ok(self.stores.read().await.contains_key(name))
    }

    async fn names(&self) -> SwPackResult<Vec<String>> {
        let mut names: Vec<String> = self.stores.read().await.keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    async fn delete(&self, name: &str) -> SwPackResult<bool> {
        Ok(self.stores.write().await.remove(name).is_some())
    }
}
