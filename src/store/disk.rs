//! Filesystem store backend
//!
//! Layout under the storage root:
//!
//! ```text
//! <root>/
//!   <hex(store name)>/
//!     <sha256(key)>.body   response bytes
//!     <sha256(key)>.json   metadata, written last
//! ```
//!
//! An object exists only once its metadata file is in place, so a crash
//! between the two writes leaves an orphan body, never a half-visible object.

use crate::error::{SwPackError, SwPackResult};
use crate::pack::fingerprint::content_digest;
use crate::store::{CacheStorage, CacheStore, CachedResponse};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tracing::debug;

const BODY_EXT: &str = "body";
const META_EXT: &str = "json";

/// Store capability backed by a directory tree
#[derive(Debug, Clone)]
pub struct DiskStorage {
    root: PathBuf,
}

impl DiskStorage {
    /// Create storage rooted at `root` (created lazily)
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Storage root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn store_dir(&self, name: &str) -> PathBuf {
        self.root.join(hex::encode(name.as_bytes()))
    }
}

/// Metadata persisted next to each body
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ObjectMeta {
    key: String,
    url: String,
    status: u16,
    content_type: Option<String>,
    size: u64,
    stored_at: DateTime<Utc>,
}

/// One directory-backed store
#[derive(Debug)]
pub struct DiskStore {
    name: String,
    dir: PathBuf,
}

impl DiskStore {
    fn object_path(&self, key: &str, ext: &str) -> PathBuf {
        self.dir
            .join(format!("{}.{}", content_digest(key.as_bytes()), ext))
    }

    fn err(&self, key: &str, e: impl ToString) -> SwPackError {
        SwPackError::store(&self.name, key, e)
    }

    async fn write_atomic(&self, key: &str, path: &Path, bytes: &[u8]) -> SwPackResult<()> {
        let mut tmp = path.as_os_str().to_owned();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        fs::write(&tmp, bytes).await.map_err(|e| self.err(key, e))?;
        fs::rename(&tmp, path).await.map_err(|e| self.err(key, e))
    }

    async fn read_meta(&self, key: &str) -> SwPackResult<Option<ObjectMeta>> {
        let path = self.object_path(key, META_EXT);
        match fs::read_to_string(&path).await {
            Ok(content) => {
                let meta = serde_json::from_str(&content).map_err(|e| self.err(key, e))?;
                Ok(Some(meta))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(self.err(key, e)),
        }
    }

    async fn list_meta(&self) -> SwPackResult<Vec<ObjectMeta>> {
        let mut entries = match fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(vec![]),
            Err(e) => return Err(SwPackError::store_unavailable(&self.name, e)),
        };

        let mut metas = vec![];
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| SwPackError::store_unavailable(&self.name, e))?
        {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == META_EXT) {
                let content = fs::read_to_string(&path).await.ok();
                match content.and_then(|c| serde_json::from_str::<ObjectMeta>(&c).ok()) {
                    Some(meta) => metas.push(meta),
                    None => debug!("Skipping unreadable metadata {}", path.display()),
                }
            }
        }
        Ok(metas)
    }
}

#[async_trait]
impl CacheStore for DiskStore {
    fn name(&self) -> &str {
        &self.name
    }

    async fn get(&self, key: &str) -> SwPackResult<Option<CachedResponse>> {
        let Some(meta) = self.read_meta(key).await? else {
            return Ok(None);
        };

        let body = fs::read(self.object_path(key, BODY_EXT))
            .await
            .map_err(|e| self.err(key, e))?;

        Ok(Some(CachedResponse {
            url: meta.url,
            status: meta.status,
            content_type: meta.content_type,
            body,
        }))
    }

    async fn put(&self, key: &str, response: &CachedResponse) -> SwPackResult<()> {
        let meta = ObjectMeta {
            key: key.to_string(),
            url: response.url.clone(),
            status: response.status,
            content_type: response.content_type.clone(),
            size: response.len() as u64,
            stored_at: Utc::now(),
        };
        let meta = serde_json::to_vec_pretty(&meta)?;

        self.write_atomic(key, &self.object_path(key, BODY_EXT), &response.body)
            .await?;
        self.write_atomic(key, &self.object_path(key, META_EXT), &meta)
            .await
    }

    async fn delete(&self, key: &str) -> SwPackResult<bool> {
        let existed = match fs::remove_file(self.object_path(key, META_EXT)).await {
            Ok(()) => true,
            Err(e) if e.kind() == ErrorKind::NotFound => false,
            Err(e) => return Err(self.err(key, e)),
        };

        match fs::remove_file(self.object_path(key, BODY_EXT)).await {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(self.err(key, e)),
        }
        Ok(existed)
    }

    async fn keys(&self) -> SwPackResult<Vec<String>> {
        let mut keys: Vec<String> = self.list_meta().await?.into_iter().map(|m| m.key).collect();
        keys.sort();
        Ok(keys)
    }

    async fn size_bytes(&self) -> SwPackResult<u64> {
        Ok(self.list_meta().await?.iter().map(|m| m.size).sum())
    }
}

#[async_trait]
impl CacheStorage for DiskStorage {
    async fn open(&self, name: &str) -> SwPackResult<Arc<dyn CacheStore>> {
        let dir = self.store_dir(name);
        fs::create_dir_all(&dir)
            .await
            .map_err(|e| SwPackError::store_unavailable(name, e))?;

        Ok(Arc::new(DiskStore {
            name: name.to_string(),
            dir,
        }))
    }

    async fn has(&self, name: &str) -> SwPackResult<bool> {
        fs::try_exists(self.store_dir(name))
            .await
            .map_err(|e| SwPackError::store_unavailable(name, e))
    }

    async fn names(&self) -> SwPackResult<Vec<String>> {
        let mut entries = match fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(vec![]),
            Err(e) => {
                return Err(SwPackError::store_unavailable(
                    self.root.display().to_string(),
                    e,
                ))
            }
        };

        let mut names = vec![];
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| SwPackError::io("reading store root", e))?
        {
            let is_dir = entry.file_type().await.map(|t| t.is_dir()).unwrap_or(false);
            if !is_dir {
                continue;
            }
            let decoded = hex::decode(entry.file_name().to_string_lossy().as_bytes())
                .ok()
                .and_then(|bytes| String::from_utf8(bytes).ok());
            match decoded {
                Some(name) => names.push(name),
                None => debug!("Ignoring foreign directory {}", entry.path().display()),
            }
        }

        names.sort();
        Ok(names)
    }

    async fn delete(&self, name: &str) -> SwPackResult<bool> {
        match fs::remove_dir_all(self.store_dir(name)).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(SwPackError::store(name, "*", e)),
        }
    }
}
