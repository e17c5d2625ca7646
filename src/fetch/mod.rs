//! Resource fetching for cache misses and `Fetch` decisions

mod http;

pub use http::{parse_origin, HttpFetcher};

use crate::error::{SwPackError, SwPackResult};
use crate::store::CachedResponse;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

/// Retrieves fresh bytes for a logical path or absolute URL
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetch `path`; errors surface as install failures or network fallbacks
    async fn fetch(&self, path: &str) -> SwPackResult<CachedResponse>;
}

/// Fetcher serving a fixed set of resources from memory
///
/// Records every requested path, in order.
#[derive(Debug, Default)]
pub struct StaticFetcher {
    resources: HashMap<String, CachedResponse>,
    requests: Mutex<Vec<String>>,
}

impl StaticFetcher {
    /// Create an empty fetcher
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a resource body under `path`
    pub fn with(mut self, path: &str, body: impl Into<Vec<u8>>) -> Self {
        self.resources
            .insert(path.to_string(), CachedResponse::new(path, body.into()));
        self
    }

    /// Serve `response` as-is under `path`, whatever its status
    pub fn with_response(mut self, path: &str, response: CachedResponse) -> Self {
        self.resources.insert(path.to_string(), response);
        self
    }

    /// Paths requested so far
    pub fn requests(&self) -> Vec<String> {
        self.requests
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl Fetcher for StaticFetcher {
    async fn fetch(&self, path: &str) -> SwPackResult<CachedResponse> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(path.to_string());
        }
        self.resources
            .get(path)
            .cloned()
            .ok_or_else(|| SwPackError::fetch(path, "404 Not Found"))
    }
}
