//! HTTP fetcher over a blocking `ureq` agent
//!
//! Relative logical paths are resolved against the configured origin;
//! absolute URLs are fetched as-is. Any HTTP status is a response; only
//! transport failures are errors.

use crate::error::{SwPackError, SwPackResult};
use crate::fetch::Fetcher;
use crate::store::CachedResponse;
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Largest body accepted for a single resource
const MAX_BODY_BYTES: u64 = 64 * 1024 * 1024;

/// Fetcher issuing GET requests against an origin
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    origin: Url,
    agent: ureq::Agent,
}

impl HttpFetcher {
    /// Create a fetcher for `origin` with a per-request timeout
    pub fn new(origin: &str, timeout: Duration) -> SwPackResult<Self> {
        let origin = parse_origin(origin)?;
        let config = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .http_status_as_error(false)
            .build();

        Ok(Self {
            origin,
            agent: ureq::Agent::new_with_config(config),
        })
    }

    /// Origin that relative paths resolve against
    pub fn origin(&self) -> &Url {
        &self.origin
    }

    /// Absolute URL for a logical path
    pub fn resolve(&self, path: &str) -> SwPackResult<Url> {
        self.origin
            .join(path)
            .map_err(|e| SwPackError::fetch(path, e))
    }
}

/// Parse an origin, making sure it ends in `/` so relative joins append
pub fn parse_origin(origin: &str) -> SwPackResult<Url> {
    let mut url = Url::parse(origin).map_err(|e| SwPackError::OriginInvalid {
        url: origin.to_string(),
        reason: e.to_string(),
    })?;

    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

fn fetch_blocking(agent: &ureq::Agent, url: &str) -> SwPackResult<CachedResponse> {
    let mut response = agent
        .get(url)
        .call()
        .map_err(|e| SwPackError::fetch(url, e))?;

    let status = response.status().as_u16();
    let content_type = response
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let body = response
        .body_mut()
        .with_config()
        .limit(MAX_BODY_BYTES)
        .read_to_vec()
        .map_err(|e| SwPackError::fetch(url, e))?;

    Ok(CachedResponse {
        url: url.to_string(),
        status,
        content_type,
        body,
    })
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, path: &str) -> SwPackResult<CachedResponse> {
        let url = self.resolve(path)?.to_string();
        debug!("GET {}", url);

        let agent = self.agent.clone();
        tokio::task::spawn_blocking(move || fetch_blocking(&agent, &url))
            .await
            .map_err(|e| SwPackError::Internal(format!("fetch task failed: {}", e)))?
    }
}
