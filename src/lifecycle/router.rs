//! Request routing against the current pack
//!
//! Planning is pure: [`plan_route`] looks only at the request, the origin and
//! the current manifest. The controller then executes the plan against the
//! stores and the fetcher.

use crate::error::{SwPackError, SwPackResult};
use crate::pack::Manifest;
use crate::store::CachedResponse;
use percent_encoding::percent_decode_str;
use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

/// An intercepted outgoing request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    /// Absolute request URL
    pub url: Url,

    /// Whether the host flagged this as a top-level navigation
    pub navigate: bool,
}

impl Request {
    /// Plain subresource request
    pub fn get(url: &str) -> SwPackResult<Self> {
        let url = Url::parse(url).map_err(|e| SwPackError::User(format!("Invalid URL {}: {}", url, e)))?;
        Ok(Self {
            url,
            navigate: false,
        })
    }

    /// Top-level navigation request
    pub fn navigation(url: &str) -> SwPackResult<Self> {
        Ok(Self {
            navigate: true,
            ..Self::get(url)?
        })
    }
}

/// Same-origin paths answered with the entry point document
///
/// Patterns are absolute paths below the origin's base path. An exact
/// pattern matches literally; a pattern ending in `/*` matches any path
/// below that prefix whose last segment has no file extension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NavigationRules {
    patterns: Vec<String>,
}

impl Default for NavigationRules {
    fn default() -> Self {
        Self::new(["/", "/index.html"])
    }
}

impl NavigationRules {
    /// Rules from explicit patterns
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            patterns: patterns.into_iter().map(Into::into).collect(),
        }
    }

    /// Configured patterns
    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    /// Whether `path` (starting with `/`) resolves to the entry point
    pub fn matches(&self, path: &str, navigate: bool) -> bool {
        if navigate && !has_extension(path) {
            return true;
        }

        self.patterns.iter().any(|pattern| match pattern.strip_suffix("/*") {
            Some(prefix) => {
                let below = path
                    .strip_prefix(prefix)
                    .and_then(|rest| rest.strip_prefix('/'));
                matches!(below, Some(rest) if !has_extension(rest))
            }
            None => pattern == path,
        })
    }
}

fn has_extension(path: &str) -> bool {
    path.rsplit('/')
        .next()
        .is_some_and(|segment| segment.contains('.'))
}

/// Where a request is answered from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// The reserved entry point document from the current pack
    EntryPoint,
    /// The current manifest, read from the internal store
    Manifest,
    /// A same-origin object in the current pack, by key
    SameOrigin(String),
    /// A cross-origin URL listed in the current manifest
    External(String),
    /// Not intercepted
    Passthrough,
}

/// Router settings shared by planning and execution
#[derive(Debug, Clone)]
pub struct RouteSettings {
    /// Origin base URL, ending in `/`
    pub origin: Url,

    /// Entry point key in the pack store
    pub entry_point: String,

    /// Well-known manifest path below the origin
    pub manifest_path: String,

    /// Navigation patterns
    pub navigation: NavigationRules,
}

impl RouteSettings {
    /// Defaults for an origin
    pub fn new(origin: Url) -> Self {
        Self {
            origin,
            entry_point: "index.html".to_string(),
            manifest_path: crate::store::MANIFEST_KEY.to_string(),
            navigation: NavigationRules::default(),
        }
    }

    /// Decoded key of a same-origin URL relative to the origin base, without
    /// query. `None` when the path lies outside the base.
    fn relative_path(&self, url: &Url) -> Option<String> {
        let base = self.origin.path();
        let path = url.path();
        let relative = match path.strip_prefix(base) {
            Some(rest) => rest,
            None if base.strip_suffix('/') == Some(path) => "",
            None => return None,
        };
        Some(percent_decode_str(relative).decode_utf8_lossy().into_owned())
    }
}

/// Decide how to answer `request`
pub fn plan_route(request: &Request, settings: &RouteSettings, current: Option<&Manifest>) -> Route {
    let Some(manifest) = current else {
        return Route::Passthrough;
    };

    if request.url.origin() == settings.origin.origin() {
        let Some(relative) = settings.relative_path(&request.url) else {
            return Route::Passthrough;
        };

        if settings
            .navigation
            .matches(&format!("/{}", relative), request.navigate)
        {
            return Route::EntryPoint;
        }

        if relative == settings.manifest_path {
            return Route::Manifest;
        }

        let key = match request.url.query() {
            Some(query) => format!("{}?{}", relative, query),
            None => relative,
        };
        return Route::SameOrigin(key);
    }

    let listed = manifest
        .entries()
        .iter()
        .filter(|e| e.is_external())
        .find(|e| Url::parse(&e.path).is_ok_and(|u| u == request.url));

    match listed {
        Some(entry) => Route::External(entry.path.clone()),
        None => Route::Passthrough,
    }
}

/// Which layer produced a routed response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseSource {
    /// Current pack store
    Cache,
    /// Internal manifest store
    Internal,
    /// Live fetch after a miss
    Network,
}

impl fmt::Display for ResponseSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cache => write!(f, "cache"),
            Self::Internal => write!(f, "internal"),
            Self::Network => write!(f, "network"),
        }
    }
}

/// Result of routing one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteOutcome {
    /// Request left to normal network handling
    Passthrough,
    /// Request answered by the router
    Responded {
        response: CachedResponse,
        source: ResponseSource,
        /// The pack did not hold the object and the network was consulted
        cache_miss: bool,
    },
}

impl RouteOutcome {
    /// The response, if the router answered
    pub fn response(&self) -> Option<&CachedResponse> {
        match self {
            Self::Passthrough => None,
            Self::Responded { response, .. } => Some(response),
        }
    }

    /// Whether the answer came from the network after a cache miss
    pub fn is_cache_miss(&self) -> bool {
        matches!(self, Self::Responded { cache_miss: true, .. })
    }
}
