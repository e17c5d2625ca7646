//! Offline manifest builder
//!
//! Turns a list of local files and absolute URLs into a manifest: inputs are
//! resolved against a root directory, deduplicated in order, digested
//! concurrently, and recorded relative to the root.

use crate::error::{SwPackError, SwPackResult};
use crate::fetch::Fetcher;
use crate::pack::fingerprint::content_digest;
use crate::pack::manifest::{is_http, Manifest, PackEntry};
use crate::store::MANIFEST_KEY;
use futures_util::future::try_join_all;
use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

/// Default number of prior packs kept installed
pub const DEFAULT_ARCHIVE_VERSIONS: u32 = 1;

/// One resolved builder input
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum BuildInput {
    /// Absolute, normalized path of a local file
    Local(PathBuf),
    /// Absolute http(s) URL
    Remote(String),
}

/// Builds manifests from local files and remote URLs
#[derive(Debug, Clone)]
pub struct ManifestBuilder {
    root: PathBuf,
    archive_versions: u32,
    version: Option<String>,
}

impl ManifestBuilder {
    /// Builder resolving relative inputs against `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            archive_versions: DEFAULT_ARCHIVE_VERSIONS,
            version: None,
        }
    }

    /// Set how many prior packs stay installed
    pub fn archive_versions(mut self, n: u32) -> Self {
        self.archive_versions = n;
        self
    }

    /// Set the version label
    pub fn version(mut self, version: Option<String>) -> Self {
        self.version = version;
        self
    }

    fn absolute_root(&self) -> SwPackResult<PathBuf> {
        if self.root.is_absolute() {
            return Ok(normalize(&self.root));
        }
        let cwd = std::env::current_dir()
            .map_err(|e| SwPackError::io("resolving current directory", e))?;
        Ok(normalize(&cwd.join(&self.root)))
    }

    /// Resolve inputs against the root, dropping duplicates but keeping first-seen order
    pub fn resolve_inputs(&self, inputs: &[String]) -> SwPackResult<Vec<BuildInput>> {
        let root = self.absolute_root()?;
        let mut seen = HashSet::new();

        Ok(inputs
            .iter()
            .map(|input| {
                if is_http(input) {
                    BuildInput::Remote(input.clone())
                } else {
                    BuildInput::Local(normalize(&root.join(input)))
                }
            })
            .filter(|input| seen.insert(input.clone()))
            .collect())
    }

    /// Digest every input and assemble the manifest
    pub async fn build(&self, inputs: &[String], fetcher: &dyn Fetcher) -> SwPackResult<Manifest> {
        if inputs.is_empty() {
            return Err(SwPackError::EmptyPack);
        }

        let root = self.absolute_root()?;
        let resolved = self.resolve_inputs(inputs)?;
        debug!(
            "Hashing {} inputs ({} duplicates dropped)",
            resolved.len(),
            inputs.len() - resolved.len()
        );

        let entries = try_join_all(
            resolved
                .iter()
                .map(|input| digest_input(&root, input, fetcher)),
        )
        .await?;

        let mut manifest = Manifest::new(entries, self.archive_versions)?;
        if let Some(version) = &self.version {
            manifest = manifest.with_version(version.clone());
        }

        info!(
            "Built pack {} with {} entries",
            manifest.fingerprint(),
            manifest.entries().len()
        );
        Ok(manifest)
    }

    /// Where `out` points when given, else `<root>/sw-pack.json`
    ///
    /// An `out` without a file extension is a directory.
    pub fn output_path(&self, out: Option<&Path>) -> SwPackResult<PathBuf> {
        let root = self.absolute_root()?;
        Ok(match out {
            None => root.join(MANIFEST_KEY),
            Some(out) => {
                let out = normalize(&root.join(out));
                if out.extension().is_none() {
                    out.join(MANIFEST_KEY)
                } else {
                    out
                }
            }
        })
    }

    /// Write `manifest` as JSON, creating parent directories
    pub async fn write(&self, manifest: &Manifest, out: Option<&Path>) -> SwPackResult<PathBuf> {
        let path = self.output_path(out)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| SwPackError::io(format!("creating {}", parent.display()), e))?;
        }

        fs::write(&path, manifest.to_json()?)
            .await
            .map_err(|e| SwPackError::io(format!("writing {}", path.display()), e))?;

        debug!("Wrote manifest to {}", path.display());
        Ok(path)
    }
}

async fn digest_input(
    root: &Path,
    input: &BuildInput,
    fetcher: &dyn Fetcher,
) -> SwPackResult<PackEntry> {
    match input {
        BuildInput::Remote(url) => {
            let response = fetcher.fetch(url).await?;
            if !response.is_ok() {
                return Err(SwPackError::fetch(url, format!("status {}", response.status)));
            }
            Ok(PackEntry::new(url.clone(), content_digest(&response.body)))
        }
        BuildInput::Local(path) => {
            let bytes = match fs::read(path).await {
                Ok(bytes) => bytes,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    return Err(SwPackError::PathNotFound(path.clone()))
                }
                Err(e) => return Err(SwPackError::io(format!("reading {}", path.display()), e)),
            };
            Ok(PackEntry::new(relative_to(root, path)?, content_digest(&bytes)))
        }
    }
}

/// Root-relative logical path with `/` separators
fn relative_to(root: &Path, path: &Path) -> SwPackResult<String> {
    let relative = path
        .strip_prefix(root)
        .map_err(|_| SwPackError::PathInvalid {
            path: path.to_path_buf(),
            reason: format!("outside pack root {}", root.display()),
        })?;

    let parts: Vec<String> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();

    if parts.is_empty() {
        return Err(SwPackError::PathInvalid {
            path: path.to_path_buf(),
            reason: "is the pack root itself".to_string(),
        });
    }
    Ok(parts.join("/"))
}

/// Lexically remove `.` and `..` components
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::StaticFetcher;
    use crate::store::CachedResponse;
    use tempfile::TempDir;

    const CDN: &str = "https://cdnjs.cloudflare.com/ajax/libs/trianglify/0.4.0/trianglify.min.js";

    fn fixture() -> TempDir {
        let temp = TempDir::new().unwrap();
        std::fs::create_dir_all(temp.path().join("css")).unwrap();
        std::fs::write(temp.path().join("index.html"), "<html></html>").unwrap();
        std::fs::write(temp.path().join("css/site.css"), "body {}").unwrap();
        temp
    }

    fn inputs(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn normalize_drops_dot_segments() {
        assert_eq!(
            normalize(Path::new("/a/./b/../c")),
            PathBuf::from("/a/c")
        );
    }

    #[test]
    fn resolve_dedupes_in_order() {
        let temp = fixture();
        let builder = ManifestBuilder::new(temp.path());
        let resolved = builder
            .resolve_inputs(&inputs(&["index.html", "./css/../index.html", CDN, CDN]))
            .unwrap();

        assert_eq!(
            resolved,
            vec![
                BuildInput::Local(temp.path().join("index.html")),
                BuildInput::Remote(CDN.to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn builds_relative_entries_in_order() {
        let temp = fixture();
        let fetcher = StaticFetcher::new().with(CDN, "trianglify()");
        let builder = ManifestBuilder::new(temp.path())
            .archive_versions(2)
            .version(Some("0.0.1".to_string()));

        let manifest = builder
            .build(&inputs(&["index.html", "css/site.css", CDN]), &fetcher)
            .await
            .unwrap();

        let paths: Vec<&str> = manifest.entries().iter().map(|e| e.path.as_str()).collect();
        assert_eq!(paths, vec!["index.html", "css/site.css", CDN]);
        assert_eq!(manifest.entries()[0].hash, content_digest(b"<html></html>"));
        assert_eq!(manifest.entries()[2].hash, content_digest(b"trianglify()"));
        assert_eq!(manifest.archive_versions(), 2);
        assert_eq!(manifest.version(), Some("0.0.1"));
    }

    #[tokio::test]
    async fn same_inputs_same_fingerprint() {
        let temp = fixture();
        let fetcher = StaticFetcher::new();
        let builder = ManifestBuilder::new(temp.path());

        let a = builder.build(&inputs(&["index.html"]), &fetcher).await.unwrap();
        let b = builder.build(&inputs(&["index.html"]), &fetcher).await.unwrap();
        assert_eq!(a.fingerprint(), b.fingerprint());
    }

    #[tokio::test]
    async fn missing_file_fails() {
        let temp = fixture();
        let err = ManifestBuilder::new(temp.path())
            .build(&inputs(&["demø.html"]), &StaticFetcher::new())
            .await
            .unwrap_err();
        assert!(matches!(err, SwPackError::PathNotFound(_)));
    }

    #[tokio::test]
    async fn unreachable_url_fails() {
        let temp = fixture();
        let err = ManifestBuilder::new(temp.path())
            .build(&inputs(&[CDN]), &StaticFetcher::new())
            .await
            .unwrap_err();
        assert!(matches!(err, SwPackError::Fetch { .. }));
    }

    #[tokio::test]
    async fn error_status_from_remote_fails() {
        let temp = fixture();
        let fetcher = StaticFetcher::new().with_response(
            CDN,
            CachedResponse::new(CDN, b"<h1>Not Found</h1>".to_vec()).with_status(404),
        );
        let err = ManifestBuilder::new(temp.path())
            .build(&inputs(&["index.html", CDN]), &fetcher)
            .await
            .unwrap_err();
        match err {
            SwPackError::Fetch { reason, .. } => assert_eq!(reason, "status 404"),
            other => panic!("expected fetch error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn file_outside_root_is_rejected() {
        let temp = fixture();
        let outside = TempDir::new().unwrap();
        let stray = outside.path().join("stray.js");
        std::fs::write(&stray, "x").unwrap();

        let err = ManifestBuilder::new(temp.path())
            .build(&[stray.display().to_string()], &StaticFetcher::new())
            .await
            .unwrap_err();
        assert!(matches!(err, SwPackError::PathInvalid { .. }));
    }

    #[tokio::test]
    async fn nothing_to_cache_is_an_error() {
        let err = ManifestBuilder::new(".")
            .build(&[], &StaticFetcher::new())
            .await
            .unwrap_err();
        assert!(matches!(err, SwPackError::EmptyPack));
    }

    #[test]
    fn output_path_defaults_and_directories() {
        let temp = fixture();
        let builder = ManifestBuilder::new(temp.path());

        assert_eq!(
            builder.output_path(None).unwrap(),
            temp.path().join("sw-pack.json")
        );
        assert_eq!(
            builder.output_path(Some(Path::new("dist"))).unwrap(),
            temp.path().join("dist/sw-pack.json")
        );
        assert_eq!(
            builder.output_path(Some(Path::new("dist/pack.json"))).unwrap(),
            temp.path().join("dist/pack.json")
        );
    }

    #[tokio::test]
    async fn write_creates_parent_and_parses_back() {
        let temp = fixture();
        let builder = ManifestBuilder::new(temp.path());
        let manifest = builder
            .build(&inputs(&["index.html"]), &StaticFetcher::new())
            .await
            .unwrap();

        let path = builder
            .write(&manifest, Some(Path::new("dist")))
            .await
            .unwrap();
        let content = std::fs::read_to_string(path).unwrap();
        assert_eq!(Manifest::from_json(&content).unwrap(), manifest);
    }
}
