//! Install orchestration
//!
//! Every incoming entry is handled concurrently: reused entries are copied
//! from the previous pack's store, the rest are fetched. The attempt waits
//! for all entries to settle and succeeds only if none failed.

use crate::error::{SwPackError, SwPackResult};
use crate::fetch::Fetcher;
use crate::pack::{diff_entries, EntryDecision, Manifest, PackEntry};
use crate::store::{copy_entry, pack_store_name, CacheStorage, CacheStore};
use futures_util::future::join_all;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

/// What happened to one entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum EntryOutcome {
    /// Copied from the previous pack's store
    Reused { path: String, from: String },
    /// Fetched fresh bytes
    Fetched { path: String, bytes: usize },
    /// Reuse found nothing in the previous store; fetched instead
    Refetched { path: String, bytes: usize },
    /// Copy or fetch failed
    Failed { path: String, reason: String },
}

impl EntryOutcome {
    /// Logical path of the entry
    pub fn path(&self) -> &str {
        match self {
            Self::Reused { path, .. }
            | Self::Fetched { path, .. }
            | Self::Refetched { path, .. }
            | Self::Failed { path, .. } => path,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

/// Progress callback invoked once per settled entry
pub type InstallProgress<'a> = &'a (dyn Fn(&EntryOutcome) + Send + Sync);

/// Summary of a completed install
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstallReport {
    /// Attempt id, also recorded in the journal
    pub attempt: Uuid,
    pub fingerprint: String,
    pub previous: Option<String>,
    pub reused: usize,
    pub fetched: usize,
    pub refetched: usize,
    /// The incoming pack was already current; no entries were touched
    pub unchanged: bool,
    /// Archive list persisted with the new current manifest
    pub archived: Vec<String>,
}

impl InstallReport {
    pub(crate) fn unchanged(attempt: Uuid, manifest: &Manifest) -> Self {
        Self {
            attempt,
            fingerprint: manifest.fingerprint().to_string(),
            previous: Some(manifest.fingerprint().to_string()),
            reused: 0,
            fetched: 0,
            refetched: 0,
            unchanged: true,
            archived: manifest.archived().to_vec(),
        }
    }
}

/// Per-entry counts of a successful population
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EntryTally {
    pub reused: usize,
    pub fetched: usize,
    pub refetched: usize,
}

/// Fetch `path` and store it under the same key
async fn fetch_into(
    fetcher: &dyn Fetcher,
    target: &dyn CacheStore,
    path: &str,
) -> SwPackResult<usize> {
    let response = fetcher.fetch(path).await?;
    if !response.is_ok() {
        return Err(SwPackError::fetch(path, format!("status {}", response.status)));
    }
    target.put(path, &response).await?;
    Ok(response.len())
}

async fn install_entry(
    fetcher: &dyn Fetcher,
    source: Option<&dyn CacheStore>,
    target: &dyn CacheStore,
    entry: &PackEntry,
    decision: &EntryDecision,
) -> SwPackResult<EntryOutcome> {
    match decision {
        EntryDecision::Reuse(old) => {
            if let Some(source) = source {
                if copy_entry(source, target, &old.path, &entry.path).await? {
                    debug!("Reused {} from {}", entry.path, old.path);
                    return Ok(EntryOutcome::Reused {
                        path: entry.path.clone(),
                        from: old.path.clone(),
                    });
                }
            }
            warn!("{} missing from previous pack, fetching", old.path);
            let bytes = fetch_into(fetcher, target, &entry.path).await?;
            Ok(EntryOutcome::Refetched {
                path: entry.path.clone(),
                bytes,
            })
        }
        EntryDecision::Fetch(_) => {
            let bytes = fetch_into(fetcher, target, &entry.path).await?;
            debug!("Fetched {} ({} bytes)", entry.path, bytes);
            Ok(EntryOutcome::Fetched {
                path: entry.path.clone(),
                bytes,
            })
        }
    }
}

/// Populate the incoming pack's store, reusing what `previous` already holds
///
/// Fails with [`SwPackError::InstallAborted`] if any entry failed, after
/// every entry has settled.
pub async fn populate(
    storage: &dyn CacheStorage,
    fetcher: &dyn Fetcher,
    incoming: &Manifest,
    previous: Option<&Manifest>,
    progress: InstallProgress<'_>,
) -> SwPackResult<EntryTally> {
    let target = storage.open(&pack_store_name(incoming.fingerprint())).await?;
    let source: Option<Arc<dyn CacheStore>> = match previous {
        Some(previous) => {
            let name = pack_store_name(previous.fingerprint());
            if storage.has(&name).await? {
                Some(storage.open(&name).await?)
            } else {
                warn!("Store {} is gone, reused entries will be fetched", name);
                None
            }
        }
        None => None,
    };

    let decisions = diff_entries(incoming, previous);
    let total = decisions.len();

    let results = join_all(decisions.iter().map(|(entry, decision)| {
        let target = target.as_ref();
        let source = source.as_deref();
        async move {
            let result = install_entry(fetcher, source, target, entry, decision).await;
            let outcome = match &result {
                Ok(outcome) => outcome.clone(),
                Err(e) => EntryOutcome::Failed {
                    path: entry.path.clone(),
                    reason: e.to_string(),
                },
            };
            progress(&outcome);
            result
        }
    }))
    .await;

    let mut tally = EntryTally::default();
    let mut failed = 0;
    let mut first_error = None;
    for result in results {
        match result {
            Ok(EntryOutcome::Reused { .. }) => tally.reused += 1,
            Ok(EntryOutcome::Fetched { .. }) => tally.fetched += 1,
            Ok(EntryOutcome::Refetched { .. }) => tally.refetched += 1,
            Ok(EntryOutcome::Failed { .. }) => failed += 1,
            Err(e) => {
                failed += 1;
                first_error.get_or_insert(e);
            }
        }
    }

    if let Some(source) = first_error {
        return Err(SwPackError::InstallAborted {
            fingerprint: incoming.fingerprint().to_string(),
            failed,
            total,
            source: Box::new(source),
        });
    }
    Ok(tally)
}
