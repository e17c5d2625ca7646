//! Activation sweeps
//!
//! Two independent passes reclaim storage once a pack is current: the store
//! sweep deletes pack stores outside the retention window, and the snapshot
//! sweep deletes manifest snapshots outside it. Deletions run concurrently
//! and a failed deletion is recorded, never propagated.

use crate::error::SwPackResult;
use crate::pack::Manifest;
use crate::store::{
    fingerprint_from_store_name, pack_store_name, snapshot_key, CacheStorage, ManifestStore,
    INTERNAL_STORE, MANIFEST_KEY,
};
use futures_util::future::join_all;
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;
use tracing::{debug, info, warn};

/// Stores and snapshot keys an activation would delete
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SweepPlan {
    pub stores: Vec<String>,
    pub snapshots: Vec<String>,
}

impl SweepPlan {
    /// Whether there is nothing to delete
    pub fn is_empty(&self) -> bool {
        self.stores.is_empty() && self.snapshots.is_empty()
    }
}

/// Decide what to delete given the current manifest and what exists
pub fn plan_sweep(current: &Manifest, store_names: &[String], internal_keys: &[String]) -> SweepPlan {
    let retained: HashSet<&str> = std::iter::once(current.fingerprint())
        .chain(current.archived().iter().map(String::as_str))
        .collect();

    let keep_stores: HashSet<String> = retained.iter().map(|fp| pack_store_name(fp)).collect();
    let keep_keys: HashSet<String> = retained
        .iter()
        .map(|fp| snapshot_key(fp))
        .chain(std::iter::once(MANIFEST_KEY.to_string()))
        .collect();

    SweepPlan {
        stores: store_names
            .iter()
            .filter(|name| *name != INTERNAL_STORE && !keep_stores.contains(*name))
            .cloned()
            .collect(),
        snapshots: internal_keys
            .iter()
            .filter(|key| !keep_keys.contains(*key))
            .cloned()
            .collect(),
    }
}

/// Something a sweep tried to delete
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "name", rename_all = "lowercase")]
pub enum SweepTarget {
    Store(String),
    Snapshot(String),
}

impl fmt::Display for SweepTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Store(name) => write!(f, "store {}", name),
            Self::Snapshot(key) => write!(f, "snapshot {}", key),
        }
    }
}

/// A deletion that failed and was skipped
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SweepFailure {
    pub target: SweepTarget,
    pub reason: String,
}

/// Outcome of running both sweeps
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    pub removed_stores: Vec<String>,
    pub removed_snapshots: Vec<String>,
    pub failures: Vec<SweepFailure>,
}

impl SweepReport {
    /// Fingerprints whose pack store was removed
    pub fn evicted(&self) -> Vec<&str> {
        self.removed_stores
            .iter()
            .filter_map(|name| fingerprint_from_store_name(name))
            .collect()
    }
}

/// Enumerate stores and internal keys, then plan
pub async fn survey(
    storage: &dyn CacheStorage,
    manifests: &ManifestStore,
    current: &Manifest,
) -> SwPackResult<SweepPlan> {
    let (names, keys) = tokio::join!(storage.names(), manifests.keys());
    Ok(plan_sweep(current, &names?, &keys?))
}

/// Run both sweeps concurrently
pub async fn execute(
    storage: &dyn CacheStorage,
    manifests: &ManifestStore,
    plan: &SweepPlan,
) -> SweepReport {
    let store_sweep = join_all(plan.stores.iter().map(|name| async move {
        let result = storage.delete(name).await;
        (SweepTarget::Store(name.clone()), result)
    }));
    let snapshot_sweep = join_all(plan.snapshots.iter().map(|key| async move {
        let result = manifests.delete(key).await;
        (SweepTarget::Snapshot(key.clone()), result)
    }));

    let (stores, snapshots) = tokio::join!(store_sweep, snapshot_sweep);

    let mut report = SweepReport::default();
    for (target, result) in stores.into_iter().chain(snapshots) {
        match result {
            Ok(true) => {
                debug!("Deleted {}", target);
                match target {
                    SweepTarget::Store(name) => report.removed_stores.push(name),
                    SweepTarget::Snapshot(key) => report.removed_snapshots.push(key),
                }
            }
            Ok(false) => debug!("{} already gone", target),
            Err(e) => {
                warn!("Failed to delete {}: {}", target, e);
                report.failures.push(SweepFailure {
                    target,
                    reason: e.to_string(),
                });
            }
        }
    }

    info!(
        "Sweep removed {} stores and {} snapshots ({} failures)",
        report.removed_stores.len(),
        report.removed_snapshots.len(),
        report.failures.len()
    );
    report
}

/// Drop archived packs, oldest first, while their stores exceed `max_bytes`
///
/// Archived packs whose store is missing count as zero bytes.
pub async fn trim_to_ceiling(
    storage: &dyn CacheStorage,
    manifest: &Manifest,
    max_bytes: u64,
) -> SwPackResult<Manifest> {
    let mut sizes = Vec::with_capacity(manifest.archived().len());
    for fingerprint in manifest.archived() {
        let name = pack_store_name(fingerprint);
        let size = if storage.has(&name).await? {
            storage.open(&name).await?.size_bytes().await?
        } else {
            0
        };
        sizes.push(size);
    }

    let mut total: u64 = sizes.iter().sum();
    let mut keep = sizes.len();
    while total > max_bytes && keep > 0 {
        keep -= 1;
        total -= sizes[keep];
        info!(
            "Dropping archived pack {} over size ceiling ({} bytes)",
            manifest.archived()[keep],
            sizes[keep]
        );
    }

    let archived = manifest.archived()[..keep].to_vec();
    Ok(manifest.clone().with_archived(archived))
}
