//! Pack lifecycle controller
//!
//! [`PackController`] owns the only mutable "current manifest" slot and
//! drives the three lifecycle triggers:
//!
//! - [`PackController::on_install`] populates a new pack store and promotes
//!   the manifest to current once every entry is stored
//! - [`PackController::on_activate`] bounds the archive and sweeps stores and
//!   snapshots outside the retention window
//! - [`PackController::on_request`] answers intercepted requests from the
//!   current pack, falling back to the network
//!
//! Readers take an `Arc<Manifest>` snapshot of the slot; install replaces it
//! in one step after the canonical pointer is written.

pub mod install;
pub mod router;
pub mod sweep;

pub use install::{EntryOutcome, InstallProgress, InstallReport};
pub use router::{NavigationRules, Request, ResponseSource, Route, RouteOutcome, RouteSettings};
pub use sweep::{SweepFailure, SweepPlan, SweepReport, SweepTarget};

use crate::audit::{AuditLog, PackEvent};
use crate::error::{SwPackError, SwPackResult};
use crate::fetch::Fetcher;
use crate::pack::{diff_entries, summarize, Manifest, PackState};
use crate::store::{
    fingerprint_from_store_name, pack_store_name, CacheStorage, CachedResponse, ManifestStore,
    INTERNAL_STORE, MANIFEST_KEY,
};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

/// Role of a store relative to the current manifest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreRole {
    Current,
    Archived,
    Internal,
    /// Outside the retention window; the next activation deletes it
    Stale,
}

/// One store as seen by `status`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoreInfo {
    pub name: String,
    pub role: StoreRole,
    pub size_bytes: u64,
    pub state: Option<PackState>,
}

/// Result of an activation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActivationReport {
    pub fingerprint: String,
    pub archived: Vec<String>,
    /// Archived packs dropped to satisfy the retention bounds
    pub dropped: Vec<String>,
    pub sweep: SweepReport,
}

/// Orchestrates install, activation and routing over a store capability
pub struct PackController {
    storage: Arc<dyn CacheStorage>,
    fetcher: Arc<dyn Fetcher>,
    routes: RouteSettings,
    max_archive_bytes: Option<u64>,
    journal: AuditLog,
    current: RwLock<Option<Arc<Manifest>>>,
    states: Mutex<HashMap<String, PackState>>,
    install_lock: Mutex<()>,
}

impl PackController {
    /// Create a controller; the current manifest is loaded lazily from storage
    pub fn new(
        storage: Arc<dyn CacheStorage>,
        fetcher: Arc<dyn Fetcher>,
        routes: RouteSettings,
    ) -> Self {
        Self {
            storage,
            fetcher,
            routes,
            max_archive_bytes: None,
            journal: AuditLog::disabled(),
            current: RwLock::new(None),
            states: Mutex::new(HashMap::new()),
            install_lock: Mutex::new(()),
        }
    }

    /// Bound the combined size of archived packs
    pub fn with_size_ceiling(mut self, max_bytes: Option<u64>) -> Self {
        self.max_archive_bytes = max_bytes;
        self
    }

    /// Record lifecycle events to `journal`
    pub fn with_journal(mut self, journal: AuditLog) -> Self {
        self.journal = journal;
        self
    }

    pub fn routes(&self) -> &RouteSettings {
        &self.routes
    }

    /// Snapshot of the current manifest
    pub async fn current(&self) -> SwPackResult<Option<Arc<Manifest>>> {
        if let Some(current) = self.current.read().await.clone() {
            return Ok(Some(current));
        }

        // Reading must not create the internal store
        if !self.storage.has(INTERNAL_STORE).await? {
            return Ok(None);
        }
        let manifests = ManifestStore::open(self.storage.as_ref()).await?;
        let Some(loaded) = manifests.load_current().await? else {
            return Ok(None);
        };

        self.seed(&loaded).await;
        let loaded = Arc::new(loaded);
        let mut slot = self.current.write().await;
        // An install may have filled the slot while we were loading
        Ok(Some(slot.get_or_insert(loaded).clone()))
    }

    /// Known lifecycle state of a pack version
    pub async fn state_of(&self, fingerprint: &str) -> Option<PackState> {
        self.states.lock().await.get(fingerprint).copied()
    }

    async fn swap(&self, manifest: Manifest) -> Arc<Manifest> {
        let manifest = Arc::new(manifest);
        *self.current.write().await = Some(manifest.clone());
        manifest
    }

    /// Record states implied by a persisted manifest without overriding known ones
    async fn seed(&self, manifest: &Manifest) {
        let mut states = self.states.lock().await;
        states
            .entry(manifest.fingerprint().to_string())
            .or_insert(PackState::Installed);
        for fingerprint in manifest.archived() {
            states
                .entry(fingerprint.clone())
                .or_insert(PackState::Archived);
        }
    }

    async fn transition(&self, fingerprint: &str, next: PackState) {
        let mut states = self.states.lock().await;
        match states.get(fingerprint) {
            Some(from) if *from != next && !from.can_transition_to(next) => {
                warn!("Unexpected pack transition {} -> {} for {}", from, next, fingerprint);
            }
            Some(from) => debug!("Pack {}: {} -> {}", fingerprint, from, next),
            None => debug!("Pack {}: {}", fingerprint, next),
        }
        states.insert(fingerprint.to_string(), next);
    }

    /// Install `incoming` and promote it to current
    pub async fn on_install(&self, incoming: &Manifest) -> SwPackResult<InstallReport> {
        self.install_with_progress(incoming, &|_| {}).await
    }

    /// Install with a callback per settled entry
    ///
    /// Concurrent installs on one controller run one at a time.
    pub async fn install_with_progress(
        &self,
        incoming: &Manifest,
        progress: InstallProgress<'_>,
    ) -> SwPackResult<InstallReport> {
        let _guard = self.install_lock.lock().await;
        let attempt = Uuid::new_v4();
        let span = info_span!("install", %attempt, pack = %incoming.fingerprint());
        self.install_locked(attempt, incoming, progress)
            .instrument(span)
            .await
    }

    async fn install_locked(
        &self,
        attempt: Uuid,
        incoming: &Manifest,
        progress: InstallProgress<'_>,
    ) -> SwPackResult<InstallReport> {
        let fingerprint = incoming.fingerprint();
        let manifests = ManifestStore::open(self.storage.as_ref()).await?;
        let previous = manifests.load_current().await?;

        if let Some(previous) = &previous {
            self.seed(previous).await;
            if previous.fingerprint() == fingerprint {
                info!("Pack {} is already current", fingerprint);
                let persisted = incoming.succeeding(Some(previous));
                manifests.save(&persisted).await?;
                let persisted = self.swap(persisted).await;
                return Ok(InstallReport::unchanged(attempt, &persisted));
            }
        }

        let store_name = pack_store_name(fingerprint);
        let store_existed = self.storage.has(&store_name).await?;

        if matches!(
            self.state_of(fingerprint).await,
            Some(PackState::Archived | PackState::Evicted)
        ) {
            self.transition(fingerprint, PackState::Pending).await;
        }
        self.transition(fingerprint, PackState::Installing).await;

        let decisions = diff_entries(incoming, previous.as_ref());
        let (reuse, fetch) = summarize(&decisions);
        info!(
            "Installing {} entries ({} reuse, {} fetch)",
            decisions.len(),
            reuse,
            fetch
        );

        let result = async {
            let tally = install::populate(
                self.storage.as_ref(),
                self.fetcher.as_ref(),
                incoming,
                previous.as_ref(),
                progress,
            )
            .await?;
            let persisted = incoming.succeeding(previous.as_ref());
            // Pointer is written last, after every entry is stored
            manifests.save(&persisted).await?;
            Ok::<_, SwPackError>((tally, persisted))
        }
        .await;

        let (tally, persisted) = match result {
            Ok(done) => done,
            Err(e) => {
                warn!("Install of {} failed: {}", fingerprint, e);
                self.transition(fingerprint, PackState::Pending).await;
                if !store_existed {
                    if let Err(e) = self.storage.delete(&store_name).await {
                        warn!("Failed to remove partial store {}: {}", store_name, e);
                    }
                }
                let (failed, total) = match &e {
                    SwPackError::InstallAborted { failed, total, .. } => (*failed, *total),
                    _ => (0, incoming.entries().len()),
                };
                self.journal
                    .record(&PackEvent::InstallFailed {
                        attempt,
                        fingerprint: fingerprint.to_string(),
                        failed,
                        total,
                        reason: e.to_string(),
                    })
                    .await;
                return Err(e);
            }
        };

        let persisted = self.swap(persisted).await;
        self.transition(fingerprint, PackState::Installed).await;
        if let Some(previous) = &previous {
            self.transition(previous.fingerprint(), PackState::Archived)
                .await;
        }

        let report = InstallReport {
            attempt,
            fingerprint: fingerprint.to_string(),
            previous: previous.as_ref().map(|p| p.fingerprint().to_string()),
            reused: tally.reused,
            fetched: tally.fetched,
            refetched: tally.refetched,
            unchanged: false,
            archived: persisted.archived().to_vec(),
        };

        info!(
            "Installed pack {} ({} reused, {} fetched)",
            fingerprint,
            report.reused,
            report.fetched + report.refetched
        );
        self.journal
            .record(&PackEvent::Installed {
                attempt,
                fingerprint: report.fingerprint.clone(),
                previous: report.previous.clone(),
                reused: report.reused,
                fetched: report.fetched + report.refetched,
            })
            .await;
        Ok(report)
    }

    /// Current manifest with the archive bounded by count and size ceiling
    async fn bounded(&self) -> SwPackResult<(Arc<Manifest>, Manifest)> {
        let current = self.current().await?.ok_or(SwPackError::NoCurrentPack)?;
        let mut bounded = current.truncate_archive();
        if let Some(max_bytes) = self.max_archive_bytes {
            bounded = sweep::trim_to_ceiling(self.storage.as_ref(), &bounded, max_bytes).await?;
        }
        Ok((current, bounded))
    }

    /// What an activation would delete, without deleting anything
    pub async fn preview_activation(&self) -> SwPackResult<SweepPlan> {
        let (_, bounded) = self.bounded().await?;
        let manifests = ManifestStore::open(self.storage.as_ref()).await?;
        sweep::survey(self.storage.as_ref(), &manifests, &bounded).await
    }

    /// Bound the archive and run both sweeps
    pub async fn on_activate(&self) -> SwPackResult<ActivationReport> {
        let (current, bounded) = self.bounded().await?;
        let manifests = ManifestStore::open(self.storage.as_ref()).await?;

        let dropped: Vec<String> = current
            .archived()
            .iter()
            .filter(|fp| !bounded.retains(fp))
            .cloned()
            .collect();

        let active = if bounded != *current {
            info!("Archive bounded to {} packs", bounded.archived().len());
            manifests.save(&bounded).await?;
            self.swap(bounded).await
        } else {
            current
        };

        let plan = sweep::survey(self.storage.as_ref(), &manifests, &active).await?;
        let report = sweep::execute(self.storage.as_ref(), &manifests, &plan).await;

        for fingerprint in report.evicted() {
            self.transition(fingerprint, PackState::Evicted).await;
            self.journal
                .record(&PackEvent::Evicted {
                    fingerprint: fingerprint.to_string(),
                })
                .await;
        }

        self.journal
            .record(&PackEvent::Activated {
                fingerprint: active.fingerprint().to_string(),
                archived: active.archived().to_vec(),
                removed_stores: report.removed_stores.len(),
                removed_snapshots: report.removed_snapshots.len(),
                failures: report.failures.len(),
            })
            .await;

        Ok(ActivationReport {
            fingerprint: active.fingerprint().to_string(),
            archived: active.archived().to_vec(),
            dropped,
            sweep: report,
        })
    }

    /// Answer an intercepted request
    ///
    /// Never fails: store trouble degrades to passthrough and network trouble
    /// to a network-error response.
    pub async fn on_request(&self, request: &Request) -> RouteOutcome {
        let current = match self.current().await {
            Ok(current) => current,
            Err(e) => {
                warn!("No pack available for {}: {}", request.url, e);
                return RouteOutcome::Passthrough;
            }
        };

        let route = router::plan_route(request, &self.routes, current.as_deref());
        debug!("{} -> {:?}", request.url, route);

        match self.serve(&route, current.as_deref()).await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!("Routing {} failed, passing through: {}", request.url, e);
                RouteOutcome::Passthrough
            }
        }
    }

    async fn serve(&self, route: &Route, current: Option<&Manifest>) -> SwPackResult<RouteOutcome> {
        let key = match route {
            Route::Passthrough => return Ok(RouteOutcome::Passthrough),
            Route::Manifest => {
                let manifests = ManifestStore::open(self.storage.as_ref()).await?;
                if let Some(response) = manifests.read_raw(MANIFEST_KEY).await? {
                    return Ok(RouteOutcome::Responded {
                        response,
                        source: ResponseSource::Internal,
                        cache_miss: false,
                    });
                }
                return Ok(self.from_network(&self.routes.manifest_path).await);
            }
            Route::EntryPoint => self.routes.entry_point.as_str(),
            Route::SameOrigin(key) | Route::External(key) => key.as_str(),
        };

        let Some(current) = current else {
            return Ok(RouteOutcome::Passthrough);
        };

        let name = pack_store_name(current.fingerprint());
        if self.storage.has(&name).await? {
            let store = self.storage.open(&name).await?;
            if let Some(response) = store.get(key).await? {
                return Ok(RouteOutcome::Responded {
                    response,
                    source: ResponseSource::Cache,
                    cache_miss: false,
                });
            }
        }

        if *route == Route::EntryPoint {
            warn!("{} is not cached in pack {}", key, current.fingerprint());
        } else {
            debug!("Cache miss for {}", key);
        }
        Ok(self.from_network(key).await)
    }

    async fn from_network(&self, key: &str) -> RouteOutcome {
        let response = match self.fetcher.fetch(key).await {
            Ok(response) => response,
            Err(e) => {
                warn!("Network fallback for {} failed: {}", key, e);
                CachedResponse::network_error(key)
            }
        };
        RouteOutcome::Responded {
            response,
            source: ResponseSource::Network,
            cache_miss: true,
        }
    }

    /// Every store with its role, size and known state
    pub async fn inventory(&self) -> SwPackResult<Vec<StoreInfo>> {
        let current = self.current().await?;
        let mut stores = Vec::new();

        for name in self.storage.names().await? {
            let fingerprint = fingerprint_from_store_name(&name);
            let role = match (&current, fingerprint) {
                _ if name == INTERNAL_STORE => StoreRole::Internal,
                (Some(current), Some(fp)) if current.fingerprint() == fp => StoreRole::Current,
                (Some(current), Some(fp)) if current.retains(fp) => StoreRole::Archived,
                _ => StoreRole::Stale,
            };
            let size_bytes = self.storage.open(&name).await?.size_bytes().await?;
            let state = match fingerprint {
                Some(fp) => self.state_of(fp).await,
                None => None,
            };
            stores.push(StoreInfo {
                name,
                role,
                size_bytes,
                state,
            });
        }
        Ok(stores)
    }

    /// Delete every store, the internal one included, and forget the current pack
    pub async fn purge(&self) -> SwPackResult<Vec<String>> {
        let _guard = self.install_lock.lock().await;
        let mut removed = Vec::new();
        for name in self.storage.names().await? {
            if self.storage.delete(&name).await? {
                removed.push(name);
            }
        }
        *self.current.write().await = None;
        self.states.lock().await.clear();
        info!("Purged {} stores", removed.len());
        Ok(removed)
    }
}
