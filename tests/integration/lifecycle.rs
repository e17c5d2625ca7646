//! Lifecycle scenarios against in-memory stores and scripted fetchers

use std::sync::Arc;
use swpack::fetch::StaticFetcher;
use swpack::lifecycle::{PackController, Request, ResponseSource, RouteOutcome, RouteSettings};
use swpack::pack::{Manifest, PackEntry, PackState};
use swpack::store::{
    pack_store_name, CacheStorage, CacheStore, CachedResponse, ManifestStore, MemoryStorage,
    INTERNAL_STORE,
};
use swpack::SwPackError;
use url::Url;

const ORIGIN: &str = "https://app.example.com/";

fn controller(storage: &Arc<MemoryStorage>, fetcher: StaticFetcher) -> PackController {
    let routes = RouteSettings::new(Url::parse(ORIGIN).unwrap());
    PackController::new(storage.clone(), Arc::new(fetcher), routes)
}

fn pack(entries: &[(&str, &str)], keep: u32) -> Manifest {
    Manifest::new(
        entries.iter().map(|(p, h)| PackEntry::new(*p, *h)).collect(),
        keep,
    )
    .unwrap()
}

async fn keys_of(storage: &MemoryStorage, name: &str) -> Vec<String> {
    storage.open(name).await.unwrap().keys().await.unwrap()
}

async fn snapshot_keys(storage: &MemoryStorage) -> Vec<String> {
    ManifestStore::open(storage)
        .await
        .unwrap()
        .keys()
        .await
        .unwrap()
}

#[tokio::test]
async fn first_install_creates_store_and_pointer() {
    let storage = Arc::new(MemoryStorage::new());
    let ctl = controller(&storage, StaticFetcher::new().with("x", "one"));
    let a = pack(&[("x", "1")], 1);

    let report = ctl.on_install(&a).await.unwrap();

    assert_eq!(report.fetched, 1);
    assert_eq!(report.reused, 0);
    assert!(report.previous.is_none());
    assert_eq!(keys_of(&storage, &pack_store_name(a.fingerprint())).await, ["x"]);
    let current = ctl.current().await.unwrap().unwrap();
    assert_eq!(current.fingerprint(), a.fingerprint());
}

#[tokio::test]
async fn second_install_reuses_by_fingerprint_and_archives_previous() {
    let storage = Arc::new(MemoryStorage::new());
    let fetcher = StaticFetcher::new().with("x", "one").with("y", "two");
    let ctl = controller(&storage, fetcher);
    let a = pack(&[("x", "1")], 1);
    let b = pack(&[("x", "1"), ("y", "2")], 1);

    ctl.on_install(&a).await.unwrap();
    let report = ctl.on_install(&b).await.unwrap();

    assert_eq!(report.reused, 1);
    assert_eq!(report.fetched, 1);
    assert_eq!(report.previous.as_deref(), Some(a.fingerprint()));

    let current = ctl.current().await.unwrap().unwrap();
    assert_eq!(current.fingerprint(), b.fingerprint());
    assert_eq!(current.archived(), [a.fingerprint().to_string()]);
    assert_eq!(ctl.state_of(a.fingerprint()).await, Some(PackState::Archived));
    assert_eq!(ctl.state_of(b.fingerprint()).await, Some(PackState::Installed));
}

#[tokio::test]
async fn renamed_entry_is_reused_without_fetch() {
    let storage = Arc::new(MemoryStorage::new());
    let ctl = controller(&storage, StaticFetcher::new().with("old.css", "body{}"));
    let a = pack(&[("old.css", "c1")], 1);
    let b = pack(&[("new.css", "c1")], 1);

    ctl.on_install(&a).await.unwrap();
    let report = ctl.on_install(&b).await.unwrap();

    assert_eq!(report.reused, 1);
    assert_eq!(report.fetched, 0);
    let store = storage.open(&pack_store_name(b.fingerprint())).await.unwrap();
    assert_eq!(store.get("new.css").await.unwrap().unwrap().body, b"body{}");
}

#[tokio::test]
async fn zero_retention_evicts_store_and_snapshot() {
    let storage = Arc::new(MemoryStorage::new());
    let fetcher = StaticFetcher::new().with("x", "one").with("y", "two");
    let ctl = controller(&storage, fetcher);
    let a = pack(&[("x", "1")], 0);
    let b = pack(&[("x", "1"), ("y", "2")], 0);

    ctl.on_install(&a).await.unwrap();
    ctl.on_activate().await.unwrap();
    ctl.on_install(&b).await.unwrap();
    let report = ctl.on_activate().await.unwrap();

    assert_eq!(report.sweep.evicted(), [a.fingerprint()]);
    let names = storage.names().await.unwrap();
    assert!(!names.contains(&pack_store_name(a.fingerprint())));
    assert!(names.contains(&pack_store_name(b.fingerprint())));
    assert!(!snapshot_keys(&storage)
        .await
        .iter()
        .any(|k| k.starts_with(a.fingerprint())));
    assert_eq!(ctl.state_of(a.fingerprint()).await, Some(PackState::Evicted));
}

#[tokio::test]
async fn failed_install_keeps_previous_current() {
    let storage = Arc::new(MemoryStorage::new());
    // "z" is not served
    let fetcher = StaticFetcher::new().with("x", "one").with("y", "two");
    let ctl = controller(&storage, fetcher);
    let a = pack(&[("x", "1")], 1);
    let broken = pack(&[("x", "1"), ("y", "2"), ("z", "3")], 1);

    ctl.on_install(&a).await.unwrap();
    let err = ctl.on_install(&broken).await.unwrap_err();

    match err {
        SwPackError::InstallAborted { failed, total, .. } => {
            assert_eq!(failed, 1);
            assert_eq!(total, 3);
        }
        other => panic!("expected InstallAborted, got {other:?}"),
    }
    let current = ctl.current().await.unwrap().unwrap();
    assert_eq!(current.fingerprint(), a.fingerprint());
    assert_eq!(ctl.state_of(broken.fingerprint()).await, Some(PackState::Pending));

    // A fresh controller over the same storage sees the same pointer
    let reopened = controller(&storage, StaticFetcher::new());
    let persisted = reopened.current().await.unwrap().unwrap();
    assert_eq!(persisted.fingerprint(), a.fingerprint());
}

#[tokio::test]
async fn archive_stays_within_retention() {
    let storage = Arc::new(MemoryStorage::new());
    let fetcher = StaticFetcher::new()
        .with("a", "1")
        .with("b", "2")
        .with("c", "3")
        .with("d", "4");
    let ctl = controller(&storage, fetcher);

    for (path, hash) in [("a", "h1"), ("b", "h2"), ("c", "h3"), ("d", "h4")] {
        ctl.on_install(&pack(&[(path, hash)], 2)).await.unwrap();
        let report = ctl.on_activate().await.unwrap();
        assert!(report.archived.len() <= 2);
    }

    let current = ctl.current().await.unwrap().unwrap();
    assert_eq!(current.archived().len(), 2);
    let pack_stores: Vec<String> = storage
        .names()
        .await
        .unwrap()
        .into_iter()
        .filter(|n| n != INTERNAL_STORE)
        .collect();
    assert_eq!(pack_stores.len(), 3);
}

#[tokio::test]
async fn sweeping_twice_changes_nothing() {
    let storage = Arc::new(MemoryStorage::new());
    let fetcher = StaticFetcher::new().with("x", "one").with("y", "two");
    let ctl = controller(&storage, fetcher);

    ctl.on_install(&pack(&[("x", "1")], 0)).await.unwrap();
    ctl.on_install(&pack(&[("x", "1"), ("y", "2")], 0)).await.unwrap();
    ctl.on_activate().await.unwrap();

    let stores = storage.names().await.unwrap();
    let snapshots = snapshot_keys(&storage).await;

    let second = ctl.on_activate().await.unwrap();
    assert!(second.sweep.removed_stores.is_empty());
    assert!(second.sweep.removed_snapshots.is_empty());
    assert_eq!(storage.names().await.unwrap(), stores);
    assert_eq!(snapshot_keys(&storage).await, snapshots);
}

#[tokio::test]
async fn unlisted_cross_origin_request_passes_through() {
    let storage = Arc::new(MemoryStorage::new());
    let fetcher = StaticFetcher::new()
        .with("index.html", "<html>")
        .with("https://cdn.example.net/lib.js", "lib");
    let ctl = controller(&storage, fetcher);
    ctl.on_install(&pack(
        &[("index.html", "i1"), ("https://cdn.example.net/lib.js", "l1")],
        1,
    ))
    .await
    .unwrap();

    let unlisted = Request::get("https://cdn.example.net/other.js").unwrap();
    assert_eq!(ctl.on_request(&unlisted).await, RouteOutcome::Passthrough);

    let listed = Request::get("https://cdn.example.net/lib.js").unwrap();
    match ctl.on_request(&listed).await {
        RouteOutcome::Responded {
            response, source, ..
        } => {
            assert_eq!(source, ResponseSource::Cache);
            assert_eq!(response.body, b"lib");
        }
        other => panic!("expected cached response, got {other:?}"),
    }
}

#[tokio::test]
async fn navigation_is_answered_with_entry_point() {
    let storage = Arc::new(MemoryStorage::new());
    let ctl = controller(&storage, StaticFetcher::new().with("index.html", "<html>"));
    ctl.on_install(&pack(&[("index.html", "i1")], 1)).await.unwrap();

    let request = Request::navigation(&format!("{ORIGIN}dashboard")).unwrap();
    let outcome = ctl.on_request(&request).await;

    assert_eq!(outcome.response().map(|r| r.body.as_slice()), Some(&b"<html>"[..]));
    assert!(!outcome.is_cache_miss());
}

#[tokio::test]
async fn entry_with_space_in_name_is_served_from_pack() {
    let storage = Arc::new(MemoryStorage::new());
    let ctl = controller(&storage, StaticFetcher::new().with("my file.css", "body{}"));
    ctl.on_install(&pack(&[("my file.css", "c1")], 1)).await.unwrap();

    let request = Request::get(&format!("{ORIGIN}my%20file.css")).unwrap();
    match ctl.on_request(&request).await {
        RouteOutcome::Responded {
            response,
            source,
            cache_miss,
            ..
        } => {
            assert_eq!(source, ResponseSource::Cache);
            assert!(!cache_miss);
            assert_eq!(response.body, b"body{}");
        }
        other => panic!("expected cached response, got {other:?}"),
    }
}

#[tokio::test]
async fn origin_error_status_reaches_the_caller() {
    let storage = Arc::new(MemoryStorage::new());
    let fetcher = StaticFetcher::new().with("index.html", "<html>").with_response(
        "missing.css",
        CachedResponse::new("https://app.example.com/missing.css", b"gone".to_vec())
            .with_status(404),
    );
    let ctl = controller(&storage, fetcher);
    ctl.on_install(&pack(&[("index.html", "i1")], 1)).await.unwrap();

    let request = Request::get(&format!("{ORIGIN}missing.css")).unwrap();
    let outcome = ctl.on_request(&request).await;

    assert!(outcome.is_cache_miss());
    let response = outcome.response().unwrap();
    assert_eq!(response.status, 404);
    assert_eq!(response.body, b"gone");
}

#[tokio::test]
async fn upgrade_after_lost_store_refetches_without_ghost_store() {
    let storage = Arc::new(MemoryStorage::new());
    let fetcher = StaticFetcher::new().with("x", "one").with("y", "two");
    let ctl = controller(&storage, fetcher);
    let a = pack(&[("x", "1")], 1);
    let b = pack(&[("x", "1"), ("y", "2")], 1);

    ctl.on_install(&a).await.unwrap();
    storage.delete(&pack_store_name(a.fingerprint())).await.unwrap();
    let report = ctl.on_install(&b).await.unwrap();

    assert_eq!(report.reused, 0);
    assert_eq!(report.refetched, 1);
    assert_eq!(report.fetched, 1);
    assert!(!storage.has(&pack_store_name(a.fingerprint())).await.unwrap());
}

#[tokio::test]
async fn request_against_lost_store_goes_to_network() {
    let storage = Arc::new(MemoryStorage::new());
    let ctl = controller(&storage, StaticFetcher::new().with("x", "one"));
    let a = pack(&[("x", "1")], 1);
    ctl.on_install(&a).await.unwrap();
    storage.delete(&pack_store_name(a.fingerprint())).await.unwrap();

    let outcome = ctl.on_request(&Request::get(&format!("{ORIGIN}x")).unwrap()).await;

    assert!(outcome.is_cache_miss());
    assert_eq!(outcome.response().map(|r| r.body.as_slice()), Some(&b"one"[..]));
    assert!(!storage.has(&pack_store_name(a.fingerprint())).await.unwrap());
}
