//! End-to-end scenario tests driving store → writer → translator → snapshot
//! cache together, without binding a real socket.

use gatewayctl_core::{ApiConfiguration, HttpMethod, Operation, Upstream};
use gatewayctl_store::{SqliteStore, Store};
use gatewayctl_xds::snapshot::GLOBAL_NODE;
use gatewayctl_xds::SnapshotCache;
use std::sync::Arc;

fn weather_api() -> ApiConfiguration {
    ApiConfiguration {
        name: "Weather API".into(),
        version: "v1.0".into(),
        context: "/weather".into(),
        upstreams: vec![Upstream { url: "https://api.weather.com/api/v2".into() }],
        operations: vec![Operation { method: HttpMethod::Get, path: "/{country}/{city}".into() }],
    }
}

async fn fresh_store() -> (Arc<SqliteStore>, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(SqliteStore::connect(&dir.path().join("store.db"), None).await.unwrap());
    store.load_all().await.unwrap();
    (store, dir)
}

// Scenario A — deploy one API, expect one route at version 1.
#[tokio::test]
async fn scenario_a_deploy_one_api_yields_one_route() {
    let (store, _dir) = fresh_store().await;
    let snapshots = Arc::new(SnapshotCache::new());
    let writer = gatewayctl_admin::spawn_writer(store.clone(), snapshots.clone());

    let record = writer.submit(weather_api()).await.unwrap();
    assert_eq!(store.snapshot_version().await.unwrap(), 1);

    let bundle = gatewayctl_translator::translate(&[record]).unwrap();
    assert_eq!(bundle.route_configs[0].virtual_hosts[0].routes.len(), 1);

    // Give the writer task's spawned publish a beat to land in the cache.
    tokio::task::yield_now().await;
    let snapshot = snapshots.get_snapshot(GLOBAL_NODE).unwrap();
    assert_eq!(snapshot.version, 1);
}

// Scenario B — context conflict on same name, different context.
#[tokio::test]
async fn scenario_b_context_conflict_leaves_catalog_unchanged() {
    let (store, _dir) = fresh_store().await;
    let snapshots = Arc::new(SnapshotCache::new());
    let writer = gatewayctl_admin::spawn_writer(store.clone(), snapshots);

    let mut a = weather_api();
    a.name = "A".into();
    a.context = "/a".into();
    writer.submit(a.clone()).await.unwrap();

    let mut conflicting = a.clone();
    conflicting.version = "v2.0".into();
    conflicting.context = "/b".into();
    let result = writer.submit(conflicting).await;

    assert!(matches!(result, Err(gatewayctl_core::CoreError::Conflict(_))));
    assert_eq!(store.list().await.len(), 1);
    assert_eq!(store.snapshot_version().await.unwrap(), 1);
}

// Scenario C — update preserves the new operation order.
#[tokio::test]
async fn scenario_c_update_preserves_operation_order() {
    let (store, _dir) = fresh_store().await;
    let snapshots = Arc::new(SnapshotCache::new());
    let writer = gatewayctl_admin::spawn_writer(store.clone(), snapshots);

    let mut cfg = weather_api();
    cfg.operations = vec![
        Operation { method: HttpMethod::Get, path: "/x".into() },
        Operation { method: HttpMethod::Post, path: "/x".into() },
    ];
    let record = writer.submit(cfg.clone()).await.unwrap();

    cfg.operations.reverse();
    let updated = writer.update(record.id.clone(), cfg).await.unwrap();

    assert_eq!(updated.config.operations[0].method, HttpMethod::Post);
    let bundle = gatewayctl_translator::translate(&[updated]).unwrap();
    assert_eq!(bundle.route_configs[0].virtual_hosts[0].routes.len(), 2);
}

// Scenario E — restart preserves version monotonicity.
#[tokio::test]
async fn scenario_e_restart_preserves_version_monotonicity() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("store.db");

    let version_before_restart = {
        let store = Arc::new(SqliteStore::connect(&db_path, None).await.unwrap());
        store.load_all().await.unwrap();
        let snapshots = Arc::new(SnapshotCache::new());
        let writer = gatewayctl_admin::spawn_writer(store.clone(), snapshots);
        writer.submit(weather_api()).await.unwrap();
        store.snapshot_version().await.unwrap()
    };
    assert_eq!(version_before_restart, 1);

    let store = Arc::new(SqliteStore::connect(&db_path, None).await.unwrap());
    store.load_all().await.unwrap();
    let snapshots = Arc::new(SnapshotCache::new());
    let writer = gatewayctl_admin::spawn_writer(store.clone(), snapshots);

    let mut second = weather_api();
    second.name = "Traffic API".into();
    writer.submit(second).await.unwrap();

    let version_after_restart = store.snapshot_version().await.unwrap();
    assert!(version_after_restart >= version_before_restart + 1);
}

// Scenario F — delete removes routes only for that record.
#[tokio::test]
async fn scenario_f_delete_removes_only_that_records_routes() {
    let (store, _dir) = fresh_store().await;
    let snapshots = Arc::new(SnapshotCache::new());
    let writer = gatewayctl_admin::spawn_writer(store.clone(), snapshots);

    let mut a = weather_api();
    a.name = "A".into();
    a.context = "/a".into();
    a.operations = vec![Operation { method: HttpMethod::Get, path: "/a".into() }];
    let record_a = writer.submit(a).await.unwrap();

    let mut b = weather_api();
    b.name = "B".into();
    b.context = "/b".into();
    b.operations = vec![Operation { method: HttpMethod::Get, path: "/b".into() }];
    writer.submit(b).await.unwrap();

    writer.delete(record_a.id).await.unwrap();

    let remaining = store.list().await;
    let bundle = gatewayctl_translator::translate(&remaining).unwrap();
    assert_eq!(bundle.route_configs[0].virtual_hosts[0].routes.len(), 1);
}
