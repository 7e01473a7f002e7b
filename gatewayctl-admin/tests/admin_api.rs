//! Integration tests for the admin HTTP façade.
//!
//! Uses `tower::ServiceExt::oneshot` to call handlers without binding a real
//! TCP port — each test gets a fresh store on a temp directory.

use axum::body::{to_bytes, Body};
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use gatewayctl_admin::{server::AdminServer, spawn_writer};
use gatewayctl_observability::MetricsCollector;
use gatewayctl_store::{SqliteStore, Store};
use gatewayctl_xds::SnapshotCache;
use std::sync::Arc;
use tower::ServiceExt;

const VALID_API: &str = r#"{
  "version": "api-platform.wso2.com/v1",
  "kind": "http/rest",
  "data": {
    "name": "Weather API",
    "version": "v1.0",
    "context": "/weather",
    "upstreams": [{"url": "https://api.weather.com/api/v2"}],
    "operations": [{"method": "GET", "path": "/{country}/{city}"}]
  }
}"#;

async fn make_app() -> (Router, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(SqliteStore::connect(&dir.path().join("store.db"), None).await.unwrap());
    store.load_all().await.unwrap();
    let snapshots = Arc::new(SnapshotCache::new());
    let writer = spawn_writer(store.clone(), snapshots);
    let metrics = Arc::new(MetricsCollector::new().unwrap());
    let server = AdminServer::new("127.0.0.1:0".parse().unwrap(), store, writer, metrics);
    (server.router(), dir)
}

fn post(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().method(Method::GET).uri(uri).body(Body::empty()).unwrap()
}

fn delete(uri: &str) -> Request<Body> {
    Request::builder().method(Method::DELETE).uri(uri).body(Body::empty()).unwrap()
}

async fn json_body(resp: axum::response::Response) -> serde_json::Value {
    let bytes = to_bytes(resp.into_body(), 1024 * 1024).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn healthz_returns_ok() {
    let (app, _dir) = make_app().await;
    let resp = app.oneshot(get("/healthz")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn submit_then_get_round_trips() {
    let (app, _dir) = make_app().await;
    let resp = app.clone().oneshot(post("/apis", VALID_API)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created = json_body(resp).await;
    let id = created["id"].as_str().unwrap().to_string();

    let resp = app.oneshot(get(&format!("/apis/{id}"))).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let fetched = json_body(resp).await;
    assert_eq!(fetched["config"]["name"], "Weather API");
}

#[tokio::test]
async fn submit_with_invalid_context_returns_400() {
    let (app, _dir) = make_app().await;
    let invalid = VALID_API.replace("\"/weather\"", "\"weather\"");
    let resp = app.oneshot(post("/apis", &invalid)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn duplicate_name_and_version_conflicts() {
    let (app, _dir) = make_app().await;
    let first = app.clone().oneshot(post("/apis", VALID_API)).await.unwrap();
    assert_eq!(first.status(), StatusCode::CREATED);

    let second = app.oneshot(post("/apis", VALID_API)).await.unwrap();
    assert_eq!(second.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn delete_then_get_returns_404() {
    let (app, _dir) = make_app().await;
    let created = app.clone().oneshot(post("/apis", VALID_API)).await.unwrap();
    let id = json_body(created).await["id"].as_str().unwrap().to_string();

    let resp = app.clone().oneshot(delete(&format!("/apis/{id}"))).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let resp = app.oneshot(get(&format!("/apis/{id}"))).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn list_reflects_submitted_records() {
    let (app, _dir) = make_app().await;
    app.clone().oneshot(post("/apis", VALID_API)).await.unwrap();
    let resp = app.oneshot(get("/apis")).await.unwrap();
    let body = json_body(resp).await;
    assert_eq!(body["total"], 1);
}
