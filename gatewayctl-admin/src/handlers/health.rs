use std::sync::Arc;

use axum::extract::State;
use axum::response::Json;
use gatewayctl_store::Store;
use serde_json::{json, Value};

use crate::server::AppState;

/// GET /healthz
pub async fn health(State(state): State<Arc<AppState>>) -> Json<Value> {
    let records = state.store.list().await;
    Json(json!({"status": "ok", "records": records.len()}))
}

/// GET /metrics
pub async fn metrics(State(state): State<Arc<AppState>>) -> String {
    state.metrics.gather_text()
}
