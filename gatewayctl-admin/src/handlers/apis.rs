use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::Json;
use gatewayctl_core::CoreError;
use gatewayctl_store::Store;
use gatewayctl_validator::{parse, validate, ContentType};
use serde_json::{json, Value};

use crate::server::AppState;

fn content_type(headers: &HeaderMap) -> ContentType {
    match headers.get(http::header::CONTENT_TYPE).and_then(|v| v.to_str().ok()) {
        Some(value) if value.contains("yaml") => ContentType::Yaml,
        _ => ContentType::Json,
    }
}

fn error_response(err: CoreError) -> (StatusCode, Json<Value>) {
    let envelope = err.to_envelope();
    let status = StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(json!(envelope)))
}

/// POST /apis
pub async fn submit(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, Json<Value>) {
    let document = match parse(&body, content_type(&headers)) {
        Ok(document) => document,
        Err(err) => {
            return (StatusCode::BAD_REQUEST, Json(json!({"status": "error", "message": err.to_string()})))
        }
    };

    if let Err(errors) = validate(&document) {
        return error_response(CoreError::Validation(errors));
    }

    match state.writer.submit(document.data).await {
        Ok(record) => (StatusCode::CREATED, Json(json!(record))),
        Err(err) => error_response(err),
    }
}

/// PUT /apis/{id}
pub async fn update(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, Json<Value>) {
    let document = match parse(&body, content_type(&headers)) {
        Ok(document) => document,
        Err(err) => {
            return (StatusCode::BAD_REQUEST, Json(json!({"status": "error", "message": err.to_string()})))
        }
    };

    if let Err(errors) = validate(&document) {
        return error_response(CoreError::Validation(errors));
    }

    match state.writer.update(id, document.data).await {
        Ok(record) => (StatusCode::OK, Json(json!(record))),
        Err(err) => error_response(err),
    }
}

/// DELETE /apis/{id}
pub async fn delete(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> (StatusCode, Json<Value>) {
    match state.writer.delete(id).await {
        Ok(()) => (StatusCode::NO_CONTENT, Json(json!({}))),
        Err(err) => error_response(err),
    }
}

/// GET /apis/{id}
pub async fn get(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> (StatusCode, Json<Value>) {
    match state.store.get(&id).await {
        Some(record) => (StatusCode::OK, Json(json!(record))),
        None => error_response(CoreError::NotFound(id)),
    }
}

/// GET /apis
pub async fn list(State(state): State<Arc<AppState>>) -> Json<Value> {
    let records = state.store.list().await;
    Json(json!({"total": records.len(), "list": records}))
}
