use std::net::SocketAddr;
use std::sync::Arc;

use axum::routing::{delete, get, post, put};
use axum::Router;
use gatewayctl_observability::MetricsCollector;
use gatewayctl_store::SqliteStore;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::handlers;
use crate::writer::WriterHandle;

/// Shared state for the admin HTTP façade. Reads go straight to the store's
/// in-memory catalog; writes go through `writer`, which is the only handle
/// allowed to mutate catalog or snapshot state.
pub struct AppState {
    pub store: Arc<SqliteStore>,
    pub writer: WriterHandle,
    pub metrics: Arc<MetricsCollector>,
}

pub struct AdminServer {
    addr: SocketAddr,
    state: Arc<AppState>,
}

impl AdminServer {
    pub fn new(addr: SocketAddr, store: Arc<SqliteStore>, writer: WriterHandle, metrics: Arc<MetricsCollector>) -> Self {
        Self { addr, state: Arc::new(AppState { store, writer, metrics }) }
    }

    pub fn router(&self) -> Router {
        Router::new()
            .route("/apis", post(handlers::apis::submit))
            .route("/apis", get(handlers::apis::list))
            .route("/apis/{id}", put(handlers::apis::update))
            .route("/apis/{id}", delete(handlers::apis::delete))
            .route("/apis/{id}", get(handlers::apis::get))
            .route("/healthz", get(handlers::health::health))
            .route("/metrics", get(handlers::health::metrics))
            .layer(TraceLayer::new_for_http())
            .with_state(self.state.clone())
    }

    pub async fn serve(self) -> anyhow::Result<()> {
        let addr = self.addr;
        let app = self.router();

        info!(%addr, "admin: listening");
        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, app).await?;
        Ok(())
    }
}
