use std::sync::Arc;

use gatewayctl_core::{ApiConfiguration, CoreError, StoredRecord};
use gatewayctl_store::{SqliteStore, Store};
use gatewayctl_xds::{Snapshot, SnapshotCache};
use tokio::sync::{mpsc, oneshot};
use tracing::{error, info};

/// A mutation the writer task performs on the catalog. Each carries a
/// `oneshot` reply channel so the submitting handler can await the result
/// without holding any lock itself.
pub enum WriterCommand {
    Submit { config: ApiConfiguration, reply: oneshot::Sender<Result<StoredRecord, CoreError>> },
    Update { id: String, config: ApiConfiguration, reply: oneshot::Sender<Result<StoredRecord, CoreError>> },
    Delete { id: String, reply: oneshot::Sender<Result<(), CoreError>> },
}

#[derive(Clone)]
pub struct WriterHandle {
    tx: mpsc::Sender<WriterCommand>,
}

impl WriterHandle {
    pub async fn submit(&self, config: ApiConfiguration) -> Result<StoredRecord, CoreError> {
        let (reply, rx) = oneshot::channel();
        self.send(WriterCommand::Submit { config, reply }).await;
        rx.await.unwrap_or_else(|_| Err(CoreError::Internal("writer task dropped reply".into())))
    }

    pub async fn update(&self, id: String, config: ApiConfiguration) -> Result<StoredRecord, CoreError> {
        let (reply, rx) = oneshot::channel();
        self.send(WriterCommand::Update { id, config, reply }).await;
        rx.await.unwrap_or_else(|_| Err(CoreError::Internal("writer task dropped reply".into())))
    }

    pub async fn delete(&self, id: String) -> Result<(), CoreError> {
        let (reply, rx) = oneshot::channel();
        self.send(WriterCommand::Delete { id, reply }).await;
        rx.await.unwrap_or_else(|_| Err(CoreError::Internal("writer task dropped reply".into())))
    }

    async fn send(&self, command: WriterCommand) {
        if self.tx.send(command).await.is_err() {
            error!("writer task queue closed, command dropped");
        }
    }
}

/// Spawns the single writer task. It owns the durable store and the xDS
/// snapshot cache; every catalog mutation, translation, and snapshot
/// publication for the whole process happens on this one task.
pub fn spawn(store: Arc<SqliteStore>, snapshots: Arc<SnapshotCache>) -> WriterHandle {
    let (tx, mut rx) = mpsc::channel(64);

    tokio::spawn(async move {
        while let Some(command) = rx.recv().await {
            match command {
                WriterCommand::Submit { config, reply } => {
                    let result = store.put(config).await;
                    if result.is_ok() {
                        publish(&store, &snapshots).await;
                    }
                    let _ = reply.send(result);
                }
                WriterCommand::Update { id, config, reply } => {
                    let result = store.replace(&id, config).await;
                    if result.is_ok() {
                        publish(&store, &snapshots).await;
                    }
                    let _ = reply.send(result);
                }
                WriterCommand::Delete { id, reply } => {
                    let result = store.delete(&id).await;
                    if result.is_ok() {
                        publish(&store, &snapshots).await;
                    }
                    let _ = reply.send(result);
                }
            }
        }
    });

    WriterHandle { tx }
}

/// Rebuilds the resource graph from the in-memory catalog and publishes it
/// under the next durable snapshot version. A translation invariant
/// violation is logged and leaves the previous snapshot in place; the
/// mutation that triggered it has already been durably committed, so the
/// catalog and the store remain consistent — only the xDS push lags.
async fn publish(store: &SqliteStore, snapshots: &SnapshotCache) {
    let records = store.list().await;
    let bundle = match gatewayctl_translator::translate(&records) {
        Ok(bundle) => bundle,
        Err(err) => {
            error!(error = %err, "writer: translation failed, snapshot not updated");
            return;
        }
    };

    let version = match store.snapshot_version().await {
        Ok(version) => version,
        Err(err) => {
            error!(error = %err, "writer: failed to read snapshot version");
            return;
        }
    };

    if snapshots.set_snapshot(gatewayctl_xds::snapshot::GLOBAL_NODE, Snapshot { version, resources: bundle }) {
        info!(version, "writer: published new snapshot");
    }
}
