use dashmap::DashMap;
use gatewayctl_translator::ResourceBundle;
use std::sync::Arc;
use tokio::sync::broadcast;

/// Translation produces one catalog-wide `ResourceBundle` shared by every
/// proxy in this deployment, so the writer task publishes under this single
/// well-known key rather than per the declared `node.id` of each stream. The
/// per-node key shape is kept so a future multi-environment translator can
/// target individual nodes without changing this API.
pub const GLOBAL_NODE: &str = "*";

/// A versioned set of xDS resources for one data-plane node.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub version: u64,
    pub resources: ResourceBundle,
}

/// Process-wide cache of the most recent snapshot per node identity, with a
/// broadcast channel per node the xDS server subscribes to for
/// "snapshot changed" notifications.
///
/// `SetSnapshot` is serialized with respect to itself for a given node by
/// construction: only the single writer task ever calls it.
pub struct SnapshotCache {
    snapshots: DashMap<String, Arc<Snapshot>>,
    notifiers: DashMap<String, broadcast::Sender<Arc<Snapshot>>>,
}

impl SnapshotCache {
    pub fn new() -> Self {
        Self { snapshots: DashMap::new(), notifiers: DashMap::new() }
    }

    /// Replaces the stored snapshot for `node`. Rejects (no-op, returns
    /// `false`) a snapshot whose version is not strictly greater than the
    /// one currently stored for that node.
    pub fn set_snapshot(&self, node: &str, snapshot: Snapshot) -> bool {
        if let Some(current) = self.snapshots.get(node) {
            if snapshot.version <= current.version {
                return false;
            }
        }
        let snapshot = Arc::new(snapshot);
        self.snapshots.insert(node.to_string(), snapshot.clone());
        if let Some(sender) = self.notifiers.get(node) {
            let _ = sender.send(snapshot);
        }
        true
    }

    pub fn get_snapshot(&self, node: &str) -> Option<Arc<Snapshot>> {
        self.snapshots.get(node).map(|e| e.value().clone())
    }

    /// Subscribes to snapshot-changed notifications for `node`. The first
    /// `recv` may race with an in-flight `set_snapshot`; callers should
    /// fetch the current snapshot via `get_snapshot` before awaiting.
    pub fn subscribe(&self, node: &str) -> broadcast::Receiver<Arc<Snapshot>> {
        self.notifiers
            .entry(node.to_string())
            .or_insert_with(|| broadcast::channel(32).0)
            .subscribe()
    }
}

impl Default for SnapshotCache {
    fn default() -> Self {
        Self::new()
    }
}
