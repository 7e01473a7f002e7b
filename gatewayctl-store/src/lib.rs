pub mod catalog;
pub mod sqlite;

pub use catalog::Catalog;
pub use sqlite::SqliteStore;

use gatewayctl_core::{ApiConfiguration, AuditEvent, CoreError, StoredRecord};

/// Durable, transactional storage for API configurations.
///
/// Implementations must commit the config row, the audit row, and (for
/// catalog-version-bumping mutations) the metadata row in a single atomic
/// unit — a durable failure must never leave the in-memory catalog mutated.
pub trait Store: Send + Sync {
    async fn put(&self, cfg: ApiConfiguration) -> Result<StoredRecord, CoreError>;
    async fn replace(&self, id: &str, cfg: ApiConfiguration) -> Result<StoredRecord, CoreError>;
    async fn delete(&self, id: &str) -> Result<(), CoreError>;
    async fn get(&self, id: &str) -> Option<StoredRecord>;
    async fn get_by_key(&self, name: &str, version: &str) -> Option<StoredRecord>;
    async fn list(&self) -> Vec<StoredRecord>;

    /// Populate the in-memory catalog from the durable bucket. Called once
    /// at startup; must complete before the xDS server accepts streams.
    async fn load_all(&self) -> Result<(), CoreError>;

    /// Current restart-surviving snapshot version counter.
    async fn snapshot_version(&self) -> Result<u64, CoreError>;

    async fn audit_log(&self) -> Vec<AuditEvent>;
}
