use crate::catalog::{Catalog, ConflictKind};
use crate::Store;
use gatewayctl_core::{
    ApiConfiguration, AuditEvent, AuditOperation, AuditStatus, CoreError, RecordStatus,
    StoredRecord,
};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Row, SqlitePool};
use std::path::Path;
use std::str::FromStr;

const METADATA_VERSION_KEY: &str = "last_snapshot_version";

/// SQLite-backed durable store. Every mutation runs in one transaction that
/// writes the config row, appends an audit row, and (for Put/Replace/Delete,
/// which all bump the catalog) updates the `metadata` version counter —
/// committed all together or not at all.
pub struct SqliteStore {
    pool: SqlitePool,
    catalog: Catalog,
}

impl SqliteStore {
    pub async fn connect(path: &Path, snapshot_version_initial: Option<u64>) -> Result<Self, CoreError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| CoreError::Store(format!("failed to create store dir: {e}")))?;
            }
        }

        let options = SqliteConnectOptions::from_str(&format!("sqlite://{}", path.display()))
            .map_err(|e| CoreError::Store(format!("invalid store path: {e}")))?
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .map_err(|e| CoreError::Store(format!("failed to open store: {e}")))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS configs (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                version TEXT NOT NULL,
                context TEXT NOT NULL,
                config_json TEXT NOT NULL,
                status TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                deployed_at TEXT,
                deployed_snapshot_version INTEGER
            )
            "#,
        )
        .execute(&pool)
        .await
        .map_err(|e| CoreError::Store(e.to_string()))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS audit (
                id TEXT PRIMARY KEY,
                timestamp TEXT NOT NULL,
                operation TEXT NOT NULL,
                config_id TEXT NOT NULL,
                status TEXT NOT NULL,
                error_message TEXT,
                details TEXT NOT NULL
            )
            "#,
        )
        .execute(&pool)
        .await
        .map_err(|e| CoreError::Store(e.to_string()))?;

        sqlx::query(
            r#"CREATE TABLE IF NOT EXISTS metadata (key TEXT PRIMARY KEY, value TEXT NOT NULL)"#,
        )
        .execute(&pool)
        .await
        .map_err(|e| CoreError::Store(e.to_string()))?;

        if let Some(initial) = snapshot_version_initial {
            sqlx::query("INSERT OR IGNORE INTO metadata (key, value) VALUES (?, ?)")
                .bind(METADATA_VERSION_KEY)
                .bind(initial.to_string())
                .execute(&pool)
                .await
                .map_err(|e| CoreError::Store(e.to_string()))?;
        } else {
            sqlx::query("INSERT OR IGNORE INTO metadata (key, value) VALUES (?, '0')")
                .bind(METADATA_VERSION_KEY)
                .execute(&pool)
                .await
                .map_err(|e| CoreError::Store(e.to_string()))?;
        }

        Ok(Self { pool, catalog: Catalog::new() })
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    async fn bump_version(tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>) -> Result<u64, CoreError> {
        let row = sqlx::query("SELECT value FROM metadata WHERE key = ?")
            .bind(METADATA_VERSION_KEY)
            .fetch_one(&mut **tx)
            .await
            .map_err(|e| CoreError::Store(e.to_string()))?;
        let current: String = row.get("value");
        let next: u64 = current.parse::<u64>().unwrap_or(0) + 1;

        sqlx::query("UPDATE metadata SET value = ? WHERE key = ?")
            .bind(next.to_string())
            .bind(METADATA_VERSION_KEY)
            .execute(&mut **tx)
            .await
            .map_err(|e| CoreError::Store(e.to_string()))?;

        Ok(next)
    }

    async fn insert_audit(
        tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
        event: &AuditEvent,
    ) -> Result<(), CoreError> {
        sqlx::query(
            "INSERT INTO audit (id, timestamp, operation, config_id, status, error_message, details) \
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&event.id)
        .bind(event.timestamp.to_rfc3339())
        .bind(format!("{:?}", event.operation).to_uppercase())
        .bind(&event.config_id)
        .bind(format!("{:?}", event.status).to_uppercase())
        .bind(&event.error_message)
        .bind(&event.details)
        .execute(&mut **tx)
        .await
        .map_err(|e| CoreError::Store(e.to_string()))?;
        Ok(())
    }

    async fn insert_config_row(
        tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
        record: &StoredRecord,
    ) -> Result<(), CoreError> {
        let config_json = serde_json::to_string(&record.config)
            .map_err(|e| CoreError::Internal(e.to_string()))?;
        sqlx::query(
            "INSERT INTO configs \
             (id, name, version, context, config_json, status, created_at, updated_at, deployed_at, deployed_snapshot_version) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&record.id)
        .bind(&record.config.name)
        .bind(&record.config.version)
        .bind(&record.config.context)
        .bind(config_json)
        .bind(status_str(record.status))
        .bind(record.created_at.to_rfc3339())
        .bind(record.updated_at.to_rfc3339())
        .bind(record.deployed_at.map(|t| t.to_rfc3339()))
        .bind(record.deployed_snapshot_version.map(|v| v as i64))
        .execute(&mut **tx)
        .await
        .map_err(|e| CoreError::Store(e.to_string()))?;
        Ok(())
    }

    async fn delete_config_row(
        tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
        id: &str,
    ) -> Result<(), CoreError> {
        sqlx::query("DELETE FROM configs WHERE id = ?")
            .bind(id)
            .execute(&mut **tx)
            .await
            .map_err(|e| CoreError::Store(e.to_string()))?;
        Ok(())
    }
}

fn status_str(status: RecordStatus) -> &'static str {
    match status {
        RecordStatus::Pending => "pending",
        RecordStatus::Deployed => "deployed",
        RecordStatus::Failed => "failed",
    }
}

impl Store for SqliteStore {
    async fn put(&self, cfg: ApiConfiguration) -> Result<StoredRecord, CoreError> {
        if let Some(conflict) = self.catalog.find_conflict(&cfg, None) {
            return Err(match conflict {
                ConflictKind::AlreadyExists => {
                    CoreError::Conflict(format!("{} {} already exists", cfg.name, cfg.version))
                }
                ConflictKind::ContextConflict => CoreError::Conflict(format!(
                    "{} is already registered under a different context",
                    cfg.name
                )),
            });
        }

        let id = uuid::Uuid::new_v4().to_string();
        let now = chrono::Utc::now();
        let record = StoredRecord::new(id.clone(), cfg, now);

        let mut tx = self.pool.begin().await.map_err(|e| CoreError::Store(e.to_string()))?;
        Self::insert_config_row(&mut tx, &record).await?;
        Self::insert_audit(
            &mut tx,
            &AuditEvent {
                id: uuid::Uuid::new_v4().to_string(),
                timestamp: now,
                operation: AuditOperation::Create,
                config_id: id.clone(),
                status: AuditStatus::Success,
                error_message: None,
                details: format!("created {} {}", record.config.name, record.config.version),
            },
        )
        .await?;
        Self::bump_version(&mut tx).await?;
        tx.commit().await.map_err(|e| CoreError::Store(e.to_string()))?;

        self.catalog.insert(record.clone());
        Ok(record)
    }

    async fn replace(&self, id: &str, cfg: ApiConfiguration) -> Result<StoredRecord, CoreError> {
        let existing = self.catalog.get(id).ok_or_else(|| CoreError::NotFound(id.to_string()))?;

        if let Some(conflict) = self.catalog.find_conflict(&cfg, Some(id)) {
            return Err(match conflict {
                ConflictKind::AlreadyExists => {
                    CoreError::Conflict(format!("{} {} already exists", cfg.name, cfg.version))
                }
                ConflictKind::ContextConflict => CoreError::Conflict(format!(
                    "{} is already registered under a different context",
                    cfg.name
                )),
            });
        }

        let now = chrono::Utc::now();
        let mut record = existing;
        record.config = cfg;
        record.updated_at = now;

        let mut tx = self.pool.begin().await.map_err(|e| CoreError::Store(e.to_string()))?;
        Self::delete_config_row(&mut tx, id).await?;
        Self::insert_config_row(&mut tx, &record).await?;
        Self::insert_audit(
            &mut tx,
            &AuditEvent {
                id: uuid::Uuid::new_v4().to_string(),
                timestamp: now,
                operation: AuditOperation::Update,
                config_id: id.to_string(),
                status: AuditStatus::Success,
                error_message: None,
                details: format!("replaced {} {}", record.config.name, record.config.version),
            },
        )
        .await?;
        Self::bump_version(&mut tx).await?;
        tx.commit().await.map_err(|e| CoreError::Store(e.to_string()))?;

        self.catalog.insert(record.clone());
        Ok(record)
    }

    async fn delete(&self, id: &str) -> Result<(), CoreError> {
        if self.catalog.get(id).is_none() {
            return Err(CoreError::NotFound(id.to_string()));
        }

        let now = chrono::Utc::now();
        let mut tx = self.pool.begin().await.map_err(|e| CoreError::Store(e.to_string()))?;
        Self::delete_config_row(&mut tx, id).await?;
        Self::insert_audit(
            &mut tx,
            &AuditEvent {
                id: uuid::Uuid::new_v4().to_string(),
                timestamp: now,
                operation: AuditOperation::Delete,
                config_id: id.to_string(),
                status: AuditStatus::Success,
                error_message: None,
                details: "deleted".to_string(),
            },
        )
        .await?;
        Self::bump_version(&mut tx).await?;
        tx.commit().await.map_err(|e| CoreError::Store(e.to_string()))?;

        self.catalog.remove(id);
        Ok(())
    }

    async fn get(&self, id: &str) -> Option<StoredRecord> {
        self.catalog.get(id)
    }

    async fn get_by_key(&self, name: &str, version: &str) -> Option<StoredRecord> {
        self.catalog.get_by_key(name, version)
    }

    async fn list(&self) -> Vec<StoredRecord> {
        self.catalog.list()
    }

    async fn load_all(&self) -> Result<(), CoreError> {
        let rows = sqlx::query("SELECT id, config_json, status, created_at, updated_at, deployed_at, deployed_snapshot_version FROM configs")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| CoreError::Store(e.to_string()))?;

        for row in rows {
            let id: String = row.get("id");
            let config_json: String = row.get("config_json");
            let config: ApiConfiguration =
                serde_json::from_str(&config_json).map_err(|e| CoreError::Internal(e.to_string()))?;
            let status_raw: String = row.get("status");
            let status = match status_raw.as_str() {
                "deployed" => RecordStatus::Deployed,
                "failed" => RecordStatus::Failed,
                _ => RecordStatus::Pending,
            };
            let created_at: String = row.get("created_at");
            let updated_at: String = row.get("updated_at");
            let deployed_at: Option<String> = row.get("deployed_at");
            let deployed_snapshot_version: Option<i64> = row.get("deployed_snapshot_version");

            let record = StoredRecord {
                id,
                config,
                status,
                created_at: chrono::DateTime::parse_from_rfc3339(&created_at)
                    .map_err(|e| CoreError::Internal(e.to_string()))?
                    .with_timezone(&chrono::Utc),
                updated_at: chrono::DateTime::parse_from_rfc3339(&updated_at)
                    .map_err(|e| CoreError::Internal(e.to_string()))?
                    .with_timezone(&chrono::Utc),
                deployed_at: deployed_at
                    .map(|t| {
                        chrono::DateTime::parse_from_rfc3339(&t)
                            .map(|d| d.with_timezone(&chrono::Utc))
                    })
                    .transpose()
                    .map_err(|e| CoreError::Internal(e.to_string()))?,
                deployed_snapshot_version: deployed_snapshot_version.map(|v| v as u64),
            };
            self.catalog.insert(record);
        }

        tracing::info!(records = self.catalog.len(), "store: loaded catalog from durable state");
        Ok(())
    }

    async fn snapshot_version(&self) -> Result<u64, CoreError> {
        let row = sqlx::query("SELECT value FROM metadata WHERE key = ?")
            .bind(METADATA_VERSION_KEY)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| CoreError::Store(e.to_string()))?;
        let value: String = row.get("value");
        Ok(value.parse().unwrap_or(0))
    }

    async fn audit_log(&self) -> Vec<AuditEvent> {
        let rows = match sqlx::query(
            "SELECT id, timestamp, operation, config_id, status, error_message, details FROM audit ORDER BY timestamp",
        )
        .fetch_all(&self.pool)
        .await
        {
            Ok(rows) => rows,
            Err(e) => {
                tracing::warn!(error = %e, "store: failed to read audit log");
                return Vec::new();
            }
        };

        rows.into_iter()
            .filter_map(|row| {
                let timestamp: String = row.get("timestamp");
                let operation: String = row.get("operation");
                let status: String = row.get("status");
                Some(AuditEvent {
                    id: row.get("id"),
                    timestamp: chrono::DateTime::parse_from_rfc3339(&timestamp)
                        .ok()?
                        .with_timezone(&chrono::Utc),
                    operation: match operation.as_str() {
                        "CREATE" => AuditOperation::Create,
                        "UPDATE" => AuditOperation::Update,
                        _ => AuditOperation::Delete,
                    },
                    config_id: row.get("config_id"),
                    status: if status == "SUCCESS" { AuditStatus::Success } else { AuditStatus::Failed },
                    error_message: row.get("error_message"),
                    details: row.get("details"),
                })
            })
            .collect()
    }
}
