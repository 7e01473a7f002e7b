use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// HTTP methods a declared operation may use.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
    Patch,
    Head,
    Options,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Head => "HEAD",
            HttpMethod::Options => "OPTIONS",
        }
    }
}

/// A single declared upstream backend: scheme + host + port + optional path prefix.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Upstream {
    pub url: String,
}

/// One `(method, path)` pair the API exposes. `path` may contain
/// `{param}` placeholders.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Operation {
    pub method: HttpMethod,
    pub path: String,
}

/// User-facing API declaration. Immutable after creation; an update
/// replaces the whole record under the same id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ApiConfiguration {
    pub name: String,
    pub version: String,
    pub context: String,
    #[serde(alias = "upstream")]
    pub upstreams: Vec<Upstream>,
    pub operations: Vec<Operation>,
}

impl ApiConfiguration {
    /// The `(name, version)` composite identity key.
    pub fn key(&self) -> (String, String) {
        (self.name.clone(), self.version.clone())
    }
}

/// Deployment status of a catalog entry.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RecordStatus {
    Pending,
    Deployed,
    Failed,
}

/// A catalog entry: an `ApiConfiguration` plus store-managed bookkeeping.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoredRecord {
    pub id: String,
    pub config: ApiConfiguration,
    pub status: RecordStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deployed_at: Option<DateTime<Utc>>,
    pub deployed_snapshot_version: Option<u64>,
}

impl StoredRecord {
    pub fn new(id: String, config: ApiConfiguration, now: DateTime<Utc>) -> Self {
        Self {
            id,
            config,
            status: RecordStatus::Pending,
            created_at: now,
            updated_at: now,
            deployed_at: None,
            deployed_snapshot_version: None,
        }
    }
}

/// The kind of mutation an `AuditEvent` records.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum AuditOperation {
    Create,
    Update,
    Delete,
}

/// Outcome recorded alongside an `AuditEvent`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum AuditStatus {
    Success,
    Failed,
}

/// Append-only record of an admin-driven catalog mutation, written in the
/// same durable transaction as the mutation it describes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuditEvent {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub operation: AuditOperation,
    pub config_id: String,
    pub status: AuditStatus,
    pub error_message: Option<String>,
    pub details: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_config() -> ApiConfiguration {
        ApiConfiguration {
            name: "Weather API".into(),
            version: "v1.0".into(),
            context: "/weather".into(),
            upstreams: vec![Upstream { url: "https://api.weather.com/api/v2".into() }],
            operations: vec![Operation {
                method: HttpMethod::Get,
                path: "/{country}/{city}".into(),
            }],
        }
    }

    #[test]
    fn key_is_name_and_version() {
        let cfg = sample_config();
        assert_eq!(cfg.key(), ("Weather API".to_string(), "v1.0".to_string()));
    }

    #[test]
    fn stored_record_starts_pending() {
        let now = Utc::now();
        let record = StoredRecord::new("id-1".into(), sample_config(), now);
        assert_eq!(record.status, RecordStatus::Pending);
        assert_eq!(record.created_at, record.updated_at);
        assert!(record.deployed_at.is_none());
        assert!(record.deployed_snapshot_version.is_none());
    }

    #[test]
    fn http_method_roundtrips_through_json() {
        let m = HttpMethod::Patch;
        let json = serde_json::to_string(&m).unwrap();
        assert_eq!(json, "\"PATCH\"");
        let back: HttpMethod = serde_json::from_str(&json).unwrap();
        assert_eq!(back, HttpMethod::Patch);
    }
}
