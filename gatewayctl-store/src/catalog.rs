use dashmap::DashMap;
use gatewayctl_core::StoredRecord;
use std::sync::Arc;

/// In-memory view of every stored record, kept in sync with the durable
/// store by the single writer task. Reads (admin `Get`/`List`, translation)
/// never touch the durable store — they read this map, which is always
/// consistent with the last committed mutation.
#[derive(Clone, Default)]
pub struct Catalog {
    records: Arc<DashMap<String, StoredRecord>>,
}

impl Catalog {
    pub fn new() -> Self {
        Self { records: Arc::new(DashMap::new()) }
    }

    pub fn insert(&self, record: StoredRecord) {
        self.records.insert(record.id.clone(), record);
    }

    pub fn remove(&self, id: &str) -> Option<StoredRecord> {
        self.records.remove(id).map(|(_, v)| v)
    }

    pub fn get(&self, id: &str) -> Option<StoredRecord> {
        self.records.get(id).map(|e| e.value().clone())
    }

    pub fn get_by_key(&self, name: &str, version: &str) -> Option<StoredRecord> {
        self.records
            .iter()
            .find(|e| e.value().config.name == name && e.value().config.version == version)
            .map(|e| e.value().clone())
    }

    /// Returns the record that would conflict with inserting `cfg`, if any:
    /// a distinct id already occupying `(name, version)`, or a distinct id
    /// sharing `name` with a different `context`.
    pub fn find_conflict(
        &self,
        cfg: &gatewayctl_core::ApiConfiguration,
        excluding_id: Option<&str>,
    ) -> Option<ConflictKind> {
        for entry in self.records.iter() {
            let existing = entry.value();
            if Some(existing.id.as_str()) == excluding_id {
                continue;
            }
            if existing.config.name == cfg.name && existing.config.version == cfg.version {
                return Some(ConflictKind::AlreadyExists);
            }
            if existing.config.name == cfg.name && existing.config.context != cfg.context {
                return Some(ConflictKind::ContextConflict);
            }
        }
        None
    }

    pub fn list(&self) -> Vec<StoredRecord> {
        let mut records: Vec<_> = self.records.iter().map(|e| e.value().clone()).collect();
        records.sort_by(|a, b| a.id.cmp(&b.id));
        records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictKind {
    AlreadyExists,
    ContextConflict,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use gatewayctl_core::{ApiConfiguration, HttpMethod, Operation, Upstream};

    fn cfg(name: &str, version: &str, context: &str) -> ApiConfiguration {
        ApiConfiguration {
            name: name.into(),
            version: version.into(),
            context: context.into(),
            upstreams: vec![Upstream { url: "https://example.com".into() }],
            operations: vec![Operation { method: HttpMethod::Get, path: "/x".into() }],
        }
    }

    #[test]
    fn detects_already_exists_on_same_name_and_version() {
        let catalog = Catalog::new();
        catalog.insert(StoredRecord::new("r1".into(), cfg("A", "v1.0", "/a"), Utc::now()));
        let conflict = catalog.find_conflict(&cfg("A", "v1.0", "/other"), None);
        assert_eq!(conflict, Some(ConflictKind::AlreadyExists));
    }

    #[test]
    fn detects_context_conflict_on_same_name_different_context() {
        let catalog = Catalog::new();
        catalog.insert(StoredRecord::new("r1".into(), cfg("A", "v1.0", "/a"), Utc::now()));
        let conflict = catalog.find_conflict(&cfg("A", "v2.0", "/b"), None);
        assert_eq!(conflict, Some(ConflictKind::ContextConflict));
    }

    #[test]
    fn excluding_id_allows_replace_of_itself() {
        let catalog = Catalog::new();
        catalog.insert(StoredRecord::new("r1".into(), cfg("A", "v1.0", "/a"), Utc::now()));
        let conflict = catalog.find_conflict(&cfg("A", "v1.0", "/a"), Some("r1"));
        assert_eq!(conflict, None);
    }

    #[test]
    fn list_is_sorted_by_id() {
        let catalog = Catalog::new();
        catalog.insert(StoredRecord::new("b".into(), cfg("B", "v1.0", "/b"), Utc::now()));
        catalog.insert(StoredRecord::new("a".into(), cfg("A", "v1.0", "/a"), Utc::now()));
        let ids: Vec<_> = catalog.list().into_iter().map(|r| r.id).collect();
        assert_eq!(ids, vec!["a".to_string(), "b".to_string()]);
    }
}
