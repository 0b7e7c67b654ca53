//! The persisted issue collection.
//!
//! [`ContentStore`] is created once at start-up over a shared
//! [`KeyValueStore`] and handed to whoever needs the issues. Every mutation
//! goes through [`merge`] and then rewrites the whole blob under
//! [`ISSUES_KEY`].

use std::sync::Arc;

use serde_json::Value;
use tracing::{info, instrument, warn};

use crate::error::StorageError;
use crate::merge::{merge, sort_for_display};
use crate::models::{ContentPayload, Issue, decode_issues_lenient};
use crate::storage::{ISSUES_KEY, KeyValueStore, read_json, write_json};

pub struct ContentStore {
    kv: Arc<dyn KeyValueStore>,
    issues: Vec<Issue>,
}

impl ContentStore {
    /// Load the persisted collection.
    ///
    /// A missing or unreadable blob yields an empty store; the problem is
    /// logged and the next successful persist overwrites it.
    #[instrument(level = "info", skip_all)]
    pub fn load(kv: Arc<dyn KeyValueStore>) -> Self {
        let issues = match read_json::<Value>(kv.as_ref(), ISSUES_KEY) {
            Ok(Some(value)) => merge(Vec::new(), decode_issues_lenient(value)),
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!(error = %e, "Stored issues unreadable; starting empty");
                Vec::new()
            }
        };
        info!(count = issues.len(), "Loaded local issues");
        Self { kv, issues }
    }

    /// Issues in merge order.
    pub fn issues(&self) -> &[Issue] {
        &self.issues
    }

    pub fn len(&self) -> usize {
        self.issues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Issue> {
        self.issues.iter().find(|i| i.id == id)
    }

    /// Issues newest first, for the archive view.
    pub fn sorted(&self) -> Vec<Issue> {
        let mut issues = self.issues.clone();
        sort_for_display(&mut issues);
        issues
    }

    /// Merge `incoming` over the current collection (incoming wins) and
    /// persist the result in full.
    ///
    /// The in-memory collection is updated even if persisting fails.
    #[instrument(level = "info", skip_all, fields(incoming = incoming.len()))]
    pub fn merge_remote(&mut self, incoming: Vec<Issue>) -> Result<(), StorageError> {
        let local = std::mem::take(&mut self.issues);
        self.issues = merge(local, incoming);
        info!(count = self.issues.len(), "Merged issues");
        self.persist()
    }

    /// Write the whole collection under [`ISSUES_KEY`].
    pub fn persist(&self) -> Result<(), StorageError> {
        let payload = ContentPayload {
            issues: self.issues.clone(),
        };
        write_json(self.kv.as_ref(), ISSUES_KEY, &payload)
    }

    /// Pretty-printed `{ "issues": [...] }` document of the current store.
    pub fn export_json(&self) -> Result<String, serde_json::Error> {
        let payload = ContentPayload {
            issues: self.issues.clone(),
        };
        serde_json::to_string_pretty(&payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use serde_json::json;

    fn issue(value: serde_json::Value) -> Issue {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_load_empty_when_nothing_stored() {
        let kv: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let store = ContentStore::load(kv);
        assert!(store.is_empty());
    }

    #[test]
    fn test_load_empty_when_blob_corrupt() {
        let kv: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        kv.write(ISSUES_KEY, "{{{").unwrap();
        let store = ContentStore::load(kv);
        assert!(store.is_empty());
    }

    #[test]
    fn test_merge_remote_persists_full_collection() {
        let kv: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let mut store = ContentStore::load(Arc::clone(&kv));
        store
            .merge_remote(vec![
                issue(json!({"id": "A", "start": "2025-01-01"})),
                issue(json!({"id": "B", "start": "2025-01-08"})),
            ])
            .unwrap();
        store
            .merge_remote(vec![issue(json!({"id": "A", "start": "2025-01-01", "title": "v2"}))])
            .unwrap();

        let reloaded = ContentStore::load(kv);
        assert_eq!(reloaded.len(), 2);
        assert_eq!(reloaded.get("A").unwrap().title.as_deref(), Some("v2"));
        assert_eq!(reloaded.issues(), store.issues());
    }

    #[test]
    fn test_sorted_newest_first() {
        let kv: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let mut store = ContentStore::load(kv);
        store
            .merge_remote(vec![
                issue(json!({"id": "old", "start": "2024-12-30"})),
                issue(json!({"id": "new", "start": "2025-01-06"})),
            ])
            .unwrap();
        let ids: Vec<String> = store.sorted().into_iter().map(|i| i.id).collect();
        assert_eq!(ids, vec!["new", "old"]);
        assert_eq!(store.issues()[0].id, "old");
    }

    #[test]
    fn test_export_is_pretty_and_reimportable() {
        let kv: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let mut store = ContentStore::load(kv);
        store
            .merge_remote(vec![issue(json!({"id": "A", "start": "2025-01-01", "marker": 1}))])
            .unwrap();

        let exported = store.export_json().unwrap();
        assert!(exported.contains("\n  \"issues\""));

        let back: ContentPayload = serde_json::from_str(&exported).unwrap();
        assert_eq!(merge(store.issues().to_vec(), back.issues), store.issues());
    }
}
