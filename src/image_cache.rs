//! Article URL → image URL cache.
//!
//! The table only grows: entries never expire and are never invalidated.
//! Every call reads the current table from the persistence adapter, so two
//! resolvers sharing an adapter see each other's writes; concurrent inserts
//! race and the last write wins. Failures are logged and treated as a miss.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::storage::{IMAGE_CACHE_KEY, KeyValueStore, read_json, write_json};

pub struct ImageCache {
    kv: Arc<dyn KeyValueStore>,
}

impl ImageCache {
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self { kv }
    }

    fn table(&self) -> BTreeMap<String, String> {
        match read_json(self.kv.as_ref(), IMAGE_CACHE_KEY) {
            Ok(table) => table.unwrap_or_default(),
            Err(e) => {
                warn!(error = %e, "Image cache unreadable; treating as empty");
                BTreeMap::new()
            }
        }
    }

    pub fn get(&self, article_url: &str) -> Option<String> {
        self.table().remove(article_url)
    }

    pub fn insert(&self, article_url: &str, image_url: &str) {
        let mut table = self.table();
        table.insert(article_url.to_string(), image_url.to_string());
        match write_json(self.kv.as_ref(), IMAGE_CACHE_KEY, &table) {
            Ok(()) => debug!(%article_url, %image_url, entries = table.len(), "Cached image"),
            Err(e) => warn!(%article_url, error = %e, "Could not persist image cache"),
        }
    }

    pub fn len(&self) -> usize {
        self.table().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    #[test]
    fn test_insert_then_get() {
        let cache = ImageCache::new(Arc::new(MemoryStore::new()));
        assert!(cache.is_empty());
        cache.insert("https://a.test/story", "https://a.test/hero.jpg");
        assert_eq!(
            cache.get("https://a.test/story").as_deref(),
            Some("https://a.test/hero.jpg")
        );
        assert_eq!(cache.get("https://a.test/other"), None);
    }

    #[test]
    fn test_two_handles_share_adapter() {
        let kv: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let first = ImageCache::new(Arc::clone(&kv));
        let second = ImageCache::new(kv);

        first.insert("https://a.test/1", "https://a.test/1.jpg");
        second.insert("https://a.test/2", "https://a.test/2.jpg");
        second.insert("https://a.test/1", "https://a.test/1b.jpg");

        assert_eq!(first.len(), 2);
        assert_eq!(first.get("https://a.test/1").as_deref(), Some("https://a.test/1b.jpg"));
    }

    #[test]
    fn test_corrupt_table_is_a_miss() {
        let kv: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        kv.write(IMAGE_CACHE_KEY, "[1, 2").unwrap();
        let cache = ImageCache::new(kv);
        assert_eq!(cache.get("https://a.test/1"), None);

        cache.insert("https://a.test/1", "https://a.test/1.jpg");
        assert_eq!(cache.len(), 1);
    }
}
