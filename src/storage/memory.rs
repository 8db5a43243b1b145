use dashmap::DashMap;
use serde_json::Value;
use tokio::time::Instant;

use crate::entry::CacheEntry;
use std::time::Duration;

/// Process-local memory tier.
///
/// Fastest tier, lost on restart. Expiry is checked on read; dead entries
/// linger until the periodic sweep or the next overwrite reclaims them.
pub struct MemoryStore {
    data: DashMap<String, CacheEntry>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self {
            data: DashMap::new(),
        }
    }

    /// Get current entry count (including not-yet-swept expired entries)
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Clear all entries
    pub fn clear(&self) {
        self.data.clear();
    }

    /// Fetch an entry if it exists and has not expired.
    #[must_use]
    pub fn get_live(&self, key: &str) -> Option<CacheEntry> {
        self.data
            .get(key)
            .filter(|entry| !entry.is_expired())
            .map(|entry| entry.value().clone())
    }

    /// Time left before `key` expires; `None` when absent or already dead.
    #[must_use]
    pub fn remaining(&self, key: &str) -> Option<Duration> {
        self.data.get(key).and_then(|entry| entry.remaining())
    }

    /// Insert or fully replace an entry.
    pub fn insert(&self, key: &str, value: Value, ttl: Duration, tags: Vec<String>) {
        self.data
            .insert(key.to_string(), CacheEntry::new(value, ttl, tags));
    }

    /// Remove a single key. Idempotent.
    pub fn remove(&self, key: &str) -> bool {
        self.data.remove(key).is_some()
    }

    /// Remove every entry whose tag set intersects `tags`.
    /// Returns the number of entries removed.
    pub fn remove_tagged(&self, tags: &[String]) -> usize {
        let mut removed = 0;
        self.data.retain(|_, entry| {
            if entry.has_any_tag(tags) {
                removed += 1;
                false
            } else {
                true
            }
        });
        removed
    }

    /// Remove every entry whose key contains `fragment` (the pattern-sweep
    /// primitive, wildcard already stripped by the caller).
    pub fn remove_containing(&self, fragment: &str) -> usize {
        let mut removed = 0;
        self.data.retain(|key, _| {
            if key.contains(fragment) {
                removed += 1;
                false
            } else {
                true
            }
        });
        removed
    }

    /// Drop every entry whose expiry has passed.
    /// Returns the number of entries removed.
    pub fn clean_expired(&self) -> usize {
        let now = Instant::now();
        let mut removed = 0;
        self.data.retain(|_, entry| {
            if now >= entry.expires_at {
                removed += 1;
                false
            } else {
                true
            }
        });
        removed
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn secs(n: u64) -> Duration {
        Duration::from_secs(n)
    }

    #[tokio::test]
    async fn new_store_is_empty() {
        let store = MemoryStore::new();
        assert!(store.is_empty());
        assert_eq!(store.len(), 0);
    }

    #[tokio::test]
    async fn insert_and_get_live() {
        let store = MemoryStore::new();
        store.insert("k", json!({"v": 1}), secs(60), vec![]);

        let entry = store.get_live("k").unwrap();
        assert_eq!(entry.value, json!({"v": 1}));
        assert!(store.get_live("missing").is_none());
    }

    #[tokio::test]
    async fn expired_entry_reads_as_absent() {
        let store = MemoryStore::new();
        store.insert("dead", json!(1), secs(0), vec![]);

        assert!(store.get_live("dead").is_none());
        assert!(store.remaining("dead").is_none());
        // Still occupies a slot until swept
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn clean_expired_removes_only_dead_entries() {
        let store = MemoryStore::new();
        store.insert("dead", json!(1), secs(0), vec![]);
        store.insert("alive", json!(2), secs(60), vec![]);

        let removed = store.clean_expired();
        assert_eq!(removed, 1);
        assert_eq!(store.len(), 1);
        assert!(store.get_live("alive").is_some());
    }

    #[tokio::test]
    async fn remove_is_idempotent() {
        let store = MemoryStore::new();
        store.insert("k", json!(1), secs(60), vec![]);

        assert!(store.remove("k"));
        assert!(!store.remove("k"));
        assert!(!store.remove("never-existed"));
    }

    #[tokio::test]
    async fn insert_overwrites_value_and_tags() {
        let store = MemoryStore::new();
        store.insert("k", json!(1), secs(60), vec!["old".into()]);
        store.insert("k", json!(2), secs(60), vec!["new".into()]);

        assert_eq!(store.len(), 1);
        let entry = store.get_live("k").unwrap();
        assert_eq!(entry.value, json!(2));
        assert_eq!(entry.tags, vec!["new".to_string()]);
    }

    #[tokio::test]
    async fn remove_tagged_intersects() {
        let store = MemoryStore::new();
        store.insert("a", json!(1), secs(60), vec!["x".into()]);
        store.insert("b", json!(2), secs(60), vec!["x".into(), "y".into()]);
        store.insert("c", json!(3), secs(60), vec!["y".into()]);

        let removed = store.remove_tagged(&["x".to_string()]);
        assert_eq!(removed, 2);
        assert!(store.get_live("a").is_none());
        assert!(store.get_live("b").is_none());
        assert!(store.get_live("c").is_some());
    }

    #[tokio::test]
    async fn remove_containing_matches_substring() {
        let store = MemoryStore::new();
        store.insert("products:1", json!(1), secs(60), vec![]);
        store.insert("products:2", json!(2), secs(60), vec![]);
        store.insert("news:1", json!(3), secs(60), vec![]);

        let removed = store.remove_containing("products:");
        assert_eq!(removed, 2);
        assert_eq!(store.len(), 1);
        assert!(store.get_live("news:1").is_some());
    }

    #[tokio::test]
    async fn concurrent_inserts() {
        use std::sync::Arc;

        let store = Arc::new(MemoryStore::new());
        let mut handles = vec![];

        for batch in 0..10 {
            let store_clone = store.clone();
            handles.push(tokio::spawn(async move {
                for i in 0..10 {
                    store_clone.insert(
                        &format!("batch-{}-item-{}", batch, i),
                        json!(i),
                        secs(60),
                        vec![],
                    );
                }
            }));
        }

        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(store.len(), 100);
    }
}
