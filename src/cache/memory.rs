//! In-memory cache store.

use std::collections::HashMap;

use parking_lot::RwLock;

use crate::cache::{CacheEntry, CacheStore};

/// Process-local cache store. Writes replace entries under a write lock, so
/// readers always observe either the old or the new entry, never a mix.
#[derive(Debug, Default)]
pub struct MemoryCacheStore {
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl MemoryCacheStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries, fresh or not.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl CacheStore for MemoryCacheStore {
    fn get(&self, key: &str) -> Option<CacheEntry> {
        self.entries.read().get(key).cloned()
    }

    fn set(&self, key: &str, entry: CacheEntry) {
        self.entries.write().insert(key.to_string(), entry);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_get_after_set() {
        let store = MemoryCacheStore::new();
        let entry = CacheEntry {
            payload: serde_json::json!({"items": [1, 2, 3]}),
            computed_at: Utc::now(),
            ttl_secs: 60,
        };

        store.set("search:donate", entry.clone());
        let fetched = store.get("search:donate").unwrap();
        assert_eq!(fetched.payload, entry.payload);
    }

    #[test]
    fn test_set_replaces_atomically() {
        let store = MemoryCacheStore::new();
        let first = CacheEntry {
            payload: serde_json::json!("first"),
            computed_at: Utc::now(),
            ttl_secs: 60,
        };
        let second = CacheEntry {
            payload: serde_json::json!("second"),
            computed_at: Utc::now(),
            ttl_secs: 60,
        };

        store.set("k", first);
        store.set("k", second);
        assert_eq!(store.get("k").unwrap().payload, serde_json::json!("second"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_absent_key() {
        let store = MemoryCacheStore::new();
        assert!(store.get("missing").is_none());
    }
}
