//! Key to resolved-URL memo
//!
//! A correctness cache: presence of a key means the image is known to load.
//! There is no capacity bound and no expiry; entries leave only through
//! [`CacheStore::invalidate`] or [`CacheStore::clear`].

use crate::types::CacheEntry;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

/// Concurrent memo of successfully loaded keys
#[derive(Debug, Default)]
pub struct CacheStore {
    inner: DashMap<String, CacheEntry>,
}

impl CacheStore {
    /// Create empty cache
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a successful load; existing entries are kept as-is
    ///
    /// Returns `true` if a new entry was created.
    pub fn put(&self, key: &str, resolved_url: &str) -> bool {
        match self.inner.entry(key.to_string()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(CacheEntry::new(key, resolved_url));
                true
            }
        }
    }

    /// Get entry for key
    #[inline]
    #[must_use]
    pub fn get(&self, key: &str) -> Option<CacheEntry> {
        self.inner.get(key).map(|entry| entry.value().clone())
    }

    /// Check if key is cached
    #[inline]
    #[must_use]
    pub fn has(&self, key: &str) -> bool {
        self.inner.contains_key(key)
    }

    /// Remove one entry
    ///
    /// Returns `true` if the key was cached.
    pub fn invalidate(&self, key: &str) -> bool {
        self.inner.remove(key).is_some()
    }

    /// Remove all entries
    pub fn clear(&self) {
        self.inner.clear();
    }

    /// Number of cached keys
    #[inline]
    #[must_use]
    pub fn size(&self) -> usize {
        self.inner.len()
    }

    /// Check if cache is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Snapshot of cached keys, unordered
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        self.inner.iter().map(|entry| entry.key().clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_and_get() {
        let cache = CacheStore::new();
        assert!(cache.put("https://img/a.png", "https://img/a.png"));

        let entry = cache.get("https://img/a.png").unwrap();
        assert_eq!(entry.key, "https://img/a.png");
        assert_eq!(entry.resolved_url, "https://img/a.png");
        assert!(cache.has("https://img/a.png"));
        assert!(!cache.has("https://img/b.png"));
    }

    #[test]
    fn put_is_idempotent() {
        let cache = CacheStore::new();
        assert!(cache.put("k", "first"));
        assert!(!cache.put("k", "second"));

        assert_eq!(cache.size(), 1);
        assert_eq!(cache.get("k").unwrap().resolved_url, "first");
    }

    #[test]
    fn invalidate_removes_single_key() {
        let cache = CacheStore::new();
        cache.put("a", "a");
        cache.put("b", "b");

        assert!(cache.invalidate("a"));
        assert!(!cache.invalidate("a"));
        assert!(!cache.has("a"));
        assert!(cache.has("b"));
    }

    #[test]
    fn clear_resets_size() {
        let cache = CacheStore::new();
        for i in 0..5 {
            let key = format!("https://img/{i}.png");
            cache.put(&key, &key);
        }
        assert_eq!(cache.size(), 5);

        cache.clear();
        assert_eq!(cache.size(), 0);
        assert!(cache.is_empty());
        assert!(!cache.has("https://img/0.png"));
    }

    #[test]
    fn keys_snapshot() {
        let cache = CacheStore::new();
        cache.put("x", "x");
        cache.put("y", "y");

        let mut keys = cache.keys();
        keys.sort();
        assert_eq!(keys, vec!["x".to_string(), "y".to_string()]);
    }
}
