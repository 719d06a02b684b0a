//! MemoCache - read-through memoization
//!
//! A small key-value cache sitting in front of repeated lookups. Used by the
//! config layer and, structurally, by the store's board aggregate registry.
//!
//! Unbounded on purpose: the working set is one user's local boards, not a
//! server cache. That is a known scaling limit.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Mutex;

/// Unbounded key-value memoization cache
pub struct MemoCache<K, V> {
    entries: Mutex<HashMap<K, V>>,
}

impl<K, V> MemoCache<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    // A poisoned lock only means a panic elsewhere while holding it; the
    // map itself is still usable
    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<K, V>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Look up a cached value
    pub fn get(&self, key: &K) -> Option<V> {
        self.lock().get(key).cloned()
    }

    /// Insert or replace a value
    pub fn set(&self, key: K, value: V) {
        self.lock().insert(key, value);
    }

    /// Drop one entry; returns true if it was present
    pub fn invalidate(&self, key: &K) -> bool {
        self.lock().remove(key).is_some()
    }

    /// Drop everything
    pub fn clear(&self) {
        self.lock().clear();
    }

    /// True if the key currently has a cached value
    pub fn contains(&self, key: &K) -> bool {
        self.lock().contains_key(key)
    }

    /// Mutate a cached entry in place, if present. Returns true when the
    /// entry existed and was updated.
    pub fn update<F>(&self, key: &K, f: F) -> bool
    where
        F: FnOnce(&mut V),
    {
        let mut entries = self.lock();
        match entries.get_mut(key) {
            Some(value) => {
                f(value);
                true
            }
            None => false,
        }
    }
}

impl<K, V> Default for MemoCache<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}
