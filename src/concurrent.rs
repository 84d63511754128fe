//! ConcurrentMap: an `IncrementalMap` behind a single reader/writer lock.
//!
//! Writers always take the exclusive lock. Readers take the shared lock
//! only while the map is stable; through a shared guard the map is only
//! reachable as `&IncrementalMap`, whose lookups never step a migration.
//! A lookup that finds the map migrating drops the shared guard and
//! retries under the exclusive lock, where it is allowed to step.

use crate::config::{Config, ConfigError};
use crate::incremental::IncrementalMap;
use crate::key::Key;
use core::fmt;
use parking_lot::RwLock;

pub struct ConcurrentMap<K, V> {
    inner: RwLock<IncrementalMap<K, V>>,
}

impl<K: Key, V> ConcurrentMap<K, V> {
    pub fn new() -> Self {
        Self::from(IncrementalMap::new())
    }

    pub fn with_buckets(buckets: usize) -> Result<Self, ConfigError> {
        IncrementalMap::with_buckets(buckets).map(Self::from)
    }

    pub fn with_config(config: Config) -> Result<Self, ConfigError> {
        IncrementalMap::with_config(config).map(Self::from)
    }

    /// Upsert under the exclusive lock. Returns `true` when the key was new.
    pub fn put(&self, key: K, value: V) -> bool {
        self.inner.write().put(key, value)
    }

    pub fn delete(&self, key: &K) -> bool {
        self.inner.write().delete(key)
    }

    pub fn remove(&self, key: &K) -> Option<V> {
        self.inner.write().remove(key)
    }

    /// Run `f` on the value stored for `key`.
    pub fn get_with<R, F>(&self, key: &K, f: F) -> Option<R>
    where
        F: FnOnce(&V) -> R,
    {
        {
            let map = self.inner.read();
            if !map.is_migrating() {
                return map.peek(key).map(f);
            }
        }
        // The state may have changed since the shared guard was dropped;
        // the stepping `get` is correct in either state.
        self.inner.write().get(key).map(f)
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.inner.read().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }

    pub fn is_migrating(&self) -> bool {
        self.inner.read().is_migrating()
    }

    pub fn bucket_count(&self) -> usize {
        self.inner.read().bucket_count()
    }

    pub fn finish_migration(&self) {
        self.inner.write().finish_migration()
    }

    pub fn into_inner(self) -> IncrementalMap<K, V> {
        self.inner.into_inner()
    }
}

impl<K: Key, V: Clone> ConcurrentMap<K, V> {
    pub fn get(&self, key: &K) -> Option<V> {
        self.get_with(key, V::clone)
    }
}

impl<K: Key, V> Default for ConcurrentMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> From<IncrementalMap<K, V>> for ConcurrentMap<K, V> {
    fn from(map: IncrementalMap<K, V>) -> Self {
        Self {
            inner: RwLock::new(map),
        }
    }
}

impl<K, V> fmt::Debug for ConcurrentMap<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.inner.try_read() {
            Some(map) => f.debug_tuple("ConcurrentMap").field(&*map).finish(),
            None => f.write_str("ConcurrentMap { <locked> }"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::StringKey;

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn is_send_and_sync() {
        assert_send_sync::<ConcurrentMap<StringKey, String>>();
    }

    /// Invariant: a stable lookup goes through the shared path and leaves
    /// the map untouched; a migrating lookup steps the migration.
    #[test]
    fn lookups_step_only_while_migrating() {
        let m = ConcurrentMap::with_buckets(4).unwrap();
        for i in 0..4 {
            m.put(StringKey::new(i.to_string()), i);
        }
        assert!(!m.is_migrating());
        assert_eq!(m.get(&StringKey::from("2")), Some(2));

        m.put(StringKey::from("4"), 4);
        assert!(m.is_migrating());
        let mut ops = 0;
        while m.is_migrating() {
            assert_eq!(m.get(&StringKey::from("0")), Some(0));
            ops += 1;
        }
        assert!(ops <= 4);
        assert_eq!(m.bucket_count(), 8);
        assert_eq!(m.into_inner().len(), 5);
    }

    #[test]
    fn get_with_avoids_clone() {
        let m: ConcurrentMap<StringKey, Vec<u8>> = ConcurrentMap::new();
        m.put(StringKey::from("k"), vec![1, 2, 3]);
        assert_eq!(m.get_with(&StringKey::from("k"), |v| v.len()), Some(3));
        assert_eq!(m.get_with(&StringKey::from("x"), |v| v.len()), None);
    }

    #[test]
    fn debug_shows_inner_map() {
        let m: ConcurrentMap<StringKey, i32> = ConcurrentMap::with_buckets(2).unwrap();
        assert_eq!(
            format!("{:?}", m),
            "ConcurrentMap(IncrementalMap { len: 0, buckets: 2 })"
        );
        let _g = m.inner.write();
        assert_eq!(format!("{:?}", m), "ConcurrentMap { <locked> }");
    }
}
