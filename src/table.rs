//! HashTable: a fixed, power-of-two sized array of buckets.

use crate::bucket::Bucket;
use crate::entry::Entry;
use crate::key::{slot, Key};

pub struct HashTable<K, V> {
    buckets: Vec<Bucket<K, V>>,
    mask: usize,
}

impl<K, V> HashTable<K, V> {
    /// Create a table of `size` empty buckets. `size` must be a power of two.
    ///
    /// Empty buckets own no heap memory, so this makes a single allocation
    /// for the bucket array.
    pub fn with_buckets(size: usize) -> Self {
        assert!(size.is_power_of_two(), "bucket count must be a power of two");
        let mut buckets = Vec::with_capacity(size);
        buckets.resize_with(size, Bucket::new);
        Self {
            buckets,
            mask: size - 1,
        }
    }

    #[inline]
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    #[inline]
    pub fn mask(&self) -> usize {
        self.mask
    }

    pub fn bucket(&self, index: usize) -> Option<&Bucket<K, V>> {
        self.buckets.get(index)
    }

    pub fn bucket_mut(&mut self, index: usize) -> Option<&mut Bucket<K, V>> {
        self.buckets.get_mut(index)
    }

    // O(buckets); the map keeps its own count.
    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.buckets.iter().map(Bucket::len).sum()
    }

    #[cfg(test)]
    pub(crate) fn is_empty(&self) -> bool {
        self.buckets.iter().all(Bucket::is_empty)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entry<K, V>> {
        self.buckets.iter().flat_map(|b| b.iter())
    }
}

impl<K: Key, V> HashTable<K, V> {
    #[inline]
    fn slot_for(&self, key: &K) -> usize {
        slot(key.hash_code(), self.buckets.len())
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        self.buckets[self.slot_for(key)].get(key)
    }

    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        let i = self.slot_for(key);
        self.buckets[i].get_mut(key)
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.buckets[self.slot_for(key)].contains_key(key)
    }

    /// Upsert into the addressed bucket; `true` if a new entry was added.
    pub fn put(&mut self, entry: Entry<K, V>) -> bool {
        let i = self.slot_for(entry.key());
        self.buckets[i].put(entry)
    }

    pub fn delete(&mut self, key: &K) -> (Option<Entry<K, V>>, usize) {
        let i = self.slot_for(key);
        self.buckets[i].delete(key)
    }

    /// Move an entry in during migration. Same addressing and upsert
    /// semantics as `put`.
    pub fn push(&mut self, entry: Entry<K, V>) -> bool {
        self.put(entry)
    }
}

/// An empty, bucketless table. Only used as a stand-in while a table is
/// moved between map states; never addressed.
impl<K, V> Default for HashTable<K, V> {
    fn default() -> Self {
        Self {
            buckets: Vec::new(),
            mask: 0,
        }
    }
}
