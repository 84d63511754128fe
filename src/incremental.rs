//! IncrementalMap: a two-generation hash map that grows without a full rehash.
//!
//! While migrating, every `put`, `get` and `delete` moves one non-empty
//! bucket from the old table into the new one. Each step advances the
//! cursor by at least one bucket, so a migration finishes within
//! `old.bucket_count()` operations.
//!
//! A key is never stored in both tables: a write during migration first
//! scrubs the key from the old table, then lands in the new one.

use crate::bucket::Bucket;
use crate::config::{Config, ConfigError};
use crate::entry::Entry;
use crate::key::Key;
use crate::table::HashTable;
use core::{fmt, mem};
use log::{debug, trace};

enum State<K, V> {
    Stable {
        table: HashTable<K, V>,
    },
    /// `new` has twice the buckets of `old`; buckets of `old` below
    /// `cursor` are empty.
    Migrating {
        old: HashTable<K, V>,
        new: HashTable<K, V>,
        cursor: usize,
    },
}

pub struct IncrementalMap<K, V> {
    state: State<K, V>,
    len: usize, // live keys across both tables
    load_factor: usize,
}

impl<K: Key, V> IncrementalMap<K, V> {
    pub fn new() -> Self {
        Self::from_valid_config(Config::default())
    }

    pub fn with_buckets(buckets: usize) -> Result<Self, ConfigError> {
        Self::with_config(Config::default().with_initial_buckets(buckets))
    }

    pub fn with_config(config: Config) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::from_valid_config(config))
    }

    fn from_valid_config(config: Config) -> Self {
        Self {
            state: State::Stable {
                table: HashTable::with_buckets(config.initial_buckets),
            },
            len: 0,
            load_factor: config.load_factor,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_migrating(&self) -> bool {
        matches!(self.state, State::Migrating { .. })
    }

    /// Bucket count of the active table (the old one while migrating).
    pub fn bucket_count(&self) -> usize {
        match &self.state {
            State::Stable { table } => table.bucket_count(),
            State::Migrating { old, .. } => old.bucket_count(),
        }
    }

    pub fn migration_cursor(&self) -> Option<usize> {
        match self.state {
            State::Stable { .. } => None,
            State::Migrating { cursor, .. } => Some(cursor),
        }
    }

    fn threshold(&self) -> usize {
        self.bucket_count().saturating_mul(self.load_factor)
    }

    /// Upsert `key -> value`. Returns `true` when the key was not present.
    pub fn put(&mut self, key: K, value: V) -> bool {
        let entry = Entry::new(key, value);
        let (inserted, stale) = match &mut self.state {
            State::Stable { table } => (table.put(entry), 0),
            State::Migrating { old, new, .. } => {
                let (_, stale) = old.delete(entry.key());
                (new.put(entry), stale)
            }
        };
        self.len += usize::from(inserted);
        self.len -= stale;

        if self.is_migrating() {
            self.migrate_step();
        } else if self.len > self.threshold() {
            self.begin_migration();
        }
        inserted && stale == 0
    }

    /// Look up `key`, advancing a running migration by one step.
    pub fn get(&mut self, key: &K) -> Option<&V> {
        self.migrate_step();
        self.peek(key)
    }

    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        self.migrate_step();
        match &mut self.state {
            State::Stable { table } => table.get_mut(key),
            State::Migrating { old, new, .. } => new.get_mut(key).or_else(|| old.get_mut(key)),
        }
    }

    /// Look up `key` without touching the migration. Needs only shared access.
    pub fn peek(&self, key: &K) -> Option<&V> {
        match &self.state {
            State::Stable { table } => table.get(key),
            State::Migrating { old, new, .. } => new.get(key).or_else(|| old.get(key)),
        }
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.peek(key).is_some()
    }

    /// Remove `key` from every table. Returns whether anything was removed.
    pub fn delete(&mut self, key: &K) -> bool {
        self.remove_all(key).1 > 0
    }

    /// Remove `key`, returning its value if it was present.
    pub fn remove(&mut self, key: &K) -> Option<V> {
        self.remove_all(key).0
    }

    fn remove_all(&mut self, key: &K) -> (Option<V>, usize) {
        let (first, removed) = match &mut self.state {
            State::Stable { table } => table.delete(key),
            State::Migrating { old, new, .. } => {
                let (from_old, n) = old.delete(key);
                let (from_new, m) = new.delete(key);
                (from_new.or(from_old), n + m)
            }
        };
        self.len -= removed;
        self.migrate_step();
        (first.map(Entry::into_value), removed)
    }

    /// Drive a running migration to completion.
    pub fn finish_migration(&mut self) {
        while self.is_migrating() {
            self.migrate_step();
        }
    }

    /// Entries of both tables; the new table first while migrating.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        let (first, second) = match &self.state {
            State::Stable { table } => (table, None),
            State::Migrating { old, new, .. } => (new, Some(old)),
        };
        first
            .iter()
            .chain(second.into_iter().flat_map(|t| t.iter()))
            .map(|e| (e.key(), e.value()))
    }

    fn begin_migration(&mut self) {
        let State::Stable { table } = &mut self.state else {
            return;
        };
        let Some(size) = table.bucket_count().checked_mul(2) else {
            return;
        };
        let old = mem::take(table);
        debug!(
            "incremental rehash started: {} -> {} buckets, {} entries",
            old.bucket_count(),
            size,
            self.len
        );
        self.state = State::Migrating {
            old,
            new: HashTable::with_buckets(size),
            cursor: 0,
        };
    }

    /// Move the next non-empty bucket of the old table into the new one.
    fn migrate_step(&mut self) {
        let State::Migrating { old, new, cursor } = &mut self.state else {
            return;
        };
        let size = old.bucket_count();
        while *cursor < size && old.bucket(*cursor).map_or(true, Bucket::is_empty) {
            *cursor += 1;
        }

        if let Some(bucket) = old.bucket_mut(*cursor) {
            let expected = bucket.len();
            let mut moved = 0;
            while let Some(entry) = bucket.pop() {
                new.push(entry);
                moved += 1;
            }
            assert_eq!(
                moved, expected,
                "bucket {} yielded a different entry count than it reported",
                *cursor
            );
            trace!("migrated bucket {} ({} entries)", *cursor, moved);
            *cursor += 1;
        }

        if *cursor >= size {
            self.complete_migration();
        }
    }

    fn complete_migration(&mut self) {
        if let State::Migrating { new, .. } = &mut self.state {
            let table = mem::take(new);
            debug!(
                "incremental rehash complete: {} buckets, {} entries",
                table.bucket_count(),
                self.len
            );
            self.state = State::Stable { table };
        }
    }
}

impl<K: Key, V> Default for IncrementalMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> fmt::Debug for IncrementalMap<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut d = f.debug_struct("IncrementalMap");
        d.field("len", &self.len);
        match &self.state {
            State::Stable { table } => d.field("buckets", &table.bucket_count()),
            State::Migrating { old, new, cursor } => d
                .field("buckets", &old.bucket_count())
                .field("growing", &new.bucket_count())
                .field("cursor", cursor),
        };
        d.finish()
    }
}
