//! rehash-map: an in-memory hash map that grows incrementally, plus a
//! lock-guarded wrapper for sharing it between threads.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: never pay for a full rehash inside a single operation. When the
//!   map grows, the move from the old table to the new one is spread over
//!   the operations that follow.
//! - Layers (leaves first):
//!   - `Key`: hash + equality + display capability; `StringKey` caches a
//!     BKDR hash at construction.
//!   - `Entry<K, V>`: owned pair with an in-place replaceable value.
//!   - `Bucket<K, V>`: singly linked collision chain, newest first, nodes
//!     held in a `slotmap` arena.
//!   - `HashTable<K, V>`: power-of-two array of buckets, addressed by
//!     `spread(hash) & mask`.
//!   - `IncrementalMap<K, V>`: two-generation storage with a migration
//!     cursor.
//!   - `ConcurrentMap<K, V>`: the map behind one `parking_lot::RwLock`.
//!
//! States
//! - Stable: one table.
//! - Migrating { old, new, cursor }: `new` has twice the buckets of `old`;
//!   every bucket of `old` below `cursor` is empty.
//! - A put that leaves `len > buckets * load_factor` while stable starts a
//!   migration. Every put/get/delete while migrating moves one non-empty
//!   bucket, so a migration ends within `old.bucket_count()` operations.
//!
//! Invariants
//! - A key lives in at most one table. Writes during a migration go to
//!   `new` and first remove the key from `old`.
//! - `len` counts live keys across both tables.
//! - A bucket's size is the arena's live count; it is never recomputed by
//!   walking the chain.
//!
//! Locking
//! - One lock for the whole map. Mutating calls take it exclusively.
//! - Lookups take it shared only while stable, and then only reach the map
//!   through `&IncrementalMap`, whose lookups cannot step the migration.
//!   While migrating, lookups take the exclusive lock.
//!
//! Errors
//! - Misses are `None`/`false`. Invalid construction parameters are
//!   reported as `ConfigError`. Broken internal bookkeeping panics.
//!
//! Logging
//! - Migration start and completion are logged at `debug`, each step at
//!   `trace`, through the `log` facade. The crate installs no logger.
//!
//! Non-goals
//! - Persistence, networking, transactions, TTL/eviction, shrinking.

pub mod bucket;
pub mod concurrent;
pub mod config;
pub mod entry;
pub mod incremental;
mod incremental_proptest;
pub mod key;
pub mod table;

// Public surface
pub use concurrent::ConcurrentMap;
pub use config::{Config, ConfigError};
pub use entry::Entry;
pub use incremental::IncrementalMap;
pub use key::{Key, StringKey};
