//! Bucket: a singly linked collision chain.
//!
//! Nodes live in a `SlotMap` arena and link to each other through
//! generational keys, so the chain can be relinked without raw pointers.
//! The arena is allocated by the first insert and released once `pop`
//! drains the chain, so an empty bucket owns no heap memory.
//! The newest node is the head: `put` prepends and `pop` takes the head,
//! both O(1). Lookups and deletes walk the chain.

use crate::entry::Entry;
use core::fmt;
use slotmap::{DefaultKey, SlotMap};

const DANGLING: &str = "bucket link must refer to a live node";

struct Node<K, V> {
    entry: Entry<K, V>,
    next: Option<DefaultKey>,
}

type Arena<K, V> = SlotMap<DefaultKey, Node<K, V>>;

pub struct Bucket<K, V> {
    nodes: Option<Arena<K, V>>, // None until the first insert
    head: Option<DefaultKey>,
}

/// Iterator over a bucket's entries, head first.
pub struct Iter<'a, K, V> {
    nodes: Option<&'a Arena<K, V>>,
    cur: Option<DefaultKey>,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = &'a Entry<K, V>;
    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let k = self.cur?;
        let node = self.nodes.and_then(|n| n.get(k)).expect(DANGLING);
        self.cur = node.next;
        Some(&node.entry)
    }
}

impl<K, V> Bucket<K, V> {
    /// An empty chain. Does not allocate.
    pub const fn new() -> Self {
        Self {
            nodes: None,
            head: None,
        }
    }

    /// Number of entries; read from the arena's live count.
    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.as_ref().map_or(0, SlotMap::len)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            nodes: self.nodes.as_ref(),
            cur: self.head,
        }
    }

    #[inline]
    fn node(&self, k: DefaultKey) -> &Node<K, V> {
        self.nodes.as_ref().and_then(|n| n.get(k)).expect(DANGLING)
    }

    #[inline]
    fn node_mut(&mut self, k: DefaultKey) -> &mut Node<K, V> {
        self.nodes.as_mut().and_then(|n| n.get_mut(k)).expect(DANGLING)
    }

    fn unlink(&mut self, k: DefaultKey) -> Node<K, V> {
        self.nodes.as_mut().and_then(|n| n.remove(k)).expect(DANGLING)
    }

    /// Remove and return the head entry. Draining the last node frees the arena.
    pub fn pop(&mut self) -> Option<Entry<K, V>> {
        let head = self.head?;
        let node = self.unlink(head);
        self.head = node.next;
        if self.head.is_none() {
            self.nodes = None;
        }
        Some(node.entry)
    }
}

impl<K: Eq, V> Bucket<K, V> {
    fn find(&self, key: &K) -> Option<DefaultKey> {
        let mut cur = self.head;
        while let Some(k) = cur {
            let node = self.node(k);
            if node.entry.key() == key {
                return Some(k);
            }
            cur = node.next;
        }
        None
    }

    /// Upsert. Returns `true` when a new node was prepended, `false` when an
    /// existing entry had its value overwritten in place.
    pub fn put(&mut self, entry: Entry<K, V>) -> bool {
        if let Some(k) = self.find(entry.key()) {
            self.node_mut(k).entry.set_value(entry.into_value());
            return false;
        }
        let next = self.head;
        let nodes = self.nodes.get_or_insert_with(SlotMap::with_key);
        self.head = Some(nodes.insert(Node { entry, next }));
        true
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        self.find(key).map(|k| self.node(k).entry.value())
    }

    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        let k = self.find(key)?;
        Some(self.node_mut(k).entry.value_mut())
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.find(key).is_some()
    }

    /// Unlink every node whose key equals `key`. Returns the first removed
    /// entry and how many nodes were removed.
    pub fn delete(&mut self, key: &K) -> (Option<Entry<K, V>>, usize) {
        let mut first = None;
        let mut removed = 0;
        let mut prev: Option<DefaultKey> = None;
        let mut cur = self.head;

        while let Some(k) = cur {
            let node = self.node(k);
            let next = node.next;
            if node.entry.key() == key {
                match prev {
                    Some(p) => self.node_mut(p).next = next,
                    None => self.head = next,
                }
                let node = self.unlink(k);
                removed += 1;
                if first.is_none() {
                    first = Some(node.entry);
                }
            } else {
                prev = Some(k);
            }
            cur = next;
        }

        (first, removed)
    }
}

impl<K: Clone, V: Clone> Bucket<K, V> {
    /// Snapshot copy of the chain, head first.
    pub fn entries(&self) -> Vec<Entry<K, V>> {
        self.iter().cloned().collect()
    }
}

impl<K, V> Default for Bucket<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for Bucket<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<K: fmt::Display, V: fmt::Display> fmt::Display for Bucket<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for e in self.iter() {
            write!(f, "{},", e)?;
        }
        f.write_str("]")
    }
}
