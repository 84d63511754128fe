//! Key capability and the string-backed key shipped with the crate.
//!
//! Hashing happens in two stages. `bkdr_hash` runs once when a key is
//! built and its result is cached on the key. `spread` runs every time a
//! table addresses a slot, mixing high bits into the low bits that the
//! table mask keeps.

use core::fmt;
use core::hash::{Hash, Hasher};

/// A value usable as a map key.
///
/// Equality comes from `Eq` and display from `fmt::Display`. Implementors
/// must uphold `a == b` ⇒ `a.hash_code() == b.hash_code()`.
pub trait Key: Eq + fmt::Display {
    fn hash_code(&self) -> u32;
}

const BKDR_SEED: u32 = 131;

/// BKDR multiplicative hash over raw bytes, folded and masked non-negative.
pub fn bkdr_hash(bytes: &[u8]) -> u32 {
    let mut h: u32 = 0;
    for &b in bytes {
        h = h.wrapping_mul(BKDR_SEED).wrapping_add(u32::from(b));
    }
    h ^= h >> 16;
    h & 0x7FFF_FFFF
}

/// Avalanche step applied before masking.
#[inline]
pub fn spread(mut h: u32) -> u32 {
    h ^= (h >> 20) ^ (h >> 12);
    h ^ (h >> 7) ^ (h >> 4)
}

/// Slot index for `hash` in a table of `size` buckets (`size` a power of two).
#[inline]
pub fn slot(hash: u32, size: usize) -> usize {
    debug_assert!(size.is_power_of_two());
    (spread(hash) as usize) & (size - 1)
}

/// String key with a hash computed once at construction.
#[derive(Clone)]
pub struct StringKey {
    text: Box<str>,
    hash: u32,
}

impl StringKey {
    pub fn new(text: impl Into<String>) -> Self {
        let text: String = text.into();
        let text = text.into_boxed_str();
        let hash = bkdr_hash(text.as_bytes());
        Self { text, hash }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }
}

impl Key for StringKey {
    #[inline]
    fn hash_code(&self) -> u32 {
        self.hash
    }
}

impl PartialEq for StringKey {
    fn eq(&self, other: &Self) -> bool {
        self.hash == other.hash && self.text.as_bytes() == other.text.as_bytes()
    }
}

impl Eq for StringKey {}

impl Hash for StringKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.text.hash(state);
    }
}

impl fmt::Display for StringKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl fmt::Debug for StringKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.text, f)
    }
}

impl From<&str> for StringKey {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for StringKey {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}
