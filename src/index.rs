//! Key Index
//!
//! In-memory mapping from key to the log offset of that key's newest record.
//!
//! The index is a cache: it is never persisted and can always be rebuilt by
//! replaying the log from offset 0.

use std::collections::HashMap;

/// Key → offset of the newest record for that key
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct KeyIndex {
    offsets: HashMap<Vec<u8>, u64>,
}

impl KeyIndex {
    /// Create an empty index
    pub fn new() -> Self {
        Self::default()
    }

    /// Point `key` at `offset`, returning the offset it replaced
    pub fn insert(&mut self, key: Vec<u8>, offset: u64) -> Option<u64> {
        self.offsets.insert(key, offset)
    }

    /// Offset of the newest record for `key`
    pub fn get(&self, key: &[u8]) -> Option<u64> {
        self.offsets.get(key).copied()
    }

    pub fn contains(&self, key: &[u8]) -> bool {
        self.offsets.contains_key(key)
    }

    /// Number of distinct keys
    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    /// Iterate over (key, offset) pairs in arbitrary order
    pub fn iter(&self) -> impl Iterator<Item = (&[u8], u64)> + '_ {
        self.offsets.iter().map(|(k, &off)| (k.as_slice(), off))
    }

    /// Compare against an index re-derived from the log
    ///
    /// `self` is the live index, `derived` the fresh replay.
    pub fn diff(&self, derived: &KeyIndex) -> IndexDiff {
        let mut diff = IndexDiff::default();

        for (key, expected) in derived.iter() {
            match self.get(key) {
                None => diff.missing.push(key.to_vec()),
                Some(actual) if actual != expected => diff.stale.push(StaleEntry {
                    key: key.to_vec(),
                    indexed: actual,
                    newest: expected,
                }),
                Some(_) => {}
            }
        }

        for (key, _) in self.iter() {
            if !derived.contains(key) {
                diff.unexpected.push(key.to_vec());
            }
        }

        diff
    }
}

/// Differences between the live index and one rebuilt from the log
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct IndexDiff {
    /// Keys present in the log but absent from the live index
    pub missing: Vec<Vec<u8>>,
    /// Keys whose live offset is not their newest record
    pub stale: Vec<StaleEntry>,
    /// Keys in the live index that the log does not contain
    pub unexpected: Vec<Vec<u8>>,
}

impl IndexDiff {
    pub fn is_consistent(&self) -> bool {
        self.missing.is_empty() && self.stale.is_empty() && self.unexpected.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaleEntry {
    pub key: Vec<u8>,
    pub indexed: u64,
    pub newest: u64,
}
