//! Ordered string map with longest-prefix lookup
//!
//! Mount tables are queried with paths that extend a stored key
//! (`mountpoint` + `/sub/path`), so exact lookup is not enough. Keys are
//! kept in a `BTreeMap` and matched by character prefix, the way a trie
//! would match them: `mnt2` is a prefix of both `mnt2/a.bin` and `mnt20`.

use std::collections::BTreeMap;

/// String-keyed map answering "which stored key is the longest prefix of
/// this query?"
#[derive(Debug, Clone, Default)]
pub struct PrefixMap<V> {
    entries: BTreeMap<String, V>,
}

impl<V> PrefixMap<V> {
    pub fn new() -> Self {
        PrefixMap {
            entries: BTreeMap::new(),
        }
    }

    /// Insert or overwrite a key, returning the previous value
    pub fn insert(&mut self, key: impl Into<String>, value: V) -> Option<V> {
        self.entries.insert(key.into(), value)
    }

    pub fn get(&self, key: &str) -> Option<&V> {
        self.entries.get(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<V> {
        self.entries.remove(key)
    }

    /// Find the longest stored key that is a prefix of `query`
    ///
    /// Returns the matched key together with its value. The empty key, if
    /// stored, matches every query.
    pub fn longest_prefix(&self, query: &str) -> Option<(&str, &V)> {
        if self.entries.is_empty() {
            return None;
        }

        // Walk candidate prefixes from longest to shortest on char boundaries
        let boundaries = query
            .char_indices()
            .map(|(idx, _)| idx)
            .chain(std::iter::once(query.len()));
        let mut candidates: Vec<usize> = boundaries.collect();
        candidates.reverse();

        for end in candidates {
            if let Some((key, value)) = self.entries.get_key_value(&query[..end]) {
                return Some((key.as_str(), value));
            }
        }

        None
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Iterate entries in key order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}
