//! Insertion-ordered, key-unique mapping.

use ahash::AHashMap;
use std::fmt;

use crate::model::{Key, Tree};

/// Ordered map from [`Key`] to [`Tree`].
///
/// Entries iterate in insertion order. Re-inserting an existing key replaces
/// the value but keeps the slot of the first insertion.
#[derive(Clone, Default)]
pub struct KeyMap {
    entries: Vec<(Key, Tree)>,
    index: AHashMap<Key, usize>,
}

impl KeyMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            index: AHashMap::with_capacity(capacity),
        }
    }

    /// Insert `value` under `key`, returning the value it replaced.
    pub fn insert(&mut self, key: Key, value: Tree) -> Option<Tree> {
        if let Some(&slot) = self.index.get(&key) {
            return Some(std::mem::replace(&mut self.entries[slot].1, value));
        }
        self.index.insert(key.clone(), self.entries.len());
        self.entries.push((key, value));
        None
    }

    pub fn get(&self, key: &Key) -> Option<&Tree> {
        self.index.get(key).map(|&slot| &self.entries[slot].1)
    }

    pub fn contains_key(&self, key: &Key) -> bool {
        self.index.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl ExactSizeIterator<Item = (&Key, &Tree)> + '_ {
        self.entries.iter().map(|(k, v)| (k, v))
    }

    pub fn keys(&self) -> impl ExactSizeIterator<Item = &Key> + '_ {
        self.entries.iter().map(|(k, _)| k)
    }

    pub fn values(&self) -> impl ExactSizeIterator<Item = &Tree> + '_ {
        self.entries.iter().map(|(_, v)| v)
    }
}

impl PartialEq for KeyMap {
    /// Order-sensitive: two maps are equal when their entry lists are equal.
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl fmt::Debug for KeyMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl FromIterator<(Key, Tree)> for KeyMap {
    fn from_iter<I: IntoIterator<Item = (Key, Tree)>>(iter: I) -> Self {
        let iter = iter.into_iter();
        let mut map = KeyMap::with_capacity(iter.size_hint().0);
        for (key, value) in iter {
            map.insert(key, value);
        }
        map
    }
}

impl<const N: usize> From<[(Key, Tree); N]> for KeyMap {
    fn from(entries: [(Key, Tree); N]) -> Self {
        entries.into_iter().collect()
    }
}

impl IntoIterator for KeyMap {
    type Item = (Key, Tree);
    type IntoIter = std::vec::IntoIter<(Key, Tree)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}
