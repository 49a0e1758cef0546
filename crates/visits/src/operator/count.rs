//! Count operators.

use crate::model::CountedEntry;
use indexmap::{map::Entry, IndexMap};
use std::hash::Hash;

/// Counts records per distinct key.
///
/// State is one counter per distinct key seen so far; the records
/// themselves are never retained.  Keys are enumerated in order of first
/// appearance, so output order is a function of input order only.
#[derive(Clone, Debug)]
pub struct GroupedCounter<K> {
    counts: IndexMap<K, u64>,
    total: u64,
}

impl<K> Default for GroupedCounter<K> {
    fn default() -> Self {
        Self {
            counts: IndexMap::new(),
            total: 0,
        }
    }
}

impl<K> GroupedCounter<K>
where
    K: Eq + Hash,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts `records` grouped by `key_of` in a single pass.
    ///
    /// Returns one entry per distinct key.
    pub fn count<T, I, F>(records: I, key_of: F) -> Vec<CountedEntry<K>>
    where
        I: IntoIterator<Item = T>,
        F: FnMut(T) -> K,
    {
        let mut counter = Self::new();
        counter.extend(records.into_iter().map(key_of));
        counter.into_entries().collect()
    }

    /// Records one occurrence of `key`.
    pub fn insert(&mut self, key: K) {
        self.add(key, 1);
    }

    /// Records `count` occurrences of `key`.  Adding zero is a no-op, so no
    /// key ever ends up with a zero count.
    pub fn add(&mut self, key: K, count: u64) {
        if count == 0 {
            return;
        }
        *self.counts.entry(key).or_insert(0) += count;
        self.total += count;
    }

    /// Folds the partial counts of `other` into `self`.
    ///
    /// Counts of keys present in both are summed.  Merging is commutative
    /// and associative up to output order.
    pub fn merge(&mut self, other: Self) {
        self.total += other.total;
        for (key, count) in other.counts {
            match self.counts.entry(key) {
                Entry::Occupied(mut entry) => *entry.get_mut() += count,
                Entry::Vacant(entry) => {
                    entry.insert(count);
                }
            }
        }
    }

    pub fn get(&self, key: &K) -> u64 {
        self.counts.get(key).copied().unwrap_or(0)
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Total number of occurrences counted.
    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, u64)> + '_ {
        self.counts.iter().map(|(k, c)| (k, *c))
    }

    pub fn into_entries(self) -> impl Iterator<Item = CountedEntry<K>> {
        self.counts
            .into_iter()
            .map(|(key, count)| CountedEntry::new(key, count))
    }
}

impl<K> Extend<K> for GroupedCounter<K>
where
    K: Eq + Hash,
{
    fn extend<I: IntoIterator<Item = K>>(&mut self, keys: I) {
        for key in keys {
            self.insert(key);
        }
    }
}

impl<K> FromIterator<K> for GroupedCounter<K>
where
    K: Eq + Hash,
{
    fn from_iter<I: IntoIterator<Item = K>>(keys: I) -> Self {
        let mut counter = Self::new();
        counter.extend(keys);
        counter
    }
}
