//! Accumulators for the aggregation pass.
//!
//! [`BucketMap`] wraps an [`IndexMap`]; its [`BucketMap::entry`]
//! accessor creates a zero-valued bucket on first touch. Lookups through
//! [`BucketMap::get`] never create anything. Insertion order is kept so that
//! rankings with equal counts come out in first-seen order, which makes
//! finalized reports byte-identical across runs.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::hash::Hash;

/// Total/correct counter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tally {
    /// Records counted
    pub total: usize,
    /// Records answered correctly
    pub correct: usize,
}

impl Tally {
    /// Count one record.
    pub fn record(&mut self, correct: bool) {
        self.total += 1;
        if correct {
            self.correct += 1;
        }
    }

    /// `correct / total`, or 0.0 for an empty tally.
    #[must_use]
    pub fn accuracy(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.correct as f64 / self.total as f64
        }
    }

    /// Accuracy in percent.
    #[must_use]
    pub fn accuracy_pct(&self) -> f64 {
        self.accuracy() * 100.0
    }
}

/// Insertion-ordered map with lazily created default values.
#[derive(Debug, Clone)]
pub struct BucketMap<K, V> {
    inner: IndexMap<K, V>,
}

impl<K, V> Default for BucketMap<K, V> {
    fn default() -> Self {
        Self {
            inner: IndexMap::new(),
        }
    }
}

impl<K: Eq + Hash, V: Default> BucketMap<K, V> {
    /// Create an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mutable access to the bucket for `key`, creating it if absent.
    pub fn entry(&mut self, key: K) -> &mut V {
        self.inner.entry(key).or_default()
    }

    /// Read-only lookup.
    #[must_use]
    pub fn get(&self, key: &K) -> Option<&V> {
        self.inner.get(key)
    }

    /// Number of buckets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Whether no bucket was ever touched.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Buckets in first-touch order.
    pub fn iter(&self) -> indexmap::map::Iter<'_, K, V> {
        self.inner.iter()
    }
}

impl<K: Eq + Hash + Clone> BucketMap<K, usize> {
    /// The `n` largest counts, highest first; ties keep first-touch order.
    #[must_use]
    pub fn most_common(&self, n: usize) -> Vec<(K, usize)> {
        top_n_by(self.iter().map(|(k, v)| (k.clone(), *v)).collect(), n, |(_, c)| *c)
    }
}

/// Stable descending sort by `score`, truncated to `n`.
pub(crate) fn top_n_by<T, S, F>(mut items: Vec<T>, n: usize, score: F) -> Vec<T>
where
    S: PartialOrd,
    F: Fn(&T) -> S,
{
    items.sort_by(|a, b| {
        score(b)
            .partial_cmp(&score(a))
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    items.truncate(n);
    items
}
