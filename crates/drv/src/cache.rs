//! Caller-owned memoization of pooled computations.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;

use tracing::debug;

/// A map from value-equal parameters to previously built results.
///
/// There is no eviction: the parameter space of realistic pools is small,
/// and the cache lives exactly as long as its owner keeps it.
///
/// # Example
///
/// ```rust
/// use drv::{uniform, DrvError, PoolCache};
///
/// let mut cache = PoolCache::new();
/// let build = |n: i64| uniform(format!("1..{}", n), (1..=n).collect());
///
/// let first = cache.get_or_try_insert_with(6, || build(6))?.clone();
/// let again = cache.get_or_try_insert_with(6, || build(6))?.clone();
/// assert!(first.same(&again));
/// assert_eq!((cache.hits(), cache.misses()), (1, 1));
/// # Ok::<(), DrvError>(())
/// ```
pub struct PoolCache<K, V> {
    entries: HashMap<K, V>,
    hits: u64,
    misses: u64,
}

impl<K: Eq + Hash + fmt::Debug, V> PoolCache<K, V> {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
            hits: 0,
            misses: 0,
        }
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        self.entries.get(key)
    }

    /// Like [`PoolCache::get`], but counted as a hit or a miss.
    ///
    /// For recursive builders that cannot hand the cache to a closure.
    pub fn fetch(&mut self, key: &K) -> Option<&V> {
        let found = self.entries.get(key);
        if found.is_some() {
            self.hits += 1;
            debug!(?key, "pool cache hit");
        } else {
            self.misses += 1;
            debug!(?key, "pool cache miss");
        }
        found
    }

    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        self.entries.insert(key, value)
    }

    /// Look `key` up, building and storing the value on a miss.
    ///
    /// A failed build stores nothing.
    pub fn get_or_try_insert_with<E, F>(&mut self, key: K, build: F) -> Result<&V, E>
    where
        F: FnOnce() -> Result<V, E>,
    {
        match self.entries.entry(key) {
            Entry::Occupied(entry) => {
                self.hits += 1;
                debug!(key = ?entry.key(), "pool cache hit");
                Ok(entry.into_mut())
            }
            Entry::Vacant(entry) => {
                self.misses += 1;
                debug!(key = ?entry.key(), "pool cache miss");
                let value = build()?;
                Ok(entry.insert(value))
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn misses(&self) -> u64 {
        self.misses
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl<K: Eq + Hash + fmt::Debug, V> Default for PoolCache<K, V> {
    fn default() -> Self {
        Self::new()
    }
}
