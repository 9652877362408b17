//! Ordered map from stable key to owned state.
//!
//! # Responsibility
//! - Keep per-key state alive across repeated passes (get-or-create).
//! - Remember first-insertion order for stable enumeration.
//!
//! # Invariants
//! - `order` holds each live key exactly once.
//! - Overwriting an existing key keeps its original position.
//! - The cursor only moves through `next()` and resets on `begin()`.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::Hash;

/// Insertion-ordered keyed state with a resettable iteration cursor.
#[derive(Debug, Clone)]
pub struct KeyedStateMap<K, V> {
    entries: HashMap<K, V>,
    order: Vec<K>,
    cursor: usize,
}

impl<K, V> Default for KeyedStateMap<K, V> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
            order: Vec::new(),
            cursor: 0,
        }
    }
}

impl<K, V> KeyedStateMap<K, V>
where
    K: Eq + Hash + Clone,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the state for `key`, creating it with `init` on first use.
    pub fn get_or_insert_with(&mut self, key: K, init: impl FnOnce() -> V) -> &mut V {
        if !self.entries.contains_key(&key) {
            self.order.push(key.clone());
        }
        self.entries.entry(key).or_insert_with(init)
    }

    /// Inserts or overwrites. Returns the previous value, if any.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        let previous = self.entries.insert(key.clone(), value);
        if previous.is_none() {
            self.order.push(key);
        }
        previous
    }

    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        let removed = self.entries.remove(key)?;
        let position = self
            .order
            .iter()
            .position(|held| <K as Borrow<Q>>::borrow(held) == key);
        if let Some(index) = position {
            self.order.remove(index);
            if index < self.cursor {
                self.cursor -= 1;
            }
        }
        Some(removed)
    }

    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        self.entries.get(key)
    }

    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        self.entries.get_mut(key)
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
        self.cursor = 0;
    }

    /// Keys in first-insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.order.iter()
    }

    /// Values in first-insertion order.
    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.order.iter().filter_map(|key| self.entries.get(key))
    }

    /// Rewinds the cursor to the first key.
    pub fn begin(&mut self) {
        self.cursor = 0;
    }

    /// Yields the next value in insertion order, or `None` once exhausted.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> Option<&mut V> {
        let key = self.order.get(self.cursor)?;
        self.cursor += 1;
        self.entries.get_mut(key)
    }
}
