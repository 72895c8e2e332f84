//! Demand-created shared instances keyed by device.
//!
//! The pool holds weak references, so shared state lives exactly as long as
//! the factories using it and is rebuilt on the next demand after that.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Weak};

/// A keyed pool of weakly-held shared values.
pub struct SharedResourcePool<K, V> {
    entries: Mutex<HashMap<K, Weak<V>>>,
}

impl<K: Eq + Hash + Clone, V> SharedResourcePool<K, V> {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Return the live value for `key`, or build, store, and return a new one.
    pub fn demand_create(&self, key: K, create: impl FnOnce() -> Arc<V>) -> Arc<V> {
        let mut entries = self.entries.lock();
        if let Some(existing) = entries.get(&key).and_then(Weak::upgrade) {
            return existing;
        }
        let value = create();
        entries.insert(key, Arc::downgrade(&value));
        value
    }
}

impl<K: Eq + Hash + Clone, V> Default for SharedResourcePool<K, V> {
    fn default() -> Self {
        Self::new()
    }
}
