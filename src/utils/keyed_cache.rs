//! Per-key memoization with at-most-one fetch per key.
//!
//! The outer map lock is held only long enough to find or create the slot for
//! a key. The fetch itself runs under that slot's own lock, so concurrent
//! callers for the same key wait for the first fetch to finish while callers
//! for other keys proceed in parallel.
//!
//! Failed fetches are not stored; the next caller for that key fetches again.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use log::error;

/// A cache slot or map lock was poisoned by a panicking fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockPoisoned {
    pub shape: &'static str,
}

type Slot<V> = Arc<Mutex<Option<V>>>;

pub struct KeyedCache<K, V> {
    shape: &'static str,
    slots: Mutex<HashMap<K, Slot<V>>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KeyedCacheStats {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
}

fn lock<'a, T>(mutex: &'a Mutex<T>, shape: &'static str) -> Result<MutexGuard<'a, T>, LockPoisoned> {
    mutex.lock().map_err(|e| {
        error!("Mutex poisoning detected in {} cache: {}", shape, e);
        LockPoisoned { shape }
    })
}

impl<K, V> KeyedCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new(shape: &'static str) -> Self {
        KeyedCache {
            shape,
            slots: Mutex::new(HashMap::new()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn shape(&self) -> &'static str {
        self.shape
    }

    /// Return the cached value for `key`, running `fetch` on a miss.
    pub fn get_or_try_insert_with<E, F>(&self, key: &K, fetch: F) -> Result<V, E>
    where
        F: FnOnce() -> Result<V, E>,
        E: From<LockPoisoned>,
    {
        let slot = {
            let mut slots = lock(&self.slots, self.shape)?;
            match slots.get(key) {
                Some(slot) => Arc::clone(slot),
                None => {
                    let slot: Slot<V> = Arc::new(Mutex::new(None));
                    slots.insert(key.clone(), Arc::clone(&slot));
                    slot
                }
            }
        };

        let mut value = lock(&slot, self.shape)?;
        if let Some(cached) = value.as_ref() {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(cached.clone());
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        let fetched = fetch()?;
        *value = Some(fetched.clone());
        Ok(fetched)
    }

    /// Cached value without fetching
    pub fn peek(&self, key: &K) -> Option<V> {
        let slot = {
            let slots = self.slots.lock().ok()?;
            Arc::clone(slots.get(key)?)
        };
        let value = slot.lock().ok()?;
        value.clone()
    }

    pub fn clear(&self) -> Result<(), LockPoisoned> {
        lock(&self.slots, self.shape)?.clear();
        Ok(())
    }

    pub fn stats(&self) -> KeyedCacheStats {
        let entries = self
            .slots
            .lock()
            .map(|slots| slots.len())
            .unwrap_or_default();
        KeyedCacheStats {
            entries,
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}
