//! Per-key async locks for serialising work on one record or sprint.
//!
//! Entries live only while some caller holds or awaits their lock. Idle
//! entries are pruned whenever a lock is handed out, so the map is bounded by
//! the number of keys in use at once.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex, PoisonError};

/// Async mutex shared by every caller working on the same key.
pub type KeyLock = Arc<tokio::sync::Mutex<()>>;

/// Map from keys to the async locks guarding them.
#[derive(Debug)]
pub struct KeyedLocks<K> {
    locks: Mutex<HashMap<K, KeyLock>>,
}

impl<K> KeyedLocks<K>
where
    K: Eq + Hash + Clone,
{
    /// Creates an empty lock map.
    #[must_use]
    pub fn new() -> Self {
        Self {
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the lock for `key`, creating it when no caller holds one.
    #[must_use]
    pub fn lock_for(&self, key: &K) -> KeyLock {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        // Only the map refers to these, so nobody holds or awaits them.
        locks.retain(|_, lock| Arc::strong_count(lock) > 1);
        Arc::clone(locks.entry(key.clone()).or_default())
    }

    /// Returns how many keys currently have a lock.
    #[must_use]
    pub fn len(&self) -> usize {
        self.locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns whether no key has a lock.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<K> Default for KeyedLocks<K>
where
    K: Eq + Hash + Clone,
{
    fn default() -> Self {
        Self::new()
    }
}
