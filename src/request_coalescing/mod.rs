// Request Coalescing Module
//
// Serializes backend fetches for the same cache key.
// When several clients miss on the same key simultaneously:
// - First request: holds the key's permit, fetches, stores, releases
// - Subsequent requests: wait for the permit, then find the stored entry
//   on their re-lookup instead of fetching again
//
// Different keys never wait on each other.

use crate::cache::CacheKey;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::OwnedMutexGuard;

type KeyLock = Arc<tokio::sync::Mutex<()>>;

/// Per-key fetch lock manager
#[derive(Debug, Clone, Default)]
pub struct FetchCoalescer {
    /// Map of contended keys: key -> lock shared by everyone waiting on it
    /// Entries are removed when the last holder releases its permit
    locks: Arc<Mutex<HashMap<String, KeyLock>>>,
}

impl FetchCoalescer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait until this caller is the only one working on `key`
    ///
    /// The returned permit releases the key when dropped. Callers must
    /// re-check the cache after acquiring: an earlier holder may already
    /// have stored the entry.
    pub async fn acquire(&self, key: &CacheKey) -> FetchPermit {
        let lock = {
            let mut locks = self.locks.lock();
            Arc::clone(locks.entry(key.as_str().to_string()).or_default())
        };

        let guard = Arc::clone(&lock).lock_owned().await;

        FetchPermit {
            key: key.as_str().to_string(),
            guard: Some(guard),
            lock,
            coalescer: self.clone(),
        }
    }

    /// Number of keys currently held or waited on
    pub fn in_flight_count(&self) -> usize {
        self.locks.lock().len()
    }

    fn release(&self, key: &str, lock: &KeyLock) {
        let mut locks = self.locks.lock();
        // One reference in the map plus the releasing permit's own
        if Arc::strong_count(lock) == 2 {
            locks.remove(key);
        }
    }
}

/// Exclusive right to fetch and store one key
#[derive(Debug)]
pub struct FetchPermit {
    key: String,
    guard: Option<OwnedMutexGuard<()>>,
    lock: KeyLock,
    coalescer: FetchCoalescer,
}

impl FetchPermit {
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl Drop for FetchPermit {
    fn drop(&mut self) {
        // Unlock before pruning so the guard's own Arc is gone from the count
        drop(self.guard.take());
        self.coalescer.release(&self.key, &self.lock);
    }
}
