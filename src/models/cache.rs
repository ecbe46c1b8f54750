//! Two-tier TTL cache.
//!
//! Every entry is either *fresh* (servable to anyone), *stale* (past the fresh
//! window, servable only to callers that opt in) or *expired* (past its hard
//! expiry, evicted on the next lookup). The cache knows nothing about what it
//! stores.

use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tracing::debug;

use super::clock::{Clock, SystemClock};

pub const FRESH_TTL: Duration = Duration::from_secs(30);
pub const STALE_TTL: Duration = Duration::from_secs(300);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CachePolicy {
    pub fresh_ttl: Duration,
    pub stale_ttl: Duration,
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self {
            fresh_ttl: FRESH_TTL,
            stale_ttl: STALE_TTL,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    pub value: V,
    pub created_at: u64,
    pub expires_at: u64,
}

/// Storage backend for [`TtlCache`]. Entries are replaced wholesale, never
/// mutated in place.
pub trait CacheStore<V>: Send + Sync {
    fn load(&self, key: &str) -> Option<CacheEntry<V>>;
    fn save(&self, key: String, entry: CacheEntry<V>);
    fn remove(&self, key: &str) -> bool;
    /// Removes the entry only if it is still past `expires_at` at `now`, so a
    /// concurrent overwrite is never evicted by a reader holding an old copy.
    fn remove_expired(&self, key: &str, now: u64) -> bool;
    fn clear(&self);
    fn len(&self) -> usize;
}

/// Mutex-guarded map; the default in-process backend.
#[derive(Debug)]
pub struct MemoryStore<V> {
    entries: Mutex<HashMap<String, CacheEntry<V>>>,
}

impl<V> Default for MemoryStore<V> {
    fn default() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }
}

impl<V> MemoryStore<V> {
    fn entries(&self) -> MutexGuard<'_, HashMap<String, CacheEntry<V>>> {
        // Entries are swapped atomically under the lock, so a poisoned map is
        // still consistent.
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<V: Clone + Send> CacheStore<V> for MemoryStore<V> {
    fn load(&self, key: &str) -> Option<CacheEntry<V>> {
        self.entries().get(key).cloned()
    }

    fn save(&self, key: String, entry: CacheEntry<V>) {
        self.entries().insert(key, entry);
    }

    fn remove(&self, key: &str) -> bool {
        self.entries().remove(key).is_some()
    }

    fn remove_expired(&self, key: &str, now: u64) -> bool {
        let mut entries = self.entries();
        match entries.get(key) {
            Some(entry) if now > entry.expires_at => entries.remove(key).is_some(),
            _ => false,
        }
    }

    fn clear(&self) {
        self.entries().clear();
    }

    fn len(&self) -> usize {
        self.entries().len()
    }
}

pub struct TtlCache<V, S = MemoryStore<V>> {
    store: S,
    clock: Arc<dyn Clock>,
    policy: CachePolicy,
    _value: PhantomData<fn() -> V>,
}

impl<V: Clone + Send> TtlCache<V> {
    pub fn new() -> Self {
        Self::with_store(MemoryStore::default(), Arc::new(SystemClock), CachePolicy::default())
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self::with_store(MemoryStore::default(), clock, CachePolicy::default())
    }
}

impl<V: Clone + Send> Default for TtlCache<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V, S> TtlCache<V, S>
where
    V: Clone,
    S: CacheStore<V>,
{
    pub fn with_store(store: S, clock: Arc<dyn Clock>, policy: CachePolicy) -> Self {
        Self {
            store,
            clock,
            policy,
            _value: PhantomData,
        }
    }

    /// Stores `value`, replacing any previous entry. A fresh entry hard-expires
    /// after the fresh window; a non-fresh one after the stale window.
    pub fn set(&self, key: &str, value: V, fresh: bool) {
        let now = self.clock.now_millis();
        let ttl = if fresh {
            self.policy.fresh_ttl
        } else {
            self.policy.stale_ttl
        };
        let expires_at = now.saturating_add(ttl.as_millis() as u64);
        self.store.save(
            key.to_string(),
            CacheEntry {
                value,
                created_at: now,
                expires_at,
            },
        );
        debug!(key, expires_at, fresh, "cache set");
    }

    pub fn get(&self, key: &str, allow_stale: bool) -> Option<V> {
        let Some(entry) = self.store.load(key) else {
            debug!(key, "cache miss");
            return None;
        };

        let now = self.clock.now_millis();
        if now > entry.expires_at {
            self.store.remove_expired(key, now);
            debug!(key, "expired cache entry evicted");
            return None;
        }

        let fresh_until = entry
            .created_at
            .saturating_add(self.policy.fresh_ttl.as_millis() as u64);
        let stale = now > fresh_until;
        if stale && !allow_stale {
            debug!(key, "stale cache entry rejected");
            return None;
        }

        debug!(key, stale, "cache hit");
        Some(entry.value)
    }

    pub fn delete(&self, key: &str) {
        self.store.remove(key);
        debug!(key, "cache delete");
    }

    pub fn clear(&self) {
        self.store.clear();
        debug!("cache cleared");
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
