//! Keyed TTL cache
//!
//! A process-wide `key -> (value, fetched_at)` store. Entries are never swept;
//! a stale entry simply fails [`TtlCache::get_fresh`] and is overwritten by the
//! next successful fetch. Versioned resources put the revision version in the
//! key so a new revision misses independently of wall-clock age.

use chrono::{DateTime, Utc};
use simalyze_common::time::is_within_ttl;
use simalyze_common::Clock;
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;
use tracing::debug;

/// A cached value and the time it was stored
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry<T> {
    pub value: T,
    pub fetched_at: DateTime<Utc>,
}

impl<T> CacheEntry<T> {
    /// Valid iff `now - fetched_at < ttl`
    pub fn is_fresh(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        is_within_ttl(self.fetched_at, now, ttl)
    }
}

/// Expiry durations, one per cache
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheTtls {
    /// Core record, keyed by slug pair and by canonical identity
    pub record: Duration,
    pub creator: Duration,
    pub asset: Duration,
    pub revision: Duration,
    pub screenshot: Duration,
    pub engagement: Duration,
    pub descendant: Duration,
    pub content: Duration,
    pub analysis: Duration,
}

impl Default for CacheTtls {
    fn default() -> Self {
        const MINUTE: u64 = 60;
        Self {
            record: Duration::from_secs(5 * MINUTE),
            creator: Duration::from_secs(5 * MINUTE),
            asset: Duration::from_secs(10 * MINUTE),
            revision: Duration::from_secs(10 * MINUTE),
            screenshot: Duration::from_secs(10 * MINUTE),
            engagement: Duration::from_secs(5 * MINUTE),
            descendant: Duration::from_secs(15 * MINUTE),
            content: Duration::from_secs(15 * MINUTE),
            analysis: Duration::from_secs(10 * MINUTE),
        }
    }
}

/// Time-stamped key/value store with a fixed expiry for reads
pub struct TtlCache<K, V> {
    name: &'static str,
    ttl: Duration,
    clock: Arc<dyn Clock>,
    entries: RwLock<HashMap<K, CacheEntry<V>>>,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + std::fmt::Debug,
    V: Clone,
{
    pub fn new(name: &'static str, ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            name,
            ttl,
            clock,
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Raw entry regardless of age
    pub fn get(&self, key: &K) -> Option<CacheEntry<V>> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    /// Store `value` stamped with the current time, replacing any entry
    pub fn set(&self, key: K, value: V) {
        let entry = CacheEntry {
            value,
            fetched_at: self.clock.now(),
        };
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, entry);
    }

    /// Value for `key` if present and younger than this cache's TTL
    pub fn get_fresh(&self, key: &K) -> Option<V> {
        let now = self.clock.now();
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        match entries.get(key) {
            Some(entry) if entry.is_fresh(now, self.ttl) => {
                debug!(cache = self.name, key = ?key, "Cache hit");
                Some(entry.value.clone())
            }
            Some(_) => {
                debug!(cache = self.name, key = ?key, "Cache entry stale");
                None
            }
            None => {
                debug!(cache = self.name, key = ?key, "Cache miss");
                None
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
