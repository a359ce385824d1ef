//! Time-bounded read-through cache.
//!
//! Entry age is measured with an injected [`Clock`] so expiry can be driven
//! without waiting on the wall clock.

use chrono::Utc;
use orderbook_core::TimestampMs;
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::atomic::{AtomicI64, Ordering};

/// Source of the current time.
pub trait Clock: Send + Sync {
    /// Milliseconds since the Unix epoch.
    fn now_ms(&self) -> TimestampMs;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> TimestampMs {
        Utc::now().timestamp_millis()
    }
}

/// Clock that only moves when told to.
#[derive(Debug, Default)]
pub struct ManualClock {
    now_ms: AtomicI64,
}

impl ManualClock {
    /// Create a clock reading `start_ms`.
    pub fn new(start_ms: TimestampMs) -> Self {
        Self {
            now_ms: AtomicI64::new(start_ms),
        }
    }

    /// Move the clock forward.
    pub fn advance(&self, ms: i64) {
        self.now_ms.fetch_add(ms, Ordering::SeqCst);
    }

    /// Set the clock.
    pub fn set(&self, ms: TimestampMs) {
        self.now_ms.store(ms, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> TimestampMs {
        self.now_ms.load(Ordering::SeqCst)
    }
}

impl<C: Clock + ?Sized> Clock for std::sync::Arc<C> {
    fn now_ms(&self) -> TimestampMs {
        (**self).now_ms()
    }
}

#[derive(Debug, Clone)]
struct Entry<V> {
    inserted_ms: TimestampMs,
    value: V,
}

/// Map whose entries expire `ttl_ms` after insertion.
#[derive(Debug)]
pub struct TtlCache<K, V, C = SystemClock> {
    entries: HashMap<K, Entry<V>>,
    ttl_ms: i64,
    clock: C,
}

impl<K: Eq + Hash, V: Clone, C: Clock> TtlCache<K, V, C> {
    /// Create a cache on an explicit clock.
    pub fn with_clock(ttl_ms: i64, clock: C) -> Self {
        Self {
            entries: HashMap::new(),
            ttl_ms,
            clock,
        }
    }

    fn is_live(&self, entry: &Entry<V>, now_ms: TimestampMs) -> bool {
        now_ms.saturating_sub(entry.inserted_ms) < self.ttl_ms
    }

    /// Get a live entry. Expired entries are evicted.
    pub fn get(&mut self, key: &K) -> Option<V> {
        let now_ms = self.clock.now_ms();
        let live = self.entries.get(key).map(|e| self.is_live(e, now_ms))?;
        if live {
            self.entries.get(key).map(|e| e.value.clone())
        } else {
            self.entries.remove(key);
            None
        }
    }

    /// Insert or replace an entry, restarting its lifetime.
    pub fn insert(&mut self, key: K, value: V) {
        let inserted_ms = self.clock.now_ms();
        self.entries.insert(key, Entry { inserted_ms, value });
    }

    /// Drop one entry.
    pub fn invalidate(&mut self, key: &K) -> Option<V> {
        self.entries.remove(key).map(|e| e.value)
    }

    /// Drop every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Drop expired entries, returning how many were removed.
    pub fn purge_expired(&mut self) -> usize {
        let now_ms = self.clock.now_ms();
        let ttl_ms = self.ttl_ms;
        let before = self.entries.len();
        self.entries
            .retain(|_, e| now_ms.saturating_sub(e.inserted_ms) < ttl_ms);
        before - self.entries.len()
    }

    /// Number of stored entries, expired ones included until purged.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
