//! TTL cache for fetched policies
//!
//! The SDK memoizes policy lookups in a [`Cache`]. There is no process-wide
//! instance: the caller builds one (usually a [`MemoryCache`]) and hands it to
//! whatever needs it, so a distributed cache can be swapped in by
//! implementing the trait.

use dashmap::DashMap;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Key/value cache with per-entry expiry
pub trait Cache<V>: Send + Sync {
    fn get(&self, key: &str) -> Option<V>;

    /// Store `value` for `ttl`; `Duration::ZERO` means the cache's default TTL
    fn set(&self, key: &str, value: V, ttl: Duration);
}

/// Expiry configuration for [`MemoryCache`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheConfig {
    pub default_ttl_seconds: u64,
    pub cleanup_interval_seconds: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            default_ttl_seconds: 5 * 60,
            cleanup_interval_seconds: 10 * 60,
        }
    }
}

impl CacheConfig {
    pub fn default_ttl(&self) -> Duration {
        Duration::from_secs(self.default_ttl_seconds)
    }

    pub fn cleanup_interval(&self) -> Duration {
        Duration::from_secs(self.cleanup_interval_seconds)
    }
}

struct Entry<V> {
    value: V,
    /// `None` when the TTL overflows `Instant`
    expires_at: Option<Instant>,
}

impl<V> Entry<V> {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.map_or(false, |at| at <= now)
    }
}

/// In-memory [`Cache`] with lazy expiry and periodic sweeps
///
/// Expired entries are never returned. They are dropped on access, and all of
/// them are swept on the first write after each cleanup interval.
pub struct MemoryCache<V> {
    entries: DashMap<String, Entry<V>>,
    default_ttl: Duration,
    cleanup_interval: Duration,
    last_sweep: Mutex<Instant>,
}

impl<V: Clone + Send + Sync> MemoryCache<V> {
    pub fn new(config: CacheConfig) -> Self {
        Self::with_durations(config.default_ttl(), config.cleanup_interval())
    }

    pub fn with_durations(default_ttl: Duration, cleanup_interval: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            default_ttl,
            cleanup_interval,
            last_sweep: Mutex::new(Instant::now()),
        }
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// Store `value` with the default TTL
    pub fn set_default(&self, key: &str, value: V) {
        self.set(key, value, self.default_ttl);
    }

    pub fn remove(&self, key: &str) -> Option<V> {
        self.entries.remove(key).map(|(_, entry)| entry.value)
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    /// Number of stored entries, including expired ones not yet swept
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Remove every expired entry, returning how many were dropped
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired(now));
        let removed = before.saturating_sub(self.entries.len());
        tracing::trace!(removed, remaining = self.entries.len(), "cache sweep");
        removed
    }

    fn maybe_sweep(&self) {
        {
            let mut last = self.last_sweep.lock();
            if last.elapsed() < self.cleanup_interval {
                return;
            }
            *last = Instant::now();
        }
        self.purge_expired();
    }
}

impl<V: Clone + Send + Sync> Default for MemoryCache<V> {
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}

impl<V: Clone + Send + Sync> Cache<V> for MemoryCache<V> {
    fn get(&self, key: &str) -> Option<V> {
        let now = Instant::now();
        let expired = match self.entries.get(key) {
            Some(entry) if !entry.is_expired(now) => return Some(entry.value.clone()),
            Some(_) => true,
            None => false,
        };
        if expired {
            self.entries.remove_if(key, |_, entry| entry.is_expired(now));
        }
        None
    }

    fn set(&self, key: &str, value: V, ttl: Duration) {
        let ttl = if ttl.is_zero() { self.default_ttl } else { ttl };
        let entry = Entry { value, expires_at: Instant::now().checked_add(ttl) };
        self.entries.insert(key.to_string(), entry);
        self.maybe_sweep();
    }
}
