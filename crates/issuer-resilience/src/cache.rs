//! Bounded in-memory TTL cache for resolved consumer secrets.
//!
//! Expiry is lazy: entries are checked on read and purged opportunistically
//! when an insert needs room. When the cache is full, the oldest-created
//! entry is evicted (FIFO by creation, not by access).

use issuer_core::ConsumerSecret;
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::time::{Duration, Instant};
use tracing::debug;

/// Rough per-entry bookkeeping overhead used by the memory estimate.
const ENTRY_OVERHEAD_BYTES: usize = 96;

/// Longest lifetime an entry can get. Larger TTLs are clamped to it.
pub const MAX_TTL: Duration = Duration::from_secs(365 * 24 * 60 * 60);

/// Cache configuration
#[derive(Debug, Clone)]
pub struct SecretCacheConfig {
    /// TTL applied when `set` is called without a positive TTL
    pub default_ttl: Duration,
    /// Maximum number of entries held at once
    pub max_entries: usize,
}

impl Default for SecretCacheConfig {
    fn default() -> Self {
        Self {
            default_ttl: Duration::from_secs(300),
            max_entries: 1000,
        }
    }
}

#[derive(Debug)]
struct CacheEntry {
    value: ConsumerSecret,
    created_at: Instant,
    expires_at: Instant,
    seq: u64,
}

impl CacheEntry {
    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }

    fn approximate_size(&self, key: &str) -> usize {
        key.len()
            + self.value.id.len()
            + self.value.key.len()
            + self.value.secret.len()
            + self.value.consumer.as_ref().map_or(0, |c| c.id.len())
            + ENTRY_OVERHEAD_BYTES
    }
}

#[derive(Debug, Default)]
struct CacheInner {
    entries: HashMap<String, CacheEntry>,
    /// Creation sequence -> key, oldest first
    order: BTreeMap<u64, String>,
    next_seq: u64,
    hits: u64,
    misses: u64,
    lookup_time: Duration,
    lookups: u64,
}

impl CacheInner {
    fn remove(&mut self, key: &str) -> Option<CacheEntry> {
        let entry = self.entries.remove(key)?;
        self.order.remove(&entry.seq);
        Some(entry)
    }

    fn purge_expired(&mut self, now: Instant) -> usize {
        let expired: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired(now))
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired {
            self.remove(key);
        }
        expired.len()
    }

    fn evict_oldest(&mut self) -> Option<String> {
        let (_, key) = self.order.pop_first()?;
        self.entries.remove(&key);
        Some(key)
    }
}

/// Cache statistics
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CacheStats {
    /// Entries physically present, including expired ones not yet purged
    pub size: usize,
    /// Entries that have not expired
    pub active_entries: usize,
    /// hits / (hits + misses) as a percentage with two decimals
    pub hit_rate: String,
    /// Mean time spent in `get`
    pub average_latency_ms: f64,
    /// Approximate heap footprint of the stored entries
    pub memory_estimate: usize,
    /// Lookups answered from the cache
    pub hits: u64,
    /// Lookups that found nothing usable
    pub misses: u64,
}

/// Process-local cache of consumer secrets keyed by external consumer id
#[derive(Debug)]
pub struct ConsumerSecretCache {
    config: SecretCacheConfig,
    inner: Mutex<CacheInner>,
}

impl ConsumerSecretCache {
    /// Create a new cache
    #[must_use]
    pub fn new(config: SecretCacheConfig) -> Self {
        Self {
            config,
            inner: Mutex::new(CacheInner::default()),
        }
    }

    /// Create with default configuration
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(SecretCacheConfig::default())
    }

    /// Get the configuration
    #[must_use]
    pub fn config(&self) -> &SecretCacheConfig {
        &self.config
    }

    /// Look up a secret. Expired entries count as misses and are purged.
    pub fn get(&self, key: &str) -> Option<ConsumerSecret> {
        let started = Instant::now();
        let mut inner = self.inner.lock();

        let result = match inner.entries.get(key) {
            Some(entry) if !entry.is_expired(started) => Some(entry.value.clone()),
            Some(_) => {
                inner.remove(key);
                debug!(key = %key, "Cache entry expired");
                None
            }
            None => None,
        };

        if result.is_some() {
            inner.hits += 1;
        } else {
            inner.misses += 1;
        }
        inner.lookups += 1;
        inner.lookup_time += started.elapsed();

        result
    }

    /// Store a secret, replacing any existing entry for `key`.
    ///
    /// `None` or `Some(0)` uses the default TTL. A negative TTL stores an
    /// entry that is already expired.
    pub fn set(&self, key: &str, value: ConsumerSecret, ttl_seconds: Option<i64>) {
        let now = Instant::now();
        let expires_at = match ttl_seconds {
            Some(ttl) if ttl > 0 => expiry(now, Duration::from_secs(ttl.unsigned_abs())),
            Some(ttl) if ttl < 0 => now
                .checked_sub(Duration::from_secs(ttl.unsigned_abs()))
                .unwrap_or(now),
            _ => expiry(now, self.config.default_ttl),
        };

        let mut inner = self.inner.lock();

        if inner.remove(key).is_none() && inner.entries.len() >= self.config.max_entries {
            let purged = inner.purge_expired(now);
            if inner.entries.len() >= self.config.max_entries {
                if let Some(evicted) = inner.evict_oldest() {
                    debug!(evicted = %evicted, purged, "Cache full, evicted oldest entry");
                }
            }
        }

        let seq = inner.next_seq;
        inner.next_seq += 1;
        inner.order.insert(seq, key.to_string());
        inner.entries.insert(
            key.to_string(),
            CacheEntry {
                value,
                created_at: now,
                expires_at,
                seq,
            },
        );
    }

    /// Remove one entry. Missing keys are ignored.
    pub fn delete(&self, key: &str) {
        self.inner.lock().remove(key);
    }

    /// Remove every entry. Counters are kept.
    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.entries.clear();
        inner.order.clear();
    }

    /// Number of entries physically present
    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    /// Whether the cache holds no entries
    pub fn is_empty(&self) -> bool {
        self.inner.lock().entries.is_empty()
    }

    /// Age of the entry for `key`, if present
    pub fn entry_age(&self, key: &str) -> Option<Duration> {
        self.inner
            .lock()
            .entries
            .get(key)
            .map(|entry| entry.created_at.elapsed())
    }

    /// Snapshot of cache statistics
    pub fn get_stats(&self) -> CacheStats {
        let now = Instant::now();
        let inner = self.inner.lock();

        let active_entries = inner
            .entries
            .values()
            .filter(|entry| !entry.is_expired(now))
            .count();

        let memory_estimate = inner
            .entries
            .iter()
            .map(|(key, entry)| entry.approximate_size(key))
            .sum();

        let total = inner.hits + inner.misses;
        let hit_rate = if total == 0 {
            0.0
        } else {
            inner.hits as f64 / total as f64 * 100.0
        };

        let average_latency_ms = if inner.lookups == 0 {
            0.0
        } else {
            inner.lookup_time.as_secs_f64() * 1000.0 / inner.lookups as f64
        };

        CacheStats {
            size: inner.entries.len(),
            active_entries,
            hit_rate: format!("{hit_rate:.2}"),
            average_latency_ms,
            memory_estimate,
            hits: inner.hits,
            misses: inner.misses,
        }
    }
}

impl Default for ConsumerSecretCache {
    fn default() -> Self {
        Self::with_defaults()
    }
}

fn expiry(now: Instant, ttl: Duration) -> Instant {
    let ttl = ttl.min(MAX_TTL);
    now.checked_add(ttl).unwrap_or(now)
}
