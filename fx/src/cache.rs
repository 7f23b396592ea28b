//! Rate snapshot caching with TTL support.

use chrono::Duration;
use fxdesk_common::{constants, SharedClock, SystemClock, Timestamp};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::debug;

use crate::snapshot::RateSnapshot;

/// Cached snapshot entry.
#[derive(Debug, Clone)]
struct CacheEntry {
    snapshot: Arc<RateSnapshot>,
    stored_at: Timestamp,
}

/// Configuration for rate cache.
#[derive(Debug, Clone)]
pub struct RateCacheConfig {
    /// How long a snapshot stays usable after its fetch.
    pub ttl: Duration,
}

impl Default for RateCacheConfig {
    fn default() -> Self {
        Self {
            ttl: constants::rate_cache_ttl(),
        }
    }
}

/// Single-slot snapshot cache.
///
/// Snapshot and store time sit behind one mutex, so readers never see a
/// snapshot paired with another snapshot's timestamp. Staleness is checked
/// lazily on `get`; there is no background refresh.
pub struct RateCache {
    entry: Mutex<Option<CacheEntry>>,
    config: RateCacheConfig,
    clock: SharedClock,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl RateCache {
    /// Create a new rate cache with default configuration.
    pub fn new() -> Self {
        Self::with_config(RateCacheConfig::default())
    }

    /// Create a new rate cache with custom configuration.
    pub fn with_config(config: RateCacheConfig) -> Self {
        Self::with_clock(config, SystemClock::shared())
    }

    /// Create a rate cache reading time from `clock`.
    pub fn with_clock(config: RateCacheConfig, clock: SharedClock) -> Self {
        Self {
            entry: Mutex::new(None),
            config,
            clock,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Get the stored snapshot if it is still fresh.
    pub fn get(&self) -> Option<Arc<RateSnapshot>> {
        let now = self.clock.now();
        let guard = self.entry.lock();

        match guard.as_ref() {
            Some(entry) if entry.snapshot.is_fresh(now, self.config.ttl) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                debug!(fetched_at = %entry.snapshot.fetched_at, "Cache hit");
                Some(entry.snapshot.clone())
            }
            Some(entry) => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                debug!(fetched_at = %entry.snapshot.fetched_at, "Cache entry expired");
                None
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                debug!("Cache miss");
                None
            }
        }
    }

    /// Replace the stored snapshot. Last writer wins.
    pub fn set(&self, snapshot: RateSnapshot) -> Arc<RateSnapshot> {
        let snapshot = Arc::new(snapshot);
        let entry = CacheEntry {
            snapshot: snapshot.clone(),
            stored_at: self.clock.now(),
        };
        *self.entry.lock() = Some(entry);
        snapshot
    }

    /// Get cache statistics.
    pub fn stats(&self) -> CacheStats {
        let now = self.clock.now();
        let guard = self.entry.lock();
        let (fetched_at, stored_at, fresh) = match guard.as_ref() {
            Some(entry) => (
                Some(entry.snapshot.fetched_at),
                Some(entry.stored_at),
                entry.snapshot.is_fresh(now, self.config.ttl),
            ),
            None => (None, None, false),
        };

        CacheStats {
            fetched_at,
            stored_at,
            fresh,
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

impl Default for RateCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Cache statistics.
#[derive(Debug, Clone)]
pub struct CacheStats {
    pub fetched_at: Option<Timestamp>,
    pub stored_at: Option<Timestamp>,
    pub fresh: bool,
    pub hits: u64,
    pub misses: u64,
}
