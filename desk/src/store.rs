//! Keyed session storage.

use std::sync::Arc;

use chrono::Duration;
use dashmap::DashMap;
use fxdesk_common::{age, SessionKey, SharedClock, SystemClock, Timestamp};
use tracing::{debug, info};

use crate::metrics::SharedMetrics;
use crate::session::ConversionSession;

#[derive(Debug, Clone)]
struct SessionEntry {
    session: ConversionSession,
    touched_at: Timestamp,
}

/// Sessions keyed by user.
///
/// Idle sessions are not stored; a missing key reads as `Idle`. Every
/// access is synchronous, so no shard lock outlives a call.
pub struct SessionStore {
    sessions: DashMap<SessionKey, SessionEntry>,
    clock: SharedClock,
}

impl SessionStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::with_clock(SystemClock::shared())
    }

    /// Create an empty store reading time from `clock`.
    pub fn with_clock(clock: SharedClock) -> Self {
        Self {
            sessions: DashMap::new(),
            clock,
        }
    }

    /// Current session for `key`.
    pub fn get(&self, key: SessionKey) -> ConversionSession {
        self.sessions
            .get(&key)
            .map(|entry| entry.session.clone())
            .unwrap_or_default()
    }

    /// Apply `f` to the session for `key` and store the outcome.
    pub fn update<R>(&self, key: SessionKey, f: impl FnOnce(&mut ConversionSession) -> R) -> R {
        let now = self.clock.now();
        let (result, idle) = {
            let mut entry = self.sessions.entry(key).or_insert_with(|| SessionEntry {
                session: ConversionSession::Idle,
                touched_at: now,
            });
            let result = f(&mut entry.session);
            entry.touched_at = now;
            (result, entry.session.is_idle())
        };

        if idle {
            self.sessions.remove_if(&key, |_, entry| entry.session.is_idle());
        }

        result
    }

    /// Drop the session for `key`. Returns whether a flow was in progress.
    pub fn reset(&self, key: SessionKey) -> bool {
        self.sessions.remove(&key).is_some()
    }

    /// Number of sessions with a flow in progress.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Check if no flow is in progress.
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Drop sessions untouched for at least `idle_ttl`.
    pub fn evict_idle(&self, idle_ttl: Duration) -> usize {
        let clock = self.clock.as_ref();
        let before = self.sessions.len();
        self.sessions
            .retain(|_, entry| age(clock, entry.touched_at) < idle_ttl);
        let evicted = before.saturating_sub(self.sessions.len());

        if evicted > 0 {
            debug!(evicted, "Evicted idle sessions");
        }
        evicted
    }

    /// Run the idle sweep forever.
    pub async fn run_sweep_loop(
        self: Arc<Self>,
        idle_ttl: Duration,
        interval: std::time::Duration,
        metrics: SharedMetrics,
    ) {
        info!(idle_ttl_secs = idle_ttl.num_seconds(), "Session sweep started");
        loop {
            tokio::time::sleep(interval).await;
            let evicted = self.evict_idle(idle_ttl);
            metrics.record_evictions(evicted);
        }
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}
