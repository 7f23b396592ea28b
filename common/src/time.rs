//! Time utilities and constants for FXDesk.

use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use std::sync::Arc;

/// Timing constants.
pub mod constants {
    use super::Duration;

    /// Validity window of a cached rate snapshot (20 minutes).
    pub fn rate_cache_ttl() -> Duration {
        Duration::minutes(20)
    }

    /// Upper bound on a single upstream rate fetch (10 seconds).
    pub fn rate_fetch_timeout() -> std::time::Duration {
        std::time::Duration::from_secs(10)
    }

    /// Interval between idle-session sweeps (1 minute).
    pub fn session_sweep_interval() -> std::time::Duration {
        std::time::Duration::from_secs(60)
    }
}

/// A timestamp with timezone (always UTC).
pub type Timestamp = DateTime<Utc>;

/// Source of the current time.
///
/// Everything that compares timestamps takes a clock so tests can move
/// time explicitly instead of sleeping.
pub trait Clock: Send + Sync {
    /// Current time.
    fn now(&self) -> Timestamp;
}

/// Shared clock handle.
pub type SharedClock = Arc<dyn Clock>;

/// Wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Utc::now()
    }
}

impl SystemClock {
    /// Shared wall clock.
    pub fn shared() -> SharedClock {
        Arc::new(SystemClock)
    }
}

/// Clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<Timestamp>,
}

impl ManualClock {
    /// Create a clock frozen at `start`.
    pub fn new(start: Timestamp) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    /// Create a clock frozen at the current wall time.
    pub fn starting_now() -> Arc<Self> {
        Arc::new(Self::new(Utc::now()))
    }

    /// Move the clock forward.
    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock();
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        *self.now.lock()
    }
}

/// Age of `since` as seen by `clock`. Never negative.
pub fn age(clock: &dyn Clock, since: Timestamp) -> Duration {
    let age = clock.now().signed_duration_since(since);
    if age < Duration::zero() {
        Duration::zero()
    } else {
        age
    }
}
