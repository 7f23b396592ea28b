//! Rate locking for consistent quotes within one conversation.

use chrono::Duration;
use fxdesk_common::{CurrencyPair, QuoteId, Timestamp};
use serde::{Deserialize, Serialize};

use crate::spread::{CrossRates, Direction};

/// A client-facing rate captured at the start of a dialogue.
///
/// Every calculation in the dialogue uses this rate even if the cache
/// refreshes in the meantime.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LockedRate {
    /// Unique lock ID, for log correlation.
    pub id: QuoteId,
    /// Direction within the configured pair.
    pub direction: Direction,
    /// Pair oriented the way money moves.
    pub pair: CurrencyPair,
    /// Units of `pair.to` credited per unit of `pair.from`.
    pub rate: f64,
    /// Market rate for the same orientation, before the spread.
    pub market_rate: f64,
    /// When the lock was taken.
    pub locked_at: Timestamp,
}

impl LockedRate {
    /// Lock the rate for `direction` out of freshly derived cross rates.
    pub fn lock(rates: &CrossRates, direction: Direction, now: Timestamp) -> Self {
        let market_rate = match direction {
            Direction::Forward => rates.base_rate,
            Direction::Reverse => 1.0 / rates.base_rate,
        };

        Self {
            id: QuoteId::new(),
            direction,
            pair: direction.orient(rates.pair),
            rate: rates.rate_for(direction),
            market_rate,
            locked_at: now,
        }
    }

    /// Whether the lock has outlived `ttl`. A lock without TTL never expires.
    pub fn is_expired(&self, now: Timestamp, ttl: Option<Duration>) -> bool {
        match ttl {
            Some(ttl) => now.signed_duration_since(self.locked_at) >= ttl,
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spread::Spread;
    use chrono::Utc;
    use fxdesk_common::Currency;

    fn rates() -> CrossRates {
        CrossRates {
            pair: CurrencyPair::new(Currency::Rub, Currency::Kzt),
            base_rate: 5.0,
            forward: 4.8,
            inverse: 5.2,
            spread: Spread::DEFAULT,
        }
    }

    #[test]
    fn test_lock_forward() {
        let lock = LockedRate::lock(&rates(), Direction::Forward, Utc::now());

        assert_eq!(lock.pair, CurrencyPair::new(Currency::Rub, Currency::Kzt));
        assert_eq!(lock.rate, 4.8);
        assert_eq!(lock.market_rate, 5.0);
    }

    #[test]
    fn test_lock_reverse_orients_pair() {
        let lock = LockedRate::lock(&rates(), Direction::Reverse, Utc::now());

        assert_eq!(lock.pair, CurrencyPair::new(Currency::Kzt, Currency::Rub));
        assert_eq!(lock.rate, 1.0 / 5.2);
        assert!(lock.rate < lock.market_rate);
    }

    #[test]
    fn test_expiry() {
        let now = Utc::now();
        let lock = LockedRate::lock(&rates(), Direction::Forward, now);

        assert!(!lock.is_expired(now + Duration::days(365), None));
        assert!(!lock.is_expired(now + Duration::seconds(59), Some(Duration::seconds(60))));
        assert!(lock.is_expired(now + Duration::seconds(60), Some(Duration::seconds(60))));
    }
}
