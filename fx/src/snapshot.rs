//! Spot rate snapshots.

use chrono::Duration;
use fxdesk_common::{Currency, Timestamp};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{FxError, FxResult};

/// Raw result of one rate source call: units of each currency per one unit
/// of `base`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpotRates {
    pub base: Currency,
    pub rates: HashMap<Currency, f64>,
}

impl SpotRates {
    /// Create spot rates from `(currency, rate)` pairs.
    pub fn new(base: Currency, rates: impl IntoIterator<Item = (Currency, f64)>) -> Self {
        Self {
            base,
            rates: rates.into_iter().collect(),
        }
    }
}

/// Immutable record of a successful fetch.
///
/// Snapshots are never edited; a refresh supersedes the whole record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateSnapshot {
    /// Currency all rates are quoted against.
    pub base: Currency,
    /// Units of currency per one unit of `base`.
    rates: HashMap<Currency, f64>,
    /// When the source answered.
    pub fetched_at: Timestamp,
    /// Name of the source that produced the rates.
    pub source: String,
}

impl RateSnapshot {
    /// Stamp spot rates with their fetch time.
    pub fn new(spot: SpotRates, source: impl Into<String>, fetched_at: Timestamp) -> Self {
        Self {
            base: spot.base,
            rates: spot.rates,
            fetched_at,
            source: source.into(),
        }
    }

    /// Units of `currency` per one unit of the base currency.
    pub fn rate_per_base(&self, currency: Currency) -> FxResult<f64> {
        if currency == self.base {
            return Ok(1.0);
        }

        let rate = self
            .rates
            .get(&currency)
            .copied()
            .ok_or(FxError::MissingRate(currency))?;

        if !rate.is_finite() || rate <= 0.0 {
            return Err(FxError::InvalidRate { currency, rate });
        }

        Ok(rate)
    }

    /// Check that every currency in `symbols` has a usable rate.
    pub fn validate(&self, symbols: &[Currency]) -> FxResult<()> {
        for currency in symbols {
            self.rate_per_base(*currency)?;
        }
        Ok(())
    }

    /// Fresh iff strictly less than `ttl` has passed since the fetch.
    pub fn is_fresh(&self, now: Timestamp, ttl: Duration) -> bool {
        now.signed_duration_since(self.fetched_at) < ttl
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn snapshot() -> RateSnapshot {
        RateSnapshot::new(
            SpotRates::new(
                Currency::Usd,
                [(Currency::Rub, 90.0), (Currency::Kzt, 450.0), (Currency::Eur, 0.9)],
            ),
            "TEST",
            Utc::now(),
        )
    }

    #[test]
    fn test_base_rate_is_one() {
        assert_eq!(snapshot().rate_per_base(Currency::Usd).unwrap(), 1.0);
    }

    #[test]
    fn test_missing_rate() {
        let snap = RateSnapshot::new(
            SpotRates::new(Currency::Usd, [(Currency::Rub, 90.0)]),
            "TEST",
            Utc::now(),
        );
        assert!(matches!(
            snap.rate_per_base(Currency::Kzt),
            Err(FxError::MissingRate(Currency::Kzt))
        ));
        assert!(snap.validate(&[Currency::Rub, Currency::Kzt]).is_err());
    }

    #[test]
    fn test_invalid_rate() {
        let snap = RateSnapshot::new(
            SpotRates::new(Currency::Usd, [(Currency::Rub, 0.0), (Currency::Kzt, f64::NAN)]),
            "TEST",
            Utc::now(),
        );
        assert!(matches!(
            snap.rate_per_base(Currency::Rub),
            Err(FxError::InvalidRate { .. })
        ));
        assert!(matches!(
            snap.rate_per_base(Currency::Kzt),
            Err(FxError::InvalidRate { .. })
        ));
    }

    #[test]
    fn test_freshness_boundary() {
        let snap = snapshot();
        let ttl = Duration::minutes(20);
        let eps = Duration::milliseconds(1);

        assert!(snap.is_fresh(snap.fetched_at + ttl - eps, ttl));
        assert!(!snap.is_fresh(snap.fetched_at + ttl, ttl));
        assert!(!snap.is_fresh(snap.fetched_at + ttl + eps, ttl));
    }
}
