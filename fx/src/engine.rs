//! Quote engine: cache, source and spread behind one handle.

use std::sync::Arc;

use fxdesk_common::{constants, Currency, CurrencyPair, SharedClock, SystemClock, Timestamp};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::cache::{CacheStats, RateCache, RateCacheConfig};
use crate::error::{FxError, FxResult};
use crate::provider::RateSource;
use crate::rate_lock::LockedRate;
use crate::snapshot::RateSnapshot;
use crate::spread::{CrossRates, Direction, Spread, SpreadCalculator};

/// Configuration for the quote engine.
#[derive(Debug, Clone)]
pub struct QuoteEngineConfig {
    /// Currency the source quotes everything against.
    pub base: Currency,
    /// Currencies requested from the source.
    pub symbols: Vec<Currency>,
    /// Currency the rate board is priced in.
    pub home: Currency,
    /// Commercial spread.
    pub spread: Spread,
    /// Cache configuration.
    pub cache: RateCacheConfig,
    /// Upper bound on one source call.
    pub fetch_timeout: std::time::Duration,
}

impl Default for QuoteEngineConfig {
    fn default() -> Self {
        Self {
            base: Currency::Usd,
            symbols: vec![Currency::Rub, Currency::Eur, Currency::Kzt],
            home: Currency::Rub,
            spread: Spread::DEFAULT,
            cache: RateCacheConfig::default(),
            fetch_timeout: constants::rate_fetch_timeout(),
        }
    }
}

/// One line of the rate board.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoardEntry {
    pub currency: Currency,
    /// Units of the home currency per one unit of `currency`.
    pub rate: f64,
}

/// Market rates of the basket against the home currency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateBoard {
    pub home: Currency,
    pub entries: Vec<BoardEntry>,
    pub fetched_at: Timestamp,
}

/// Serves snapshots, cross rates and rate locks.
pub struct QuoteEngine {
    source: Arc<dyn RateSource>,
    cache: RateCache,
    calculator: RwLock<SpreadCalculator>,
    config: QuoteEngineConfig,
    clock: SharedClock,
}

impl QuoteEngine {
    /// Create a new engine backed by `source`.
    pub fn new(source: Arc<dyn RateSource>, config: QuoteEngineConfig) -> Self {
        Self::with_clock(source, config, SystemClock::shared())
    }

    /// Create an engine reading time from `clock`.
    pub fn with_clock(
        source: Arc<dyn RateSource>,
        config: QuoteEngineConfig,
        clock: SharedClock,
    ) -> Self {
        Self {
            source,
            cache: RateCache::with_clock(config.cache.clone(), clock.clone()),
            calculator: RwLock::new(SpreadCalculator::new(config.spread)),
            config,
            clock,
        }
    }

    /// Get a fresh snapshot, fetching one if the cache has none.
    ///
    /// Concurrent callers that all miss will each fetch; the last to
    /// finish wins the cache slot.
    pub async fn snapshot(&self) -> FxResult<Arc<RateSnapshot>> {
        if let Some(cached) = self.cache.get() {
            return Ok(cached);
        }
        self.refresh().await
    }

    /// Fetch from the source and replace the cached snapshot.
    ///
    /// Nothing is cached unless every configured symbol has a usable rate.
    /// A fetch that outlives the timeout is left to finish on its own and
    /// its result is discarded.
    #[instrument(skip(self), fields(source = %self.source.name()))]
    pub async fn refresh(&self) -> FxResult<Arc<RateSnapshot>> {
        let source = self.source.clone();
        let base = self.config.base;
        let symbols = self.config.symbols.clone();
        let fetch = tokio::spawn(async move { source.fetch(base, &symbols).await });

        let spot = match tokio::time::timeout(self.config.fetch_timeout, fetch).await {
            Ok(Ok(Ok(spot))) => spot,
            Ok(Ok(Err(err))) => {
                warn!(error = %err, code = err.error_code(), "Rate fetch failed");
                return Err(err);
            }
            Ok(Err(join_err)) => {
                warn!(error = %join_err, "Rate fetch task aborted");
                return Err(FxError::Transport(join_err.to_string()));
            }
            Err(_) => {
                warn!(timeout = ?self.config.fetch_timeout, "Rate fetch timed out");
                return Err(FxError::Timeout(self.config.fetch_timeout));
            }
        };

        if spot.base != self.config.base {
            return Err(FxError::MalformedPayload(format!(
                "expected base {}, got {}",
                self.config.base, spot.base
            )));
        }

        let snapshot = RateSnapshot::new(spot, self.source.name(), self.clock.now());
        if let Err(err) = snapshot.validate(&self.config.symbols) {
            warn!(error = %err, "Rejected incomplete snapshot");
            return Err(err);
        }

        info!(fetched_at = %snapshot.fetched_at, "Rates refreshed");

        Ok(self.cache.set(snapshot))
    }

    /// Derive client-facing rates for `pair` at the current spread.
    #[instrument(skip(self), fields(pair = %pair))]
    pub async fn cross_rates(&self, pair: CurrencyPair) -> FxResult<CrossRates> {
        let snapshot = self.snapshot().await?;
        let calculator = *self.calculator.read();
        let rates = calculator.derive(&snapshot, pair)?;

        debug!(
            base_rate = rates.base_rate,
            forward = rates.forward,
            inverse = rates.inverse,
            "Derived cross rates"
        );

        Ok(rates)
    }

    /// Lock the client rate for one direction of `pair`.
    #[instrument(skip(self), fields(pair = %pair))]
    pub async fn lock_rate(&self, pair: CurrencyPair, direction: Direction) -> FxResult<LockedRate> {
        let rates = self.cross_rates(pair).await?;
        let lock = LockedRate::lock(&rates, direction, self.clock.now());

        info!(
            quote_id = %lock.id,
            oriented = %lock.pair,
            rate = lock.rate,
            "Locked rate"
        );

        Ok(lock)
    }

    /// Market rates of every basket currency in the home currency.
    pub async fn rate_board(&self) -> FxResult<RateBoard> {
        let snapshot = self.snapshot().await?;
        let home = self.config.home;
        let home_per_base = snapshot.rate_per_base(home)?;

        let mut entries = Vec::new();
        for currency in Currency::all() {
            let quoted = *currency == self.config.base || self.config.symbols.contains(currency);
            if !quoted || *currency == home {
                continue;
            }
            let rate = home_per_base / snapshot.rate_per_base(*currency)?;
            entries.push(BoardEntry {
                currency: *currency,
                rate,
            });
        }

        Ok(RateBoard {
            home,
            entries,
            fetched_at: snapshot.fetched_at,
        })
    }

    /// Current spread.
    pub fn spread(&self) -> Spread {
        self.calculator.read().spread()
    }

    /// Change the spread. Applies to the next quote without a refetch.
    pub fn set_spread(&self, spread: Spread) {
        *self.calculator.write() = SpreadCalculator::new(spread);
        info!(spread = %spread, "Spread updated");
    }

    /// Get engine statistics.
    pub fn stats(&self) -> QuoteEngineStats {
        QuoteEngineStats {
            source: self.source.name().to_string(),
            spread: self.spread(),
            cache: self.cache.stats(),
        }
    }
}

/// Engine statistics.
#[derive(Debug, Clone)]
pub struct QuoteEngineStats {
    pub source: String,
    pub spread: Spread,
    pub cache: CacheStats,
}
