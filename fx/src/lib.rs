//! FXDesk FX Engine
//!
//! Spot rate fetching, caching and spread derivation for the desk.
//!
//! # Features
//!
//! - Pluggable rate sources (openexchangerates.org, mock for tests)
//! - Single-snapshot cache with a fixed TTL
//! - Asymmetric commercial spread
//! - Rate locking for consistent quotes within a dialogue
//!
//! # Example
//!
//! ```rust,ignore
//! use fxdesk_fx::{Direction, OpenExchangeRatesSource, QuoteEngine, QuoteEngineConfig};
//! use fxdesk_common::{Currency, CurrencyPair};
//!
//! let source = Arc::new(OpenExchangeRatesSource::new(app_id));
//! let engine = QuoteEngine::new(source, QuoteEngineConfig::default());
//!
//! let pair = CurrencyPair::new(Currency::Rub, Currency::Kzt);
//! let lock = engine.lock_rate(pair, Direction::Forward).await?;
//! ```

pub mod cache;
pub mod conversion;
pub mod engine;
pub mod error;
pub mod openexchange;
pub mod provider;
pub mod rate_lock;
pub mod snapshot;
pub mod spread;

pub use cache::{CacheStats, RateCache, RateCacheConfig};
pub use conversion::{Conversion, InputMode};
pub use engine::{BoardEntry, QuoteEngine, QuoteEngineConfig, QuoteEngineStats, RateBoard};
pub use error::{FxError, FxResult};
pub use openexchange::OpenExchangeRatesSource;
pub use provider::RateSource;
#[cfg(any(test, feature = "test-utils"))]
pub use provider::MockRateSource;
pub use rate_lock::LockedRate;
pub use snapshot::{RateSnapshot, SpotRates};
pub use spread::{CrossRates, Direction, InvalidSpread, Spread, SpreadCalculator};
