//! Cross rate derivation with the commercial spread.

use fxdesk_common::CurrencyPair;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::error::FxResult;
use crate::snapshot::RateSnapshot;

/// Spread value outside `[0, 1)`.
#[derive(Debug, Clone, Error)]
#[error("Spread must be in [0, 1), got {0}")]
pub struct InvalidSpread(pub f64);

/// Commercial margin as a fraction (0.04 = 4%).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Spread(f64);

impl Spread {
    /// The margin the desk has always charged.
    pub const DEFAULT: Spread = Spread(0.04);

    /// Create a spread from a fraction.
    pub fn new(fraction: f64) -> Result<Self, InvalidSpread> {
        if !(0.0..1.0).contains(&fraction) {
            return Err(InvalidSpread(fraction));
        }
        Ok(Self(fraction))
    }

    /// Get the fraction.
    pub fn fraction(&self) -> f64 {
        self.0
    }
}

impl Default for Spread {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for Spread {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0 * 100.0)
    }
}

/// Which way money moves through the configured pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// `pair.from` into `pair.to`.
    Forward,
    /// `pair.to` into `pair.from`.
    Reverse,
}

impl Direction {
    /// The pair oriented so amounts move from `from` into `to`.
    pub fn orient(&self, pair: CurrencyPair) -> CurrencyPair {
        match self {
            Direction::Forward => pair,
            Direction::Reverse => pair.inverse(),
        }
    }
}

/// Client-facing rates for one pair.
///
/// `forward` and `inverse` are both quoted as units of `pair.to` per unit
/// of `pair.from`. They sit on either side of the market rate and are never
/// reciprocals of each other.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CrossRates {
    pub pair: CurrencyPair,
    /// Market cross rate before the spread.
    pub base_rate: f64,
    /// Rate applied when the client converts `from` into `to`.
    pub forward: f64,
    /// Rate charged when the client converts `to` back into `from`.
    pub inverse: f64,
    pub spread: Spread,
}

impl CrossRates {
    /// Destination units credited per source unit in `direction`.
    ///
    /// `Reverse` pays `1 / inverse`, so X converted forward and back
    /// returns X·(1−s)/(1+s), not X·(1−s²).
    pub fn rate_for(&self, direction: Direction) -> f64 {
        match direction {
            Direction::Forward => self.forward,
            Direction::Reverse => 1.0 / self.inverse,
        }
    }
}

/// Derives cross rates from a snapshot.
#[derive(Debug, Clone, Copy, Default)]
pub struct SpreadCalculator {
    spread: Spread,
}

impl SpreadCalculator {
    /// Create a calculator charging `spread`.
    pub fn new(spread: Spread) -> Self {
        Self { spread }
    }

    /// Current spread.
    pub fn spread(&self) -> Spread {
        self.spread
    }

    /// Derive forward and inverse rates for `pair`.
    pub fn derive(&self, snapshot: &RateSnapshot, pair: CurrencyPair) -> FxResult<CrossRates> {
        let from = snapshot.rate_per_base(pair.from)?;
        let to = snapshot.rate_per_base(pair.to)?;
        let base_rate = to / from;
        let s = self.spread.fraction();

        Ok(CrossRates {
            pair,
            base_rate,
            forward: base_rate * (1.0 - s),
            inverse: base_rate * (1.0 + s),
            spread: self.spread,
        })
    }
}
