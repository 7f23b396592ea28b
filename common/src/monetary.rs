//! Monetary types for FXDesk.

use rust_decimal::prelude::FromPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;

/// ISO 4217 currency code.
///
/// The desk only ever quotes this closed set: USD is the base the upstream
/// source prices everything against, the rest form the basket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    Usd,
    Rub,
    Eur,
    Kzt,
}

impl Currency {
    /// Get the currency code.
    pub fn code(&self) -> &'static str {
        match self {
            Currency::Usd => "USD",
            Currency::Rub => "RUB",
            Currency::Eur => "EUR",
            Currency::Kzt => "KZT",
        }
    }

    /// All supported currencies.
    pub fn all() -> &'static [Currency] {
        &[Currency::Usd, Currency::Rub, Currency::Eur, Currency::Kzt]
    }

    /// Whether one unit of this currency is worth a small fraction of the
    /// major currencies, so rates quoted per unit need extra precision.
    pub fn is_low_value(&self) -> bool {
        matches!(self, Currency::Kzt)
    }

    /// Decimal places for amounts in this currency.
    pub fn decimal_places(&self) -> u32 {
        2
    }

    /// Decimal places for a rate quoted per one unit of this currency.
    pub fn rate_decimal_places(&self) -> u32 {
        if self.is_low_value() {
            4
        } else {
            2
        }
    }

    /// Round an amount in this currency for display.
    pub fn round_amount(&self, value: f64) -> Option<Decimal> {
        round_half_up(value, self.decimal_places())
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl FromStr for Currency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "USD" => Ok(Currency::Usd),
            "RUB" => Ok(Currency::Rub),
            "EUR" => Ok(Currency::Eur),
            "KZT" => Ok(Currency::Kzt),
            _ => Err(format!("Unknown currency: {}", s)),
        }
    }
}

/// An ordered currency pair: amounts move from `from` into `to`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CurrencyPair {
    pub from: Currency,
    pub to: Currency,
}

impl CurrencyPair {
    /// Create a new currency pair.
    pub fn new(from: Currency, to: Currency) -> Self {
        Self { from, to }
    }

    /// Get the inverse pair.
    pub fn inverse(&self) -> Self {
        Self {
            from: self.to,
            to: self.from,
        }
    }

    /// Round a rate quoted as units of `to` per one unit of `from`.
    pub fn round_rate(&self, rate: f64) -> Option<Decimal> {
        round_half_up(rate, self.from.rate_decimal_places())
    }
}

impl fmt::Display for CurrencyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.from, self.to)
    }
}

impl FromStr for CurrencyPair {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (from, to) = s
            .split_once('/')
            .ok_or_else(|| format!("Expected FROM/TO, got {}", s))?;
        let pair = Self::new(from.parse()?, to.parse()?);
        if pair.from == pair.to {
            return Err(format!("Pair {} converts a currency into itself", pair));
        }
        Ok(pair)
    }
}

/// Round a value half-up (midpoint away from zero) to `places` decimals.
///
/// Returns `None` for NaN and infinities, which have no display form.
pub fn round_half_up(value: f64, places: u32) -> Option<Decimal> {
    let mut rounded = Decimal::from_f64(value)?
        .round_dp_with_strategy(places, RoundingStrategy::MidpointAwayFromZero);
    // pad so 4.8 renders as 4.80
    rounded.rescale(places);
    Some(rounded)
}

/// A strictly positive amount entered by a user.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Amount(f64);

impl Amount {
    /// Parse user input.
    ///
    /// Surrounding whitespace is ignored and either `.` or `,` is accepted
    /// as the fractional separator.
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::Empty);
        }

        let value: f64 = trimmed
            .replace(',', ".")
            .parse()
            .map_err(|_| ValidationError::NotANumber(trimmed.to_string()))?;

        if !value.is_finite() {
            return Err(ValidationError::NotANumber(trimmed.to_string()));
        }
        if value <= 0.0 {
            return Err(ValidationError::NotPositive(trimmed.to_string()));
        }

        Ok(Self(value))
    }

    /// Get the amount value.
    pub fn value(&self) -> f64 {
        self.0
    }
}
