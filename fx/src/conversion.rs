//! Currency conversion types and operations.

use fxdesk_common::{Amount, Currency, CurrencyPair, QuoteId};
use serde::{Deserialize, Serialize};

use crate::rate_lock::LockedRate;

/// What the user's number means.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InputMode {
    /// The amount the user hands over.
    SourceGiven,
    /// The amount the user wants to receive.
    DestinationDesired,
}

impl InputMode {
    /// Currency the user types the amount in.
    pub fn input_currency(&self, pair: CurrencyPair) -> Currency {
        match self {
            InputMode::SourceGiven => pair.from,
            InputMode::DestinationDesired => pair.to,
        }
    }
}

/// Represents a completed currency conversion.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Conversion {
    /// Lock the conversion was priced at.
    pub quote_id: QuoteId,
    /// Pair oriented the way money moves.
    pub pair: CurrencyPair,
    /// Rate used (units of `pair.to` per unit of `pair.from`).
    pub rate: f64,
    /// How the user's number was interpreted.
    pub mode: InputMode,
    /// Amount in `pair.from`.
    pub source_amount: f64,
    /// Amount in `pair.to`.
    pub destination_amount: f64,
}

impl Conversion {
    /// Price `amount` at the locked rate.
    pub fn compute(locked: &LockedRate, mode: InputMode, amount: Amount) -> Self {
        let (source_amount, destination_amount) = match mode {
            InputMode::SourceGiven => (amount.value(), amount.value() * locked.rate),
            InputMode::DestinationDesired => (amount.value() / locked.rate, amount.value()),
        };

        Self {
            quote_id: locked.id,
            pair: locked.pair,
            rate: locked.rate,
            mode,
            source_amount,
            destination_amount,
        }
    }

    /// The figure the user asked for.
    pub fn result(&self) -> f64 {
        match self.mode {
            InputMode::SourceGiven => self.destination_amount,
            InputMode::DestinationDesired => self.source_amount,
        }
    }

    /// Get the effective rate used.
    pub fn effective_rate(&self) -> f64 {
        if self.source_amount == 0.0 {
            return 0.0;
        }
        self.destination_amount / self.source_amount
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spread::{CrossRates, Direction, Spread};
    use chrono::Utc;

    fn locked(direction: Direction) -> LockedRate {
        let rates = CrossRates {
            pair: CurrencyPair::new(Currency::Rub, Currency::Kzt),
            base_rate: 5.0,
            forward: 4.8,
            inverse: 5.2,
            spread: Spread::DEFAULT,
        };
        LockedRate::lock(&rates, direction, Utc::now())
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_source_given() {
        let conversion = Conversion::compute(
            &locked(Direction::Forward),
            InputMode::SourceGiven,
            Amount::parse("1000").unwrap(),
        );

        assert!(close(conversion.result(), 4800.0));
        assert_eq!(conversion.source_amount, 1000.0);
        assert!(close(conversion.effective_rate(), 4.8));
    }

    #[test]
    fn test_destination_desired_solves_for_input() {
        let conversion = Conversion::compute(
            &locked(Direction::Forward),
            InputMode::DestinationDesired,
            Amount::parse("4800").unwrap(),
        );

        assert!(close(conversion.result(), 1000.0));
        assert_eq!(conversion.destination_amount, 4800.0);
    }

    #[test]
    fn test_reverse_direction_pays_inverse_rate() {
        let conversion = Conversion::compute(
            &locked(Direction::Reverse),
            InputMode::SourceGiven,
            Amount::parse("5200").unwrap(),
        );

        assert_eq!(conversion.pair.from, Currency::Kzt);
        assert!(close(conversion.result(), 1000.0));
    }

    #[test]
    fn test_mode_currencies() {
        let pair = CurrencyPair::new(Currency::Rub, Currency::Kzt);
        assert_eq!(InputMode::SourceGiven.input_currency(pair), Currency::Rub);
        assert_eq!(InputMode::DestinationDesired.input_currency(pair), Currency::Kzt);
    }
}
