//! Conversion dialogue state machine.

use chrono::Duration;
use fxdesk_common::{Amount, Timestamp, ValidationError};
use fxdesk_fx::{Conversion, Direction, InputMode, LockedRate};
use thiserror::Error;

/// The dialogue lost track of where the user is. The session is cleared.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum SessionError {
    /// No direction was chosen, or the flow already finished.
    #[error("No conversion in progress")]
    NoActiveFlow,

    /// An amount arrived before the input mode was chosen.
    #[error("Input mode not chosen")]
    InputModeMissing,

    /// The locked rate outlived its TTL.
    #[error("Locked rate expired after {age_secs}s")]
    LockExpired { age_secs: i64 },
}

impl SessionError {
    /// Get error code for render instructions.
    pub fn error_code(&self) -> &'static str {
        match self {
            SessionError::NoActiveFlow => "NO_ACTIVE_FLOW",
            SessionError::InputModeMissing => "INPUT_MODE_MISSING",
            SessionError::LockExpired { .. } => "LOCK_EXPIRED",
        }
    }
}

/// Why an amount submission failed.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum SubmitError {
    /// The text is not a usable amount; the session is kept.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The session was in no state to take an amount; it is cleared.
    #[error(transparent)]
    Session(#[from] SessionError),
}

/// Per-user dialogue state.
///
/// `InputModeChosen` and `Completed` are never stored: choosing a mode
/// moves straight to `AwaitingAmount` and a result moves back to `Idle`.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum ConversionSession {
    #[default]
    Idle,
    DirectionChosen {
        locked: LockedRate,
    },
    AwaitingAmount {
        mode: InputMode,
        locked: LockedRate,
    },
}

impl ConversionSession {
    /// Check if no conversion is in progress.
    pub fn is_idle(&self) -> bool {
        matches!(self, ConversionSession::Idle)
    }

    /// Direction of the flow in progress.
    pub fn direction(&self) -> Option<Direction> {
        self.locked().map(|l| l.direction)
    }

    /// Rate locked for the flow in progress.
    pub fn locked(&self) -> Option<&LockedRate> {
        match self {
            ConversionSession::Idle => None,
            ConversionSession::DirectionChosen { locked }
            | ConversionSession::AwaitingAmount { locked, .. } => Some(locked),
        }
    }

    /// Start a fresh flow under `locked`, whatever state came before.
    pub fn choose_direction(&mut self, locked: LockedRate) {
        *self = ConversionSession::DirectionChosen { locked };
    }

    /// Pick how the next amount is read.
    ///
    /// Allowed again while awaiting an amount, to switch mode under the
    /// same lock. From `Idle` the session is cleared.
    pub fn choose_input_mode(&mut self, mode: InputMode) -> Result<LockedRate, SessionError> {
        match self {
            ConversionSession::DirectionChosen { locked }
            | ConversionSession::AwaitingAmount { locked, .. } => {
                let locked = *locked;
                *self = ConversionSession::AwaitingAmount { mode, locked };
                Ok(locked)
            }
            ConversionSession::Idle => {
                self.reset();
                Err(SessionError::NoActiveFlow)
            }
        }
    }

    /// Price `text` at the locked rate.
    ///
    /// A bad amount keeps the session waiting. A result, a state without
    /// an input mode, or an expired lock clears it.
    pub fn submit_amount(
        &mut self,
        text: &str,
        now: Timestamp,
        lock_ttl: Option<Duration>,
    ) -> Result<Conversion, SubmitError> {
        let (mode, locked) = match self {
            ConversionSession::AwaitingAmount { mode, locked } => (*mode, *locked),
            ConversionSession::DirectionChosen { .. } => {
                self.reset();
                return Err(SessionError::InputModeMissing.into());
            }
            ConversionSession::Idle => return Err(SessionError::NoActiveFlow.into()),
        };

        if locked.is_expired(now, lock_ttl) {
            self.reset();
            let age_secs = now.signed_duration_since(locked.locked_at).num_seconds();
            return Err(SessionError::LockExpired { age_secs }.into());
        }

        let amount = Amount::parse(text)?;
        let conversion = Conversion::compute(&locked, mode, amount);
        self.reset();
        Ok(conversion)
    }

    /// Abandon the flow.
    pub fn reset(&mut self) {
        *self = ConversionSession::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use fxdesk_common::{Currency, CurrencyPair};
    use fxdesk_fx::{CrossRates, Spread};
    use proptest::prelude::*;

    fn lock(direction: Direction, at: Timestamp) -> LockedRate {
        let rates = CrossRates {
            pair: CurrencyPair::new(Currency::Rub, Currency::Kzt),
            base_rate: 5.0,
            forward: 4.8,
            inverse: 5.2,
            spread: Spread::DEFAULT,
        };
        LockedRate::lock(&rates, direction, at)
    }

    fn awaiting(mode: InputMode) -> ConversionSession {
        let mut session = ConversionSession::default();
        session.choose_direction(lock(Direction::Forward, Utc::now()));
        session.choose_input_mode(mode).unwrap();
        session
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_full_flow_source_given() {
        let mut session = awaiting(InputMode::SourceGiven);

        let conversion = session.submit_amount("1000", Utc::now(), None).unwrap();

        assert!(close(conversion.result(), 4800.0));
        assert!(session.is_idle());
    }

    #[test]
    fn test_full_flow_destination_desired() {
        let mut session = awaiting(InputMode::DestinationDesired);

        let conversion = session.submit_amount("4800", Utc::now(), None).unwrap();

        assert!(close(conversion.result(), 1000.0));
        assert!(session.is_idle());
    }

    #[test]
    fn test_invalid_amount_keeps_state() {
        for text in ["", "   ", "abc", "0", "-5", "inf", "NaN"] {
            let mut session = awaiting(InputMode::SourceGiven);
            let before = session.clone();

            let err = session.submit_amount(text, Utc::now(), None).unwrap_err();

            assert!(matches!(err, SubmitError::Validation(_)), "{text:?}");
            assert_eq!(session, before);
        }
    }

    #[test]
    fn test_comma_separator_accepted() {
        let mut session = awaiting(InputMode::SourceGiven);
        let conversion = session.submit_amount(" 1000,5 ", Utc::now(), None).unwrap();
        assert!(close(conversion.source_amount, 1000.5));
    }

    #[test]
    fn test_amount_without_mode_clears_session() {
        let mut session = ConversionSession::default();
        session.choose_direction(lock(Direction::Forward, Utc::now()));

        let err = session.submit_amount("100", Utc::now(), None).unwrap_err();

        assert_eq!(err, SubmitError::Session(SessionError::InputModeMissing));
        assert!(session.is_idle());
    }

    #[test]
    fn test_amount_when_idle() {
        let mut session = ConversionSession::default();
        let err = session.submit_amount("100", Utc::now(), None).unwrap_err();
        assert_eq!(err, SubmitError::Session(SessionError::NoActiveFlow));
    }

    #[test]
    fn test_mode_when_idle_is_integrity_error() {
        let mut session = ConversionSession::default();
        assert_eq!(
            session.choose_input_mode(InputMode::SourceGiven),
            Err(SessionError::NoActiveFlow)
        );
        assert!(session.is_idle());
    }

    #[test]
    fn test_mode_switch_keeps_lock() {
        let mut session = awaiting(InputMode::SourceGiven);
        let id = session.locked().unwrap().id;

        session.choose_input_mode(InputMode::DestinationDesired).unwrap();

        assert_eq!(session.locked().unwrap().id, id);
        assert!(matches!(
            session,
            ConversionSession::AwaitingAmount { mode: InputMode::DestinationDesired, .. }
        ));
    }

    #[test]
    fn test_new_direction_restarts_flow() {
        let mut session = awaiting(InputMode::SourceGiven);

        session.choose_direction(lock(Direction::Reverse, Utc::now()));

        assert_eq!(session.direction(), Some(Direction::Reverse));
        assert!(matches!(session, ConversionSession::DirectionChosen { .. }));
    }

    #[test]
    fn test_expired_lock_clears_session() {
        let locked_at = Utc::now();
        let mut session = ConversionSession::default();
        session.choose_direction(lock(Direction::Forward, locked_at));
        session.choose_input_mode(InputMode::SourceGiven).unwrap();

        let ttl = Some(Duration::minutes(5));
        let err = session
            .submit_amount("100", locked_at + Duration::minutes(6), ttl)
            .unwrap_err();

        assert_eq!(
            err,
            SubmitError::Session(SessionError::LockExpired { age_secs: 360 })
        );
        assert!(session.is_idle());
    }

    #[test]
    fn test_lock_without_ttl_never_expires() {
        let locked_at = Utc::now();
        let mut session = ConversionSession::default();
        session.choose_direction(lock(Direction::Forward, locked_at));
        session.choose_input_mode(InputMode::SourceGiven).unwrap();

        assert!(session
            .submit_amount("100", locked_at + Duration::days(2), None)
            .is_ok());
    }

    proptest! {
        #[test]
        fn prop_any_text_converts_or_keeps_waiting(text in "\\PC{0,12}") {
            let mut session = awaiting(InputMode::SourceGiven);
            let before = session.clone();

            match session.submit_amount(&text, Utc::now(), None) {
                Ok(conversion) => {
                    prop_assert!(session.is_idle());
                    prop_assert!(conversion.source_amount > 0.0);
                    prop_assert!(conversion.destination_amount > 0.0);
                }
                Err(SubmitError::Validation(_)) => prop_assert_eq!(session, before),
                Err(SubmitError::Session(err)) => prop_assert!(false, "unexpected {:?}", err),
            }
        }

        #[test]
        fn prop_positive_decimal_round_trips(whole in 1u32..1_000_000, frac in 0u32..100) {
            let mut session = awaiting(InputMode::DestinationDesired);
            let text = format!("{},{:02}", whole, frac);
            let expected = whole as f64 + frac as f64 / 100.0;

            let conversion = session.submit_amount(&text, Utc::now(), None).unwrap();

            prop_assert!((conversion.destination_amount - expected).abs() < 1e-9);
            prop_assert!((conversion.source_amount * 4.8 - expected).abs() < 1e-6);
        }
    }
}
