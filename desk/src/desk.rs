//! Dialogue controller: events in, render instructions out.

use std::sync::Arc;

use fxdesk_common::{Currency, CurrencyPair, SessionKey, SharedClock, SystemClock, ValidationError};
use fxdesk_fx::{Conversion, Direction, FxError, InputMode, LockedRate, QuoteEngine, RateBoard, Spread};
use tracing::{debug, info, instrument, warn};

use crate::config::SessionConfig;
use crate::metrics::SharedMetrics;
use crate::session::{SessionError, SubmitError};
use crate::store::SessionStore;

/// Something the user did.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// Open the main menu, abandoning any flow.
    Start,
    /// Show market rates against the home currency.
    ShowRates,
    /// Start a conversion in one direction of the configured pair.
    ChooseDirection(Direction),
    /// Say how the next amount should be read.
    ChooseInputMode(InputMode),
    /// Free text, expected to be an amount.
    SubmitAmount(String),
    /// Go back to the menu.
    Reset,
}

impl Event {
    /// Short name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Event::Start => "start",
            Event::ShowRates => "show_rates",
            Event::ChooseDirection(_) => "choose_direction",
            Event::ChooseInputMode(_) => "choose_input_mode",
            Event::SubmitAmount(_) => "submit_amount",
            Event::Reset => "reset",
        }
    }
}

/// What to show the user. Carries numbers and tags, never copy.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    /// Main menu for the configured pair.
    Menu { pair: CurrencyPair },
    /// Market rates.
    RateBoard(RateBoard),
    /// Rate locked for the chosen direction; ask for the input mode.
    Quote { locked: LockedRate, spread: Spread },
    /// Ask for an amount in `currency`.
    AmountPrompt {
        pair: CurrencyPair,
        mode: InputMode,
        currency: Currency,
    },
    /// Finished conversion.
    Converted(Conversion),
    /// Recoverable failure.
    Error(ErrorReply),
}

/// Failure classes the user can see.
#[derive(Debug, Clone, PartialEq)]
pub enum ErrorReply {
    /// Rates could not be obtained. The session is unchanged.
    QuoteUnavailable { code: &'static str, retryable: bool },
    /// The amount was rejected. The session still awaits an amount.
    InvalidAmount(ValidationError),
    /// The flow was out of order and has been cleared.
    SessionLost(SessionError),
}

impl From<&FxError> for ErrorReply {
    fn from(err: &FxError) -> Self {
        ErrorReply::QuoteUnavailable {
            code: err.error_code(),
            retryable: err.is_retryable(),
        }
    }
}

/// Runs the conversion dialogue for every user.
pub struct Desk {
    engine: Arc<QuoteEngine>,
    sessions: Arc<SessionStore>,
    metrics: SharedMetrics,
    pair: CurrencyPair,
    config: SessionConfig,
    clock: SharedClock,
}

impl Desk {
    /// Create a desk quoting `pair`.
    pub fn new(
        engine: Arc<QuoteEngine>,
        sessions: Arc<SessionStore>,
        metrics: SharedMetrics,
        pair: CurrencyPair,
        config: SessionConfig,
    ) -> Self {
        Self::with_clock(engine, sessions, metrics, pair, config, SystemClock::shared())
    }

    /// Create a desk reading time from `clock`.
    pub fn with_clock(
        engine: Arc<QuoteEngine>,
        sessions: Arc<SessionStore>,
        metrics: SharedMetrics,
        pair: CurrencyPair,
        config: SessionConfig,
        clock: SharedClock,
    ) -> Self {
        Self {
            engine,
            sessions,
            metrics,
            pair,
            config,
            clock,
        }
    }

    /// Configured pair.
    pub fn pair(&self) -> CurrencyPair {
        self.pair
    }

    /// Session storage.
    pub fn sessions(&self) -> &Arc<SessionStore> {
        &self.sessions
    }

    /// Handle one event for `key`.
    #[instrument(skip(self, event), fields(session = %key, event = event.name()))]
    pub async fn handle(&self, key: SessionKey, event: Event) -> Reply {
        match event {
            Event::Start => {
                self.sessions.reset(key);
                Reply::Menu { pair: self.pair }
            }
            Event::Reset => {
                if self.sessions.reset(key) {
                    self.metrics.session_reset();
                    info!("Session reset");
                }
                Reply::Menu { pair: self.pair }
            }
            Event::ShowRates => self.show_rates().await,
            Event::ChooseDirection(direction) => self.choose_direction(key, direction).await,
            Event::ChooseInputMode(mode) => self.choose_input_mode(key, mode),
            Event::SubmitAmount(text) => self.submit_amount(key, &text),
        }
    }

    async fn show_rates(&self) -> Reply {
        match self.engine.rate_board().await {
            Ok(board) => Reply::RateBoard(board),
            Err(err) => self.quote_failed(&err),
        }
    }

    async fn choose_direction(&self, key: SessionKey, direction: Direction) -> Reply {
        // the session is only touched after the fetch completes
        let locked = match self.engine.lock_rate(self.pair, direction).await {
            Ok(locked) => locked,
            Err(err) => return self.quote_failed(&err),
        };

        self.sessions.update(key, |session| session.choose_direction(locked));
        self.metrics.quote_issued();

        Reply::Quote {
            locked,
            spread: self.engine.spread(),
        }
    }

    fn choose_input_mode(&self, key: SessionKey, mode: InputMode) -> Reply {
        match self.sessions.update(key, |session| session.choose_input_mode(mode)) {
            Ok(locked) => Reply::AmountPrompt {
                pair: locked.pair,
                mode,
                currency: mode.input_currency(locked.pair),
            },
            Err(err) => self.integrity_failed(err),
        }
    }

    fn submit_amount(&self, key: SessionKey, text: &str) -> Reply {
        let now = self.clock.now();
        let lock_ttl = self.config.rate_lock_ttl;

        match self
            .sessions
            .update(key, |session| session.submit_amount(text, now, lock_ttl))
        {
            Ok(conversion) => {
                self.metrics.conversion_completed();
                info!(
                    quote_id = %conversion.quote_id,
                    pair = %conversion.pair,
                    source_amount = conversion.source_amount,
                    destination_amount = conversion.destination_amount,
                    effective_rate = conversion.effective_rate(),
                    "Conversion completed"
                );
                Reply::Converted(conversion)
            }
            Err(SubmitError::Validation(err)) => {
                self.metrics.validation_failed();
                info!(code = err.error_code(), "Amount rejected");
                Reply::Error(ErrorReply::InvalidAmount(err))
            }
            Err(SubmitError::Session(SessionError::NoActiveFlow)) => {
                // chatter outside a flow, nothing was lost
                self.metrics.stray_message();
                debug!("Text outside a conversion");
                Reply::Error(ErrorReply::SessionLost(SessionError::NoActiveFlow))
            }
            Err(SubmitError::Session(err)) => self.integrity_failed(err),
        }
    }

    fn quote_failed(&self, err: &FxError) -> Reply {
        self.metrics.quote_failed();
        warn!(error = %err, code = err.error_code(), "Quote unavailable");
        Reply::Error(ErrorReply::from(err))
    }

    fn integrity_failed(&self, err: SessionError) -> Reply {
        self.metrics.integrity_failed();
        warn!(code = err.error_code(), "Session cleared");
        Reply::Error(ErrorReply::SessionLost(err))
    }
}
