//! Russian message text for desk replies.

use std::fmt::Write as _;

use fxdesk_common::{Currency, CurrencyPair};
use fxdesk_fx::{Conversion, InputMode, LockedRate, RateBoard, Spread};
use teloxide::types::InlineKeyboardMarkup;
use thiserror::Error;

use crate::desk::{ErrorReply, Reply};
use crate::session::SessionError;

use super::keyboards;

/// Generic text shown when a reply cannot be rendered.
pub const FALLBACK_TEXT: &str = "Что-то пошло не так. Попробуйте ещё раз.";

/// Reply that cannot be turned into text.
#[derive(Debug, Error, PartialEq)]
pub enum RenderError {
    /// A figure has no display form (NaN, infinite or out of range).
    #[error("Cannot display {what}: {value}")]
    NotDisplayable { what: &'static str, value: f64 },

    /// The rate board has nothing to show.
    #[error("Rate board is empty")]
    EmptyBoard,
}

/// Text plus optional keyboard.
#[derive(Debug, Clone)]
pub struct Rendered {
    pub text: String,
    pub keyboard: Option<InlineKeyboardMarkup>,
}

impl Rendered {
    fn new(text: String, keyboard: InlineKeyboardMarkup) -> Self {
        Self {
            text,
            keyboard: Some(keyboard),
        }
    }
}

/// Greeting shown with the main menu.
pub fn greeting(pair: CurrencyPair) -> String {
    format!(
        "Привет. Здесь вы можете получить актуальный курс валюты USD, EUR и KZT \
         и рассчитать обмен {} ⇄ {}.",
        pair.from, pair.to
    )
}

/// Render `reply`.
pub fn render(reply: &Reply, menu_pair: CurrencyPair) -> Result<Rendered, RenderError> {
    let rendered = match reply {
        Reply::Menu { pair } => Rendered::new(greeting(*pair), keyboards::main_menu(*pair)),
        Reply::RateBoard(board) => Rendered::new(rate_board(board)?, keyboards::back_to_menu()),
        Reply::Quote { locked, spread } => {
            Rendered::new(quote(locked, *spread)?, keyboards::input_mode(locked.pair))
        }
        Reply::AmountPrompt { pair, mode, currency } => Rendered {
            text: amount_prompt(*pair, *mode, *currency),
            keyboard: None,
        },
        Reply::Converted(conversion) => {
            Rendered::new(converted(conversion)?, keyboards::main_menu(menu_pair))
        }
        Reply::Error(error) => error_reply(error, menu_pair),
    };
    Ok(rendered)
}

/// Render `reply`, falling back to generic text.
pub fn render_or_fallback(reply: &Reply, menu_pair: CurrencyPair) -> Rendered {
    render(reply, menu_pair).unwrap_or_else(|err| {
        tracing::warn!(error = %err, "Falling back to generic reply");
        Rendered::new(FALLBACK_TEXT.to_string(), keyboards::main_menu(menu_pair))
    })
}

fn amount(value: f64, currency: Currency, what: &'static str) -> Result<String, RenderError> {
    currency
        .round_amount(value)
        .map(|d| d.to_string())
        .ok_or(RenderError::NotDisplayable { what, value })
}

fn rate(value: f64, pair: CurrencyPair, what: &'static str) -> Result<String, RenderError> {
    pair.round_rate(value)
        .map(|d| d.to_string())
        .ok_or(RenderError::NotDisplayable { what, value })
}

fn rate_board(board: &RateBoard) -> Result<String, RenderError> {
    if board.entries.is_empty() {
        return Err(RenderError::EmptyBoard);
    }

    let mut text = String::from("📈 Актуальный курс:\n");
    for entry in &board.entries {
        let pair = CurrencyPair::new(entry.currency, board.home);
        let value = rate(entry.rate, pair, "board rate")?;
        let _ = write!(text, "\n1 {} = {} {}", entry.currency, value, board.home);
    }
    Ok(text)
}

fn quote(locked: &LockedRate, spread: Spread) -> Result<String, RenderError> {
    let pair = locked.pair;
    Ok(format!(
        "Курс обмена {from} → {to}:\n1 {from} = {rate} {to}\n\
         (рыночный курс {market}, комиссия {spread})\n\nКак считаем?",
        from = pair.from,
        to = pair.to,
        rate = rate(locked.rate, pair, "locked rate")?,
        market = rate(locked.market_rate, pair, "market rate")?,
        spread = spread,
    ))
}

fn amount_prompt(pair: CurrencyPair, mode: InputMode, currency: Currency) -> String {
    match mode {
        InputMode::SourceGiven => format!("Введите сумму в {}, которую отдаёте:", currency),
        InputMode::DestinationDesired => format!(
            "Введите сумму в {}, которую хотите получить за {}:",
            currency, pair.from
        ),
    }
}

fn converted(conversion: &Conversion) -> Result<String, RenderError> {
    let pair = conversion.pair;
    let source = amount(conversion.source_amount, pair.from, "source amount")?;
    let destination = amount(conversion.destination_amount, pair.to, "destination amount")?;
    let rate = rate(conversion.rate, pair, "rate")?;

    let text = match conversion.mode {
        InputMode::SourceGiven => format!(
            "💱 За {source} {from} вы получите {destination} {to}.\nКурс: 1 {from} = {rate} {to}",
            from = pair.from,
            to = pair.to,
        ),
        InputMode::DestinationDesired => format!(
            "💱 Чтобы получить {destination} {to}, нужно отдать {source} {from}.\nКурс: 1 {from} = {rate} {to}",
            from = pair.from,
            to = pair.to,
        ),
    };
    Ok(text)
}

fn error_reply(error: &ErrorReply, menu_pair: CurrencyPair) -> Rendered {
    match error {
        ErrorReply::QuoteUnavailable { retryable, .. } => {
            let text = if *retryable {
                "⚠️ Не удалось получить курс. Попробуйте ещё раз через минуту."
            } else {
                "⚠️ Курс сейчас недоступен. Попробуйте позже."
            };
            Rendered::new(text.to_string(), keyboards::main_menu(menu_pair))
        }
        ErrorReply::InvalidAmount(_) => Rendered {
            text: "Введите положительное число, например 1500 или 1500,50.".to_string(),
            keyboard: Some(keyboards::back_to_menu()),
        },
        ErrorReply::SessionLost(SessionError::LockExpired { .. }) => Rendered::new(
            "⌛ Зафиксированный курс устарел. Начните расчёт заново.".to_string(),
            keyboards::main_menu(menu_pair),
        ),
        ErrorReply::SessionLost(_) => Rendered::new(
            "Расчёт не начат или уже завершён. Выберите направление обмена.".to_string(),
            keyboards::main_menu(menu_pair),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use fxdesk_common::{Amount, ValidationError};
    use fxdesk_fx::{BoardEntry, CrossRates, Direction};

    fn rub_kzt() -> CurrencyPair {
        CurrencyPair::new(Currency::Rub, Currency::Kzt)
    }

    fn locked(direction: Direction) -> LockedRate {
        let rates = CrossRates {
            pair: rub_kzt(),
            base_rate: 5.0,
            forward: 4.8,
            inverse: 5.2,
            spread: Spread::DEFAULT,
        };
        LockedRate::lock(&rates, direction, Utc::now())
    }

    #[test]
    fn test_rate_board_precision() {
        let board = RateBoard {
            home: Currency::Rub,
            entries: vec![
                BoardEntry { currency: Currency::Usd, rate: 90.0 },
                BoardEntry { currency: Currency::Eur, rate: 97.826 },
                BoardEntry { currency: Currency::Kzt, rate: 0.19567 },
            ],
            fetched_at: Utc::now(),
        };

        let rendered = render(&Reply::RateBoard(board), rub_kzt()).unwrap();

        assert!(rendered.text.contains("1 USD = 90.00 RUB"));
        assert!(rendered.text.contains("1 EUR = 97.83 RUB"));
        assert!(rendered.text.contains("1 KZT = 0.1957 RUB"));
    }

    #[test]
    fn test_quote_forward() {
        let reply = Reply::Quote {
            locked: locked(Direction::Forward),
            spread: Spread::DEFAULT,
        };

        let rendered = render(&reply, rub_kzt()).unwrap();

        assert!(rendered.text.contains("1 RUB = 4.80 KZT"));
        assert!(rendered.text.contains("4%"));
        assert!(rendered.keyboard.is_some());
    }

    #[test]
    fn test_quote_reverse_uses_four_places() {
        let reply = Reply::Quote {
            locked: locked(Direction::Reverse),
            spread: Spread::DEFAULT,
        };

        let rendered = render(&reply, rub_kzt()).unwrap();

        assert!(rendered.text.contains("1 KZT = 0.1923 RUB"));
    }

    #[test]
    fn test_converted() {
        let conversion = Conversion::compute(
            &locked(Direction::Forward),
            InputMode::SourceGiven,
            Amount::parse("1000").unwrap(),
        );

        let rendered = render(&Reply::Converted(conversion), rub_kzt()).unwrap();

        assert!(rendered.text.contains("1000.00 RUB"));
        assert!(rendered.text.contains("4800.00 KZT"));
    }

    #[test]
    fn test_unrenderable_amount_falls_back() {
        let conversion = Conversion::compute(
            &locked(Direction::Forward),
            InputMode::SourceGiven,
            Amount::parse("1e300").unwrap(),
        );
        let reply = Reply::Converted(conversion);

        assert!(matches!(
            render(&reply, rub_kzt()),
            Err(RenderError::NotDisplayable { .. })
        ));
        assert_eq!(render_or_fallback(&reply, rub_kzt()).text, FALLBACK_TEXT);
    }

    #[test]
    fn test_errors_never_leak_internals() {
        for error in [
            ErrorReply::QuoteUnavailable {
                code: "HTTP_STATUS",
                retryable: true,
            },
            ErrorReply::InvalidAmount(ValidationError::NotANumber("abc".into())),
            ErrorReply::SessionLost(SessionError::InputModeMissing),
        ] {
            let rendered = render(&Reply::Error(error), rub_kzt()).unwrap();
            assert!(!rendered.text.contains("HTTP_STATUS"));
            assert!(!rendered.text.contains("abc"));
        }
    }
}
