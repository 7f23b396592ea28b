//! Inline keyboards and callback payloads.

use fxdesk_common::CurrencyPair;
use fxdesk_fx::{Direction, InputMode};
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};

use crate::desk::Event;

/// Payload carried by an inline button.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    ShowRates,
    Menu,
    Direction(Direction),
    Mode(InputMode),
}

impl Action {
    /// Callback data string.
    pub fn as_data(&self) -> &'static str {
        match self {
            Action::ShowRates => "get_rates",
            Action::Menu => "back_to_menu",
            Action::Direction(Direction::Forward) => "dir:forward",
            Action::Direction(Direction::Reverse) => "dir:reverse",
            Action::Mode(InputMode::SourceGiven) => "mode:give",
            Action::Mode(InputMode::DestinationDesired) => "mode:get",
        }
    }

    /// Parse callback data. Unknown payloads yield `None`.
    pub fn parse(data: &str) -> Option<Self> {
        let action = match data {
            "get_rates" => Action::ShowRates,
            "back_to_menu" => Action::Menu,
            "dir:forward" => Action::Direction(Direction::Forward),
            "dir:reverse" => Action::Direction(Direction::Reverse),
            "mode:give" => Action::Mode(InputMode::SourceGiven),
            "mode:get" => Action::Mode(InputMode::DestinationDesired),
            _ => return None,
        };
        Some(action)
    }

    /// Event this button sends to the desk.
    pub fn event(&self) -> Event {
        match self {
            Action::ShowRates => Event::ShowRates,
            Action::Menu => Event::Reset,
            Action::Direction(direction) => Event::ChooseDirection(*direction),
            Action::Mode(mode) => Event::ChooseInputMode(*mode),
        }
    }
}

fn button(text: impl Into<String>, action: Action) -> InlineKeyboardButton {
    InlineKeyboardButton::callback(text, action.as_data())
}

/// Main menu: rate board plus both conversion directions.
pub fn main_menu(pair: CurrencyPair) -> InlineKeyboardMarkup {
    let back = pair.inverse();
    InlineKeyboardMarkup::new(vec![
        vec![button("📊 Запросить курс", Action::ShowRates)],
        vec![
            button(
                format!("💱 {} → {}", pair.from, pair.to),
                Action::Direction(Direction::Forward),
            ),
            button(
                format!("💱 {} → {}", back.from, back.to),
                Action::Direction(Direction::Reverse),
            ),
        ],
    ])
}

/// Input mode choice for an oriented pair.
pub fn input_mode(pair: CurrencyPair) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![button(
            format!("Отдаю {}", pair.from),
            Action::Mode(InputMode::SourceGiven),
        )],
        vec![button(
            format!("Хочу получить {}", pair.to),
            Action::Mode(InputMode::DestinationDesired),
        )],
        vec![button("⬅️ Возврат в главное меню", Action::Menu)],
    ])
}

/// Single "back to menu" button.
pub fn back_to_menu() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![button(
        "⬅️ Возврат в главное меню",
        Action::Menu,
    )]])
}
