//! Update routing.

use std::sync::Arc;

use fxdesk_common::SessionKey;
use teloxide::dispatching::UpdateHandler;
use teloxide::payloads::SendMessageSetters;
use teloxide::prelude::*;
use teloxide::utils::command::BotCommands;
use tracing::{debug, instrument};

use crate::desk::{Desk, Event};

use super::keyboards::Action;
use super::render::render_or_fallback;

/// Поддерживаются следующие команды
#[derive(BotCommands, Clone, Debug, PartialEq)]
#[command(rename_rule = "lowercase")]
pub enum Command {
    /// Главное меню
    Start,
    /// Показать этот текст
    Help,
    /// Отменить расчёт
    Cancel,
}

impl Command {
    fn event(&self) -> Option<Event> {
        match self {
            Command::Start => Some(Event::Start),
            Command::Cancel => Some(Event::Reset),
            Command::Help => None,
        }
    }
}

/// Dispatcher tree: commands, callback buttons, then free text.
pub fn schema() -> UpdateHandler<anyhow::Error> {
    let message_handler = Update::filter_message()
        .branch(teloxide::filter_command::<Command, _>().endpoint(on_command))
        .branch(dptree::endpoint(on_text));

    let callback_handler = Update::filter_callback_query().endpoint(on_callback);

    dptree::entry()
        .branch(message_handler)
        .branch(callback_handler)
}

async fn reply(bot: &Bot, chat: ChatId, desk: &Desk, key: SessionKey, event: Event) -> anyhow::Result<()> {
    let reply = desk.handle(key, event).await;
    let rendered = render_or_fallback(&reply, desk.pair());

    let request = bot.send_message(chat, rendered.text);
    match rendered.keyboard {
        Some(keyboard) => request.reply_markup(keyboard).await?,
        None => request.await?,
    };
    Ok(())
}

fn session_key(msg: &Message) -> SessionKey {
    match msg.from.as_ref() {
        Some(user) => SessionKey::new(user.id.0),
        None => SessionKey::new(msg.chat.id.0.unsigned_abs()),
    }
}

#[instrument(
    name = "command handler",
    skip_all,
    fields(
        from = %msg.from.as_ref().map(|u| u.full_name()).unwrap_or_default(),
        id = %msg.from.as_ref().map(|u| u.id.0).unwrap_or_default(),
    )
)]
async fn on_command(bot: Bot, msg: Message, cmd: Command, desk: Arc<Desk>) -> anyhow::Result<()> {
    debug!(command = ?cmd, "Command received");
    match cmd.event() {
        Some(event) => reply(&bot, msg.chat.id, &desk, session_key(&msg), event).await,
        None => {
            bot.send_message(msg.chat.id, Command::descriptions().to_string())
                .await?;
            Ok(())
        }
    }
}

#[instrument(
    name = "text handler",
    skip_all,
    fields(
        from = %msg.from.as_ref().map(|u| u.full_name()).unwrap_or_default(),
        id = %msg.from.as_ref().map(|u| u.id.0).unwrap_or_default(),
    )
)]
async fn on_text(bot: Bot, msg: Message, desk: Arc<Desk>) -> anyhow::Result<()> {
    let Some(text) = msg.text() else {
        debug!("Ignoring non-text message");
        return Ok(());
    };
    let event = Event::SubmitAmount(text.to_string());
    reply(&bot, msg.chat.id, &desk, session_key(&msg), event).await
}

/// Chat the button was pressed in. Falls back to the user's private chat
/// when Telegram no longer carries the message.
fn callback_chat(q: &CallbackQuery) -> ChatId {
    q.message
        .as_ref()
        .map(|message| message.chat().id)
        .unwrap_or_else(|| ChatId::from(q.from.id))
}

#[instrument(
    name = "callback handler",
    skip_all,
    fields(
        from = %q.from.full_name(),
        id = %q.from.id.0,
    )
)]
async fn on_callback(bot: Bot, q: CallbackQuery, desk: Arc<Desk>) -> anyhow::Result<()> {
    bot.answer_callback_query(q.id.clone()).await?;

    let Some(action) = q.data.as_deref().and_then(Action::parse) else {
        debug!(data = ?q.data, "Unknown callback payload");
        return Ok(());
    };

    let key = SessionKey::new(q.from.id.0);
    reply(&bot, callback_chat(&q), &desk, key, action.event()).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_parsing() {
        assert_eq!(Command::parse("/start", "fxdesk_bot").unwrap(), Command::Start);
        assert_eq!(Command::parse("/cancel", "fxdesk_bot").unwrap(), Command::Cancel);
        assert!(Command::parse("/unknown", "fxdesk_bot").is_err());
    }

    fn callback(message: Option<serde_json::Value>) -> CallbackQuery {
        let mut value = serde_json::json!({
            "id": "4382bfdwdsb323b2d9",
            "from": {"id": 1001, "is_bot": false, "first_name": "Aigerim"},
            "chat_instance": "-7749238103392",
            "data": "get_rates"
        });
        if let Some(message) = message {
            value["message"] = message;
        }
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_callback_replies_in_group_chat() {
        let q = callback(Some(serde_json::json!({
            "message_id": 77,
            "date": 1700000000,
            "chat": {"id": -1002003004005i64, "title": "Обменник", "type": "supergroup"},
            "from": {"id": 5001, "is_bot": true, "first_name": "fxdesk"},
            "text": "Выберите действие"
        })));

        assert_eq!(callback_chat(&q), ChatId(-1002003004005));
    }

    #[test]
    fn test_callback_without_message_uses_private_chat() {
        let q = callback(None);
        assert_eq!(callback_chat(&q), ChatId(1001));
    }

    #[test]
    fn test_command_events() {
        assert_eq!(Command::Start.event(), Some(Event::Start));
        assert_eq!(Command::Cancel.event(), Some(Event::Reset));
        assert_eq!(Command::Help.event(), None);
    }
}
