//! Telegram front end.

pub mod handlers;
pub mod keyboards;
pub mod render;

use std::sync::Arc;

use teloxide::prelude::*;
use teloxide::utils::command::BotCommands;
use tracing::{info, instrument, warn};

use crate::desk::Desk;

pub use handlers::Command;
pub use render::{RenderError, Rendered};

/// Long-polling Telegram bot in front of a [`Desk`].
pub struct TelegramFrontend {
    bot: Bot,
}

impl TelegramFrontend {
    #[instrument(name = "initializing bot", skip(token))]
    pub fn new(token: &str) -> Self {
        let bot = Bot::new(token);
        Self { bot }
    }

    /// Run until Ctrl+C.
    #[instrument(name = "starting bot", skip_all)]
    pub async fn run(&self, desk: Arc<Desk>) {
        if let Err(err) = self.bot.set_my_commands(Command::bot_commands()).await {
            warn!(error = %err, "Failed to register bot commands");
        } else {
            info!("Registered bot commands with Telegram");
        }

        Dispatcher::builder(self.bot.clone(), handlers::schema())
            .dependencies(dptree::deps![desk])
            .enable_ctrlc_handler()
            .build()
            .dispatch()
            .await;
    }
}
