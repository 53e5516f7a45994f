//! Telegram adapter: long-polls updates into transport [`Event`]s and
//! implements [`Messenger`] over the Bot API.

use std::sync::Arc;

use anyhow::Result;
use teloxide::payloads::EditMessageTextSetters;
use teloxide::prelude::*;
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup, MessageId, ParseMode};

use crate::transport::{Event, Keyboard, Messenger, MessageRef};

pub struct TelegramMessenger {
    api: teloxide::Bot,
}

impl TelegramMessenger {
    pub fn new(api: teloxide::Bot) -> Self {
        Self { api }
    }
}

fn markup(keyboard: Keyboard) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(keyboard.rows.into_iter().map(|row| {
        row.into_iter()
            .map(|button| InlineKeyboardButton::callback(button.label, button.token))
            .collect::<Vec<_>>()
    }))
}

#[async_trait::async_trait]
impl Messenger for TelegramMessenger {
    async fn send_text(&self, chat_id: i64, text: &str) -> Result<MessageRef> {
        let message = self.api.send_message(ChatId(chat_id), text).await?;
        Ok(MessageRef {
            chat_id,
            message_id: message.id.0,
        })
    }

    async fn edit_text(&self, target: MessageRef, text: &str) -> Result<()> {
        self.api
            .edit_message_text(ChatId(target.chat_id), MessageId(target.message_id), text)
            .await?;
        Ok(())
    }

    async fn edit_markup(
        &self,
        target: MessageRef,
        text: &str,
        keyboard: Keyboard,
        link_preview: bool,
    ) -> Result<()> {
        self.api
            .edit_message_text(ChatId(target.chat_id), MessageId(target.message_id), text)
            .parse_mode(ParseMode::MarkdownV2)
            .disable_web_page_preview(!link_preview)
            .reply_markup(markup(keyboard))
            .await?;
        Ok(())
    }
}

/// Split a raw message into a transport event. Commands may carry a
/// `@botname` suffix in group chats.
fn parse_message(chat_id: i64, text: &str) -> Event {
    let trimmed = text.trim();
    if let Some(rest) = trimmed.strip_prefix('/') {
        let (name, args) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
        let name = name.split('@').next().unwrap_or(name);
        Event::command(chat_id, name, args.trim())
    } else {
        Event::text(chat_id, trimmed)
    }
}

async fn on_message(bot: Arc<crate::bot::Bot>, message: Message) -> Result<()> {
    let Some(text) = message.text() else {
        return Ok(());
    };
    bot.handle_event(parse_message(message.chat.id.0, text)).await
}

async fn on_callback(
    api: teloxide::Bot,
    bot: Arc<crate::bot::Bot>,
    query: CallbackQuery,
) -> Result<()> {
    // Acknowledge first so the client stops the spinner even if handling
    // fails.
    api.answer_callback_query(query.id.clone()).await?;
    let Some(data) = query.data else {
        return Ok(());
    };
    let chat_id = query
        .message
        .as_ref()
        .map(|message| message.chat.id.0)
        .unwrap_or(query.from.id.0 as i64);
    bot.handle_event(Event::callback(chat_id, &data)).await
}

/// Long-poll updates until shutdown.
pub async fn run(bot: Arc<crate::bot::Bot>, api: teloxide::Bot) {
    let handler = dptree::entry()
        .branch(Update::filter_message().endpoint(on_message))
        .branch(Update::filter_callback_query().endpoint(on_callback));

    Dispatcher::builder(api, handler)
        .dependencies(dptree::deps![bot])
        .default_handler(|update| async move {
            tracing::debug!(update_id = update.id, "ignoring unhandled update");
        })
        .error_handler(LoggingErrorHandler::with_custom_text("update handler failed"))
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;
}
