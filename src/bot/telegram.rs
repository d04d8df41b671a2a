//! [`Messenger`] over the Telegram Bot API.

use super::messenger::{EntranceButton, Keyboard, Messenger, MessengerError};
use super::views::SEND_LOCATION_LABEL;
use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::{
    ButtonRequest, InlineKeyboardButton, InlineKeyboardMarkup, KeyboardButton, KeyboardMarkup,
    MessageId, UserId,
};
use tracing::{debug, error};

/// Telegram messaging backend.
pub struct TelegramMessenger {
    bot: Bot,
    group_id: ChatId,
}

impl TelegramMessenger {
    /// Create a backend checking membership in `group_id`.
    #[must_use]
    pub fn new(bot: Bot, group_id: i64) -> Self {
        Self {
            bot,
            group_id: ChatId(group_id),
        }
    }
}

fn api_error(action: &str, e: &teloxide::RequestError) -> MessengerError {
    error!("Telegram {action} failed: {e}");
    MessengerError::Api(e.to_string())
}

/// An edit to identical content leaves the message as wanted.
fn edit_result<T>(result: Result<T, teloxide::RequestError>) -> Result<(), MessengerError> {
    match result {
        Ok(_) => Ok(()),
        Err(teloxide::RequestError::Api(teloxide::ApiError::MessageNotModified)) => {
            debug!("Message update skipped: content unchanged");
            Ok(())
        }
        Err(e) => Err(api_error("edit", &e)),
    }
}

fn inline_markup(rows: &[Vec<EntranceButton>]) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(rows.iter().map(|row| {
        row.iter()
            .map(|button| InlineKeyboardButton::callback(&button.label, &button.payload))
            .collect::<Vec<_>>()
    }))
}

/// One-button reply keyboard requesting the user's location.
#[must_use]
pub fn location_markup() -> KeyboardMarkup {
    KeyboardMarkup::new(vec![vec![
        KeyboardButton::new(SEND_LOCATION_LABEL).request(ButtonRequest::Location),
    ]])
    .resize_keyboard()
}

#[async_trait]
impl Messenger for TelegramMessenger {
    async fn send(
        &self,
        chat_id: i64,
        text: &str,
        keyboard: Keyboard,
    ) -> Result<i32, MessengerError> {
        let request = self.bot.send_message(ChatId(chat_id), text);
        let sent = match keyboard {
            Keyboard::None => request.await,
            Keyboard::Location => request.reply_markup(location_markup()).await,
            Keyboard::Entrances(rows) => request.reply_markup(inline_markup(&rows)).await,
        }
        .map_err(|e| api_error("send", &e))?;
        Ok(sent.id.0)
    }

    async fn edit(
        &self,
        chat_id: i64,
        message_id: i32,
        text: &str,
        keyboard: Keyboard,
    ) -> Result<(), MessengerError> {
        let request = self
            .bot
            .edit_message_text(ChatId(chat_id), MessageId(message_id), text);
        // Edited messages only accept inline keyboards
        let edited = match keyboard {
            Keyboard::Entrances(rows) => request.reply_markup(inline_markup(&rows)).await,
            Keyboard::None | Keyboard::Location => request.await,
        };
        edit_result(edited)
    }

    async fn is_member(&self, user_id: i64) -> Result<bool, MessengerError> {
        let member = self
            .bot
            .get_chat_member(self.group_id, UserId(user_id.cast_unsigned()))
            .await
            .map_err(|e| api_error("membership check", &e))?;
        Ok(member.kind.is_present())
    }
}
