//! Telegram dispatcher: turns updates into session events.

use super::messenger::{IncomingMessage, MessageContent, TapEvent};
use super::session::{ConversationSession, TapOutcome};
use super::source::{ApiCodeSource, CodeSource};
use super::telegram::TelegramMessenger;
use crate::codes::CodeResolver;
use crate::config::BotSettings;
use crate::geocoding::{DadataClient, Geocoder};
use crate::storage::address::SqliteAddressStore;
use crate::storage::cache::MemoryCache;
use anyhow::Context;
use std::sync::Arc;
use std::time::Duration;
use teloxide::dispatching::UpdateHandler;
use teloxide::prelude::*;
use teloxide::types::CallbackQuery;
use tracing::{debug, error, info};

/// Pause after a failed event before the next update is taken.
pub const EVENT_RETRY_DELAY: Duration = Duration::from_secs(3);

async fn code_source(settings: &BotSettings) -> anyhow::Result<Arc<dyn CodeSource>> {
    if let Some(url) = &settings.domofomka_api_url {
        info!("Resolving codes through {url}");
        return Ok(Arc::new(ApiCodeSource::new(url)));
    }

    let db_name = settings
        .db_name
        .as_deref()
        .context("db_name is required when domofomka_api_url is not set")?;
    let store = SqliteAddressStore::connect(db_name).await?;
    let geocoder = settings.dadata_token.as_deref().map(|token| {
        Arc::new(DadataClient::with_base_url(&settings.dadata_url, token)) as Arc<dyn Geocoder>
    });
    if geocoder.is_none() {
        info!("dadata_token is not set, location messages will fail");
    }

    Ok(Arc::new(CodeResolver::new(Arc::new(store), geocoder)))
}

/// Wire the session collaborators from settings.
///
/// # Errors
///
/// Returns an error if the address database cannot be opened.
pub async fn build_session(
    bot: &Bot,
    settings: &BotSettings,
) -> anyhow::Result<ConversationSession> {
    let codes = code_source(settings).await?;
    let cache = Arc::new(MemoryCache::new(settings.cache_max_capacity));
    let messenger = Arc::new(TelegramMessenger::new(bot.clone(), settings.group_id));

    Ok(ConversationSession::new(
        messenger,
        codes,
        cache,
        settings.session_settings(),
    ))
}

/// Run the bot until Ctrl-C.
///
/// # Errors
///
/// Returns an error if the session cannot be built.
pub async fn run(settings: BotSettings) -> anyhow::Result<()> {
    let bot = Bot::new(settings.telegram_token.clone());
    let session = Arc::new(build_session(&bot, &settings).await?);

    info!("Bot is running...");

    // One distribution key: updates are handled strictly one at a time
    Dispatcher::builder(bot, schema())
        .dependencies(dptree::deps![session])
        .distribution_function(|_| Some(()))
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    info!("Bot stopped");
    Ok(())
}

fn schema() -> UpdateHandler<teloxide::RequestError> {
    dptree::entry()
        .branch(Update::filter_callback_query().endpoint(handle_callback))
        .branch(Update::filter_message().endpoint(handle_message))
}

fn incoming_message(msg: &Message) -> Option<IncomingMessage> {
    let user_id = msg.from.as_ref()?.id.0.cast_signed();
    let content = match msg.location() {
        Some(location) => MessageContent::Location {
            latitude: location.latitude,
            longitude: location.longitude,
        },
        None => MessageContent::Text(msg.text()?.to_string()),
    };

    Some(IncomingMessage {
        user_id,
        chat_id: msg.chat.id.0,
        content,
    })
}

fn tap_event(q: &CallbackQuery) -> Option<TapEvent> {
    let message = q.message.as_ref()?;

    Some(TapEvent {
        user_id: q.from.id.0.cast_signed(),
        chat_id: message.chat().id.0,
        message_id: message.id().0,
        payload: q.data.clone()?,
        message_text: message
            .regular_message()
            .and_then(Message::text)
            .map(str::to_string),
    })
}

async fn handle_message(
    msg: Message,
    session: Arc<ConversationSession>,
) -> Result<(), teloxide::RequestError> {
    let Some(event) = incoming_message(&msg) else {
        debug!("Ignoring message without text or location");
        return respond(());
    };

    if let Err(e) = session.handle_message(event).await {
        error!("Message handler error: {e}");
        tokio::time::sleep(EVENT_RETRY_DELAY).await;
    }
    respond(())
}

async fn acknowledge(bot: &Bot, q: &CallbackQuery) {
    if let Err(e) = bot.answer_callback_query(q.id.clone()).await {
        error!("Failed to answer callback query: {e}");
    }
}

async fn handle_callback(
    bot: Bot,
    q: CallbackQuery,
    session: Arc<ConversationSession>,
) -> Result<(), teloxide::RequestError> {
    let Some(event) = tap_event(&q) else {
        debug!("Ignoring callback without payload or message");
        acknowledge(&bot, &q).await;
        return respond(());
    };

    match session.handle_tap(event).await {
        Ok(TapOutcome::Throttled { notice }) => {
            if let Err(e) = bot.answer_callback_query(q.id.clone()).text(notice).await {
                error!("Failed to show throttle notice: {e}");
            }
        }
        Ok(TapOutcome::Updated) => acknowledge(&bot, &q).await,
        Err(e) => {
            error!("Tap handler error: {e}");
            acknowledge(&bot, &q).await;
            tokio::time::sleep(EVENT_RETRY_DELAY).await;
        }
    }
    respond(())
}
