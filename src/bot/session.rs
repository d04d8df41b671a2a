//! Per-user conversation flow: subscription check, resolution, paginated
//! entrance buttons, entrance detail on tap, and anti-spam throttling.
//!
//! Every inbound event is handled to completion before the next one; the
//! session itself holds no per-user state beyond what is in the cache.

use super::keyboard::{self, InteractionPayload, PayloadError};
use super::messenger::{
    IncomingMessage, Keyboard, MessageContent, Messenger, MessengerError, TapEvent,
};
use super::source::CodeSource;
use super::views::{self, UnknownCodeType};
use crate::codes::normalizer::strip_address_markup;
use crate::codes::types::MatchResult;
use crate::codes::ResolveError;
use crate::storage::cache::{CacheError, KeyValueStore, WriteBatch};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error, info};

/// Value stored under the anti-spam key.
pub const GATE_SENTINEL: &str = "button_tap";

/// Errors that can occur while handling a conversation event
#[derive(Error, Debug)]
pub enum SessionError {
    /// Messaging platform failure
    #[error(transparent)]
    Messenger(#[from] MessengerError),
    /// Code lookup failure
    #[error(transparent)]
    Resolve(#[from] ResolveError),
    /// Cache failure
    #[error(transparent)]
    Cache(#[from] CacheError),
    /// Button payload could not be encoded or decoded
    #[error(transparent)]
    Payload(#[from] PayloadError),
    /// Code type outside the supported set
    #[error(transparent)]
    UnknownCodeType(#[from] UnknownCodeType),
    /// Tapped entrance is not part of the result
    #[error("Entrance {0:?} is not in the result")]
    UnknownEntrance(String),
    /// Cache miss and the tapped message text is not available
    #[error("Tapped message text is unavailable")]
    MessageUnavailable,
    /// Cached result could not be (de)serialized
    #[error("Cached result is invalid: {0}")]
    Serialization(#[from] serde_json::Error),
    /// Start message file could not be read
    #[error("Failed to read start message: {0}")]
    StartMessage(std::io::Error),
}

/// Outcome of a button tap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TapOutcome {
    /// The user is throttled; show `notice` ephemerally and change nothing.
    Throttled {
        /// Text of the ephemeral notice.
        notice: String,
    },
    /// The message now shows the entrance codes.
    Updated,
}

/// Session tunables.
#[derive(Debug, Clone)]
pub struct SessionSettings {
    /// Lifetime of cached results.
    pub cache_expire_time: Duration,
    /// Lifetime of the anti-spam gate after a tap.
    pub anti_spam_time: Duration,
    /// File with the help text; the built-in text is used when `None`.
    pub start_message_path: Option<PathBuf>,
}

/// Cache key of the result behind a sent message.
#[must_use]
pub fn session_key(user_id: i64, message_id: i32) -> String {
    format!("tg:user:{user_id}:message:{message_id}")
}

/// Cache key of the user's anti-spam gate.
#[must_use]
pub fn gate_key(user_id: i64) -> String {
    format!("tg:user:{user_id}:action")
}

/// Seconds as the cache reports them, rounded to the nearest second.
fn whole_seconds(left: Duration) -> u64 {
    left.as_secs() + u64::from(left.subsec_millis() >= 500)
}

/// The conversation state machine.
pub struct ConversationSession {
    messenger: Arc<dyn Messenger>,
    codes: Arc<dyn CodeSource>,
    cache: Arc<dyn KeyValueStore>,
    settings: SessionSettings,
}

impl ConversationSession {
    /// Create a session over its collaborators.
    #[must_use]
    pub fn new(
        messenger: Arc<dyn Messenger>,
        codes: Arc<dyn CodeSource>,
        cache: Arc<dyn KeyValueStore>,
        settings: SessionSettings,
    ) -> Self {
        Self {
            messenger,
            codes,
            cache,
            settings,
        }
    }

    /// Handle an inbound text or location message.
    ///
    /// # Errors
    ///
    /// Returns `SessionError` on any collaborator failure.
    pub async fn handle_message(&self, message: IncomingMessage) -> Result<(), SessionError> {
        let IncomingMessage {
            user_id,
            chat_id,
            content,
        } = message;

        if !self.messenger.is_member(user_id).await? {
            debug!(user_id, "User is not subscribed");
            self.messenger
                .send(chat_id, views::SUBSCRIBE_PROMPT, Keyboard::Location)
                .await?;
            return Ok(());
        }

        let result = match content {
            MessageContent::Text(text) if views::is_greeting(&text) => {
                let help = self.help_text().await?;
                self.messenger.send(chat_id, &help, Keyboard::Location).await?;
                return Ok(());
            }
            MessageContent::Text(text) => self.codes.by_message(&text).await?,
            MessageContent::Location {
                latitude,
                longitude,
            } => self.codes.by_location(latitude, longitude).await?,
        };

        if result.is_empty() {
            info!(user_id, "No results");
            self.messenger
                .send(chat_id, views::NO_RESULTS, Keyboard::None)
                .await?;
            return Ok(());
        }

        self.present_pages(user_id, chat_id, &result).await
    }

    async fn help_text(&self) -> Result<String, SessionError> {
        match &self.settings.start_message_path {
            Some(path) => tokio::fs::read_to_string(path).await.map_err(|e| {
                error!("Failed to read start message {}: {e}", path.display());
                SessionError::StartMessage(e)
            }),
            None => Ok(views::DEFAULT_HELP_TEXT.to_string()),
        }
    }

    async fn present_pages(
        &self,
        user_id: i64,
        chat_id: i64,
        result: &MatchResult,
    ) -> Result<(), SessionError> {
        let entrances: Vec<String> = result.data.entrances().map(str::to_string).collect();
        let address = result.address.as_deref().unwrap_or_default();
        let serialized = serde_json::to_string(result)?;
        let gate = gate_key(user_id);

        let keyboards = keyboard::pages(&entrances)
            .map(keyboard::entrance_keyboard)
            .collect::<Result<Vec<_>, _>>()?;

        for buttons in keyboards {
            if self.cache.exists(&gate).await? {
                debug!(user_id, "Gate is set, page suppressed");
                continue;
            }

            let message_id = self.messenger.send(chat_id, address, buttons).await?;
            self.cache
                .set(
                    &session_key(user_id, message_id),
                    serialized.clone(),
                    Some(self.settings.cache_expire_time),
                )
                .await?;
        }

        info!(user_id, entrances = entrances.len(), "Presented result");
        Ok(())
    }

    /// Handle a tap on an entrance button.
    ///
    /// Nothing is written to the cache unless the message was edited.
    ///
    /// # Errors
    ///
    /// Returns `SessionError` on a malformed payload, an unknown entrance or
    /// code type, or any collaborator failure.
    pub async fn handle_tap(&self, tap: TapEvent) -> Result<TapOutcome, SessionError> {
        let gate = gate_key(tap.user_id);
        if self.cache.exists(&gate).await? {
            if let Some(left) = self.cache.ttl(&gate).await? {
                let seconds = whole_seconds(left);
                if seconds > 0 {
                    debug!(user_id = tap.user_id, seconds, "Tap throttled");
                    return Ok(TapOutcome::Throttled {
                        notice: views::throttle_notice(seconds),
                    });
                }
            }
        }

        let payload = InteractionPayload::decode(&tap.payload)?;
        let key = session_key(tap.user_id, tap.message_id);
        let result = match self.cache.get(&key).await? {
            Some(cached) => serde_json::from_str::<MatchResult>(&cached)?,
            None => self.re_resolve(&tap).await?,
        };

        let codes = result
            .data
            .get(&payload.entrance)
            .ok_or_else(|| SessionError::UnknownEntrance(payload.entrance.clone()))?;
        let formatted = views::format_codes(codes)?;
        let body = views::detail_text(
            result.address.as_deref().unwrap_or_default(),
            &payload.entrance,
            &formatted,
        );
        let buttons = keyboard::entrance_keyboard(&payload.sibling_slice)?;
        let serialized = serde_json::to_string(&result)?;

        self.messenger
            .edit(tap.chat_id, tap.message_id, &body, buttons)
            .await?;

        let mut batch = WriteBatch::default();
        batch
            .set(gate, GATE_SENTINEL, Some(self.settings.anti_spam_time))
            .set(key, serialized, Some(self.settings.cache_expire_time));
        self.cache.commit(batch).await?;

        info!(
            user_id = tap.user_id,
            entrance = %payload.entrance,
            "Showed entrance codes"
        );
        Ok(TapOutcome::Updated)
    }

    /// Resolve again from the first line of the tapped message.
    async fn re_resolve(&self, tap: &TapEvent) -> Result<MatchResult, SessionError> {
        let first_line = tap
            .message_text
            .as_deref()
            .and_then(|text| text.lines().next())
            .ok_or(SessionError::MessageUnavailable)?;
        let query = strip_address_markup(first_line);
        debug!(user_id = tap.user_id, %query, "Cache miss, resolving again");
        Ok(self.codes.by_message(&query).await?)
    }
}
