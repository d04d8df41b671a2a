//! Platform-neutral messaging contract used by the conversation session.

use async_trait::async_trait;
use thiserror::Error;

/// Errors raised by messaging backends
#[derive(Error, Debug)]
pub enum MessengerError {
    /// Platform API call failed
    #[error("Messaging API error: {0}")]
    Api(String),
}

/// Keyboard attached to an outgoing or edited message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Keyboard {
    /// No keyboard.
    None,
    /// Reply keyboard with a single "share location" button.
    Location,
    /// Inline entrance buttons, laid out in rows.
    Entrances(Vec<Vec<EntranceButton>>),
}

/// One inline entrance button.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntranceButton {
    /// Visible label (the entrance).
    pub label: String,
    /// Encoded interaction payload returned on tap.
    pub payload: String,
}

/// Content of an inbound user message.
#[derive(Debug, Clone, PartialEq)]
pub enum MessageContent {
    /// Free text.
    Text(String),
    /// Shared geolocation.
    Location {
        /// Latitude in degrees.
        latitude: f64,
        /// Longitude in degrees.
        longitude: f64,
    },
}

/// An inbound user message.
#[derive(Debug, Clone, PartialEq)]
pub struct IncomingMessage {
    /// Sender.
    pub user_id: i64,
    /// Conversation the answer goes to.
    pub chat_id: i64,
    /// Message body.
    pub content: MessageContent,
}

/// A tap on an inline entrance button.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TapEvent {
    /// User who tapped.
    pub user_id: i64,
    /// Conversation holding the tapped message.
    pub chat_id: i64,
    /// Identifier of the tapped message.
    pub message_id: i32,
    /// Encoded interaction payload of the button.
    pub payload: String,
    /// Current text of the tapped message, when the platform provides it.
    pub message_text: Option<String>,
}

/// Outgoing side of the messaging platform
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Messenger: Send + Sync {
    /// Send a message and return its identifier.
    async fn send(&self, chat_id: i64, text: &str, keyboard: Keyboard)
        -> Result<i32, MessengerError>;
    /// Replace text and keyboard of an existing message.
    async fn edit(
        &self,
        chat_id: i64,
        message_id: i32,
        text: &str,
        keyboard: Keyboard,
    ) -> Result<(), MessengerError>;
    /// Whether the user belongs to the required group.
    async fn is_member(&self, user_id: i64) -> Result<bool, MessengerError>;
}
