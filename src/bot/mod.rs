/// Entrance pagination and button payloads
pub mod keyboard;
/// Platform-neutral messaging contract
pub mod messenger;
/// Telegram dispatcher wiring
pub mod runner;
/// Conversation state machine
pub mod session;
/// Code lookups used by the bot
pub mod source;
/// Telegram messaging backend
pub mod telegram;
/// User-visible texts and formatting
pub mod views;

pub use session::{ConversationSession, SessionError, SessionSettings, TapOutcome};
