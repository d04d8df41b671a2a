//! Entrance pagination and the payload carried by inline buttons.

use super::messenger::{EntranceButton, Keyboard};
use thiserror::Error;

/// Entrances per sent message.
pub const PAGE_SIZE: usize = 10;
/// Buttons per keyboard row.
pub const ROW_SIZE: usize = 5;
/// Telegram callback data limit in bytes.
pub const MAX_PAYLOAD_BYTES: usize = 64;

const FIELD_SEPARATOR: char = '|';
const LIST_SEPARATOR: char = ',';

/// Errors that can occur while encoding or decoding button payloads
#[derive(Error, Debug, PartialEq, Eq)]
pub enum PayloadError {
    /// Label contains `|` or `,`
    #[error("Entrance label contains a reserved character: {0:?}")]
    ReservedCharacter(String),
    /// Label is empty
    #[error("Entrance label is empty")]
    EmptyLabel,
    /// Encoded payload exceeds the platform limit
    #[error("Payload is {0} bytes, limit is {MAX_PAYLOAD_BYTES}")]
    TooLarge(usize),
    /// Payload could not be parsed
    #[error("Malformed payload: {0:?}")]
    Malformed(String),
}

/// Data round-tripped through an entrance button.
///
/// `sibling_slice` is the page the button was rendered on; the detail view
/// rebuilds its keyboard from it instead of from the live result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InteractionPayload {
    /// Tapped entrance.
    pub entrance: String,
    /// Entrances of the page the button belongs to.
    pub sibling_slice: Vec<String>,
}

impl InteractionPayload {
    /// Encode as `entrance|sib1,sib2,...`.
    ///
    /// # Errors
    ///
    /// Returns `PayloadError` for empty labels, labels with separators, or
    /// payloads above [`MAX_PAYLOAD_BYTES`].
    pub fn encode(&self) -> Result<String, PayloadError> {
        for label in std::iter::once(&self.entrance).chain(&self.sibling_slice) {
            if label.is_empty() {
                return Err(PayloadError::EmptyLabel);
            }
            if label.contains([FIELD_SEPARATOR, LIST_SEPARATOR]) {
                return Err(PayloadError::ReservedCharacter(label.clone()));
            }
        }

        let encoded = format!(
            "{}{FIELD_SEPARATOR}{}",
            self.entrance,
            self.sibling_slice.join(&LIST_SEPARATOR.to_string())
        );
        if encoded.len() > MAX_PAYLOAD_BYTES {
            return Err(PayloadError::TooLarge(encoded.len()));
        }
        Ok(encoded)
    }

    /// Parse a payload produced by [`InteractionPayload::encode`].
    ///
    /// # Errors
    ///
    /// Returns `PayloadError::Malformed` when the separator or entrance is
    /// missing.
    pub fn decode(raw: &str) -> Result<Self, PayloadError> {
        let (entrance, siblings) = raw
            .split_once(FIELD_SEPARATOR)
            .ok_or_else(|| PayloadError::Malformed(raw.to_string()))?;
        if entrance.is_empty() {
            return Err(PayloadError::Malformed(raw.to_string()));
        }

        let sibling_slice = if siblings.is_empty() {
            Vec::new()
        } else {
            siblings.split(LIST_SEPARATOR).map(str::to_string).collect()
        };

        Ok(Self {
            entrance: entrance.to_string(),
            sibling_slice,
        })
    }
}

/// Split entrances into pages of at most [`PAGE_SIZE`].
pub fn pages(entrances: &[String]) -> impl Iterator<Item = &[String]> {
    entrances.chunks(PAGE_SIZE)
}

/// Inline keyboard for one page, rows of at most [`ROW_SIZE`] buttons.
///
/// # Errors
///
/// Returns `PayloadError` if a button payload cannot be encoded.
pub fn entrance_keyboard(page: &[String]) -> Result<Keyboard, PayloadError> {
    let rows = page
        .chunks(ROW_SIZE)
        .map(|row| {
            row.iter()
                .map(|entrance| {
                    let payload = InteractionPayload {
                        entrance: entrance.clone(),
                        sibling_slice: page.to_vec(),
                    };
                    Ok(EntranceButton {
                        label: entrance.clone(),
                        payload: payload.encode()?,
                    })
                })
                .collect::<Result<Vec<_>, PayloadError>>()
        })
        .collect::<Result<Vec<_>, PayloadError>>()?;

    Ok(Keyboard::Entrances(rows))
}
