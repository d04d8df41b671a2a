//! User-visible texts and the entrance detail layout.

use crate::codes::types::CodeEntry;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Help text used when no start message file is configured.
pub const DEFAULT_HELP_TEXT: &str = "Привет! Я подскажу коды домофонов.\n\
Отправьте адрес в формате «улица дом», например «Ленина 5 к2», \
или поделитесь геопозицией кнопкой ниже.";

/// Sent to users outside the required group.
pub const SUBSCRIBE_PROMPT: &str = "Пожалуйста, подпишитесь на группу";

/// Sent when resolution finds nothing.
pub const NO_RESULTS: &str = "Нет результатов";

/// Label of the location request button.
pub const SEND_LOCATION_LABEL: &str = "Отправить геопозицию";

/// Greeting keywords, compared case-insensitively.
pub const GREETINGS: [&str; 2] = ["начать", "/start"];

/// Code type outside the supported set
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown code type: {0:?}")]
pub struct UnknownCodeType(pub String);

/// Closed set of code categories, declared in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum CodeType {
    /// Food delivery codes.
    Yaeda,
    /// Courier codes.
    Delivery,
    /// Legacy codes.
    Oldcodes,
}

impl CodeType {
    /// Name as stored in the address database.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Yaeda => "yaeda",
            Self::Delivery => "delivery",
            Self::Oldcodes => "oldcodes",
        }
    }
}

impl fmt::Display for CodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CodeType {
    type Err = UnknownCodeType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "yaeda" => Ok(Self::Yaeda),
            "delivery" => Ok(Self::Delivery),
            "oldcodes" => Ok(Self::Oldcodes),
            other => Err(UnknownCodeType(other.to_string())),
        }
    }
}

/// Whether the text is a greeting keyword.
#[must_use]
pub fn is_greeting(text: &str) -> bool {
    let text = text.trim().to_lowercase();
    GREETINGS.contains(&text.as_str())
}

/// "секунд" declined for `n`.
#[must_use]
pub fn seconds_word(n: u64) -> &'static str {
    if n % 10 == 1 && n % 100 != 11 {
        "секунду"
    } else if (2..=4).contains(&(n % 10)) && !(10..15).contains(&n) {
        "секунды"
    } else {
        "секунд"
    }
}

/// Ephemeral notice for a throttled tap.
#[must_use]
pub fn throttle_notice(seconds: u64) -> String {
    format!("Подождите {seconds} {}!", seconds_word(seconds))
}

/// Codes grouped into `"\n{TYPE}:\n{codes}"` sections in type order.
///
/// The sort is stable, so codes of one type keep their stored order.
///
/// # Errors
///
/// Returns `UnknownCodeType` if any entry has a type outside the closed set.
pub fn format_codes(codes: &[CodeEntry]) -> Result<String, UnknownCodeType> {
    let mut typed = codes
        .iter()
        .map(|entry| Ok((entry.code_type.parse::<CodeType>()?, entry.code.as_str())))
        .collect::<Result<Vec<_>, UnknownCodeType>>()?;
    typed.sort_by_key(|(code_type, _)| *code_type);

    let mut sections: Vec<(CodeType, Vec<&str>)> = Vec::new();
    for (code_type, code) in typed {
        match sections.last_mut() {
            Some((current, list)) if *current == code_type => list.push(code),
            _ => sections.push((code_type, vec![code])),
        }
    }

    Ok(sections
        .iter()
        .map(|(code_type, list)| {
            format!(
                "\n{}:\n{}",
                code_type.as_str().to_uppercase(),
                list.join(" ")
            )
        })
        .collect())
}

/// Body of the message after an entrance tap.
#[must_use]
pub fn detail_text(address: &str, entrance: &str, formatted_codes: &str) -> String {
    format!("{address}\nПодъезд {entrance}\n{formatted_codes}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seconds_are_declined() {
        assert_eq!(seconds_word(1), "секунду");
        assert_eq!(seconds_word(21), "секунду");
        assert_eq!(seconds_word(11), "секунд");
        assert_eq!(seconds_word(2), "секунды");
        assert_eq!(seconds_word(3), "секунды");
        assert_eq!(seconds_word(24), "секунды");
        assert_eq!(seconds_word(12), "секунд");
        assert_eq!(seconds_word(14), "секунд");
        assert_eq!(seconds_word(5), "секунд");
        assert_eq!(seconds_word(10), "секунд");
        assert_eq!(throttle_notice(3), "Подождите 3 секунды!");
    }

    #[test]
    fn greetings_ignore_case() {
        assert!(is_greeting("Начать"));
        assert!(is_greeting("/start"));
        assert!(is_greeting(" НАЧАТЬ "));
        assert!(!is_greeting("начать ленина 5"));
    }

    #[test]
    fn codes_are_grouped_in_type_order() {
        let codes = vec![
            CodeEntry::new("111", "oldcodes"),
            CodeEntry::new("222", "yaeda"),
            CodeEntry::new("333", "delivery"),
            CodeEntry::new("444", "yaeda"),
        ];
        assert_eq!(
            format_codes(&codes).expect("known types"),
            "\nYAEDA:\n222 444\nDELIVERY:\n333\nOLDCODES:\n111"
        );
    }

    #[test]
    fn unknown_type_is_an_error() {
        let codes = vec![CodeEntry::new("1", "yaeda"), CodeEntry::new("2", "intercom")];
        assert_eq!(
            format_codes(&codes),
            Err(UnknownCodeType("intercom".to_string()))
        );
    }

    #[test]
    fn detail_layout() {
        let body = detail_text("москва, улица ленина, дом 5", "2", "\nYAEDA:\n123");
        assert_eq!(body, "москва, улица ленина, дом 5\nПодъезд 2\n\nYAEDA:\n123");
    }
}
