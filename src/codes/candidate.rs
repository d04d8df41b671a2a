//! Coarse pre-filter for the address store scan.
//!
//! The longest Cyrillic word of the message (street-type nouns excluded)
//! becomes a filter token; a store row survives when the token is a
//! substring of its city or street. Only survivors reach the exact matcher.

#![allow(clippy::non_std_lazy_statics)]

use lazy_regex::lazy_regex;

/// Street-type nouns too generic to narrow a scan.
pub const STREET_TYPES: &[&str] = &[
    "улица",
    "проспект",
    "микрорайон",
    "переулок",
    "жилой комплекс",
    "бульвар",
    "тракт",
    "поселок",
    "проезд",
    "шоссе",
    "аллея",
    "площадь",
    "набережная",
    "квартал",
    "территория",
    "деревня",
    "военный городок",
    "жилой массив",
    "тупик",
];

/// Anything outside the lowercase Cyrillic range splits tokens.
static RE_TOKEN_SEPARATOR: lazy_regex::Lazy<regex::Regex> = lazy_regex!(r"[^а-я]");

/// Split the raw message into non-empty lowercase-Cyrillic tokens,
/// dropping bare street-type nouns.
#[must_use]
pub fn tokenize(message: &str) -> Vec<&str> {
    RE_TOKEN_SEPARATOR
        .split(message)
        .filter(|token| !token.is_empty())
        .filter(|token| !STREET_TYPES.contains(token))
        .collect()
}

/// Pick the scan filter token: the longest remaining token, case-folded.
///
/// Returns `None` when the message has no usable token; resolution then
/// short-circuits without touching the store. The first of several
/// equally long tokens wins.
#[must_use]
pub fn select_token(message: &str) -> Option<String> {
    tokenize(message)
        .into_iter()
        .fold(None::<&str>, |best, token| match best {
            Some(current) if current.chars().count() >= token.chars().count() => Some(current),
            _ => Some(token),
        })
        .map(str::to_lowercase)
}

/// Row-level pre-filter evaluated by the store during a scan.
#[must_use]
pub fn street_or_city_contains(token: &str, city: &str, street: &str) -> bool {
    city.to_lowercase().contains(token) || street.to_lowercase().contains(token)
}
