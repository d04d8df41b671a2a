//! Text normalization applied before address matching.
//!
//! All transforms are pure. [`normalize_city`] and [`normalize_street`] are
//! idempotent for any input; [`normalize_message`] is idempotent on ordinary
//! addresses (it removes every space, so it never rebuilds the ` дом `
//! marker it strips).

#![allow(clippy::non_std_lazy_statics)]

use lazy_regex::lazy_regex;

/// Any non-word character.
static RE_NON_WORD: lazy_regex::Lazy<regex::Regex> = lazy_regex!(r"\W");

/// Collapse a raw chat message into a compact, space-free string.
///
/// Lowercases, folds `ё` into `е`, drops commas and the ` дом ` marker,
/// shortens `строение`/`корпус` to `с`/`к`, then removes whitespace and
/// hyphens.
#[must_use]
pub fn normalize_message(raw: &str) -> String {
    raw.to_lowercase()
        .replace('ё', "е")
        .replace(',', "")
        .replace(" дом ", " ")
        .replace("строение", "с")
        .replace("корпус", "к")
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .collect()
}

/// Strip every non-word character from a city name and lowercase it.
#[must_use]
pub fn normalize_city(raw: &str) -> String {
    RE_NON_WORD.replace_all(raw, "").to_lowercase()
}

/// Lowercase a street name, drop commas and hyphens, collapse spaces.
#[must_use]
pub fn normalize_street(raw: &str) -> String {
    raw.to_lowercase()
        .replace([',', '-'], "")
        .split(' ')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Prepare the first line of a displayed result for re-resolution.
///
/// Inverse of the address layout `"{city}, {type} {street}, дом {house}"`.
#[must_use]
pub fn strip_address_markup(line: &str) -> String {
    line.replace(',', "").replace(" дом ", " ")
}
