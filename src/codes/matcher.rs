//! Exact per-record address matching.

use super::normalizer::{normalize_city, normalize_message, normalize_street};

/// Shortest leftover word accepted as a city qualifier.
pub const MIN_QUALIFIER_LEN: usize = 4;

/// Decide whether a chat message names the given address record.
///
/// The normalized message must contain every street word; those words are
/// consumed once each, leftmost first, in street order. The house must then
/// occur exactly once in what is left. Whatever remains after removing the
/// house (and one occurrence of the street type) has to be made of words of
/// at least [`MIN_QUALIFIER_LEN`] characters that also appear in the city.
#[must_use]
pub fn matches(message: &str, city: &str, street: &str, house: &str, street_type: &str) -> bool {
    let mut remainder = normalize_message(message);
    let city = normalize_city(city);
    let street = normalize_street(street);
    let street_words: Vec<&str> = street.split_whitespace().collect();
    let house = house.to_lowercase();

    if !street_words.iter().all(|word| remainder.contains(word)) {
        return false;
    }

    for word in &street_words {
        remainder = remainder.replacen(word, "", 1);
    }

    if remainder.matches(house.as_str()).count() != 1 {
        return false;
    }
    remainder = remainder.replacen(house.as_str(), "", 1);

    if remainder.is_empty() {
        return true;
    }

    if remainder.contains(street_type) {
        remainder = remainder.replacen(street_type, "", 1);
    }

    remainder
        .split_whitespace()
        .all(|word| city.contains(word) && word.chars().count() >= MIN_QUALIFIER_LEN)
}

#[cfg(test)]
mod tests {
    use super::*;

    const CITY: &str = "москва";
    const STREET: &str = "ленина";
    const TYPE: &str = "улица";

    #[test]
    fn bare_street_and_house_match() {
        assert!(matches("ленина 5", CITY, STREET, "5", TYPE));
        assert!(matches("Ленина, дом 5", CITY, STREET, "5", TYPE));
        assert!(matches("5 ленина", CITY, STREET, "5", TYPE));
    }

    #[test]
    fn city_qualifiers_are_tolerated() {
        assert!(matches(
            "ленина 5 московская область",
            "москва московская область",
            STREET,
            "5",
            TYPE
        ));
        assert!(matches("москва ленина 5", CITY, STREET, "5", TYPE));
    }

    #[test]
    fn street_type_is_consumed() {
        assert!(matches("улица ленина 5", CITY, STREET, "5", TYPE));
        assert!(matches("москва улица ленина 5", CITY, STREET, "5", TYPE));
    }

    #[test]
    fn missing_street_word_rejects() {
        assert!(!matches("ленина 5", CITY, "маршала жукова", "5", TYPE));
    }

    #[test]
    fn house_must_occur_exactly_once() {
        assert!(!matches("ленина", CITY, STREET, "5", TYPE));
        assert!(!matches("ленина 5 5", CITY, STREET, "5", TYPE));
        // "1" occurs twice inside "11".
        assert!(!matches("ленина 11", CITY, STREET, "1", TYPE));
    }

    #[test]
    fn short_or_foreign_leftovers_reject() {
        assert!(!matches("ленина 5 мос", "москва", STREET, "5", TYPE));
        assert!(!matches("ленина 5 казань", CITY, STREET, "5", TYPE));
    }

    #[test]
    fn block_suffixes_are_normalized() {
        assert!(matches("ленина 5 корпус 2", CITY, STREET, "5к2", TYPE));
        assert!(matches("ленина 5 строение 1", CITY, STREET, "5с1", TYPE));
    }

    #[test]
    fn repeated_street_word_consumes_leftmost_occurrences() {
        // Street "мира мира" needs two occurrences in the message.
        assert!(matches("мира мира 3", CITY, "мира мира", "3", TYPE));
        // One occurrence passes the containment gate, is consumed once,
        // and the second removal is a no-op.
        assert!(matches("мира 3", CITY, "мира мира", "3", TYPE));
    }

    #[test]
    fn street_word_inside_house_is_consumed_first() {
        // Street "1 мая" consumes the leading "1", one "1" is left for the house.
        assert!(matches("1 мая 1", CITY, "1 мая", "1", TYPE));
        // House "10" loses its "1" to the street word and is not found.
        assert!(!matches("10 мая", CITY, "1 мая", "10", TYPE));
    }
}
