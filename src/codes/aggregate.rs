//! Folding matched store rows into a single [`MatchResult`].

use super::types::{AddressRecord, CodeEntry, MatchResult};

/// Combine matched records into one user-facing result.
///
/// The shortest city among the records is canonical (first seen wins ties).
/// Records whose city does not contain it are dropped as homonyms; the rest
/// contribute their codes per entrance in record order. The address line
/// comes from the first qualifying record.
#[must_use]
pub fn aggregate(records: &[AddressRecord]) -> MatchResult {
    let mut result = MatchResult::default();

    let Some(canonical_city) = shortest_city(records) else {
        return result;
    };

    for record in records
        .iter()
        .filter(|record| record.city.contains(canonical_city))
    {
        if result.address.is_none() {
            result.address = Some(format!(
                "{canonical_city}, {} {}, дом {}",
                record.street_type, record.street, record.house
            ));
        }
        result.data.push(
            &record.entrance,
            CodeEntry::new(record.code.clone(), record.code_type.clone()),
        );
    }

    result
}

fn shortest_city(records: &[AddressRecord]) -> Option<&str> {
    let mut cities = records.iter().map(|record| record.city.as_str());
    let first = cities.next()?;
    Some(cities.fold(first, |shortest, city| {
        if city.chars().count() < shortest.chars().count() {
            city
        } else {
            shortest
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: i64, city: &str, entrance: &str, code: &str, code_type: &str) -> AddressRecord {
        AddressRecord {
            id,
            city: city.to_string(),
            street: "ленина".to_string(),
            street_type: "улица".to_string(),
            house: "5".to_string(),
            entrance: entrance.to_string(),
            code_type: code_type.to_string(),
            code: code.to_string(),
        }
    }

    #[test]
    fn empty_input_gives_empty_result() {
        let result = aggregate(&[]);
        assert!(result.is_empty());
        assert!(result.address.is_none());
    }

    #[test]
    fn shortest_city_is_canonical() {
        let records = vec![
            record(1, "москва московская область", "1", "111", "yaeda"),
            record(2, "москва", "2", "222", "delivery"),
            record(3, "москва", "1", "333", "oldcodes"),
        ];
        let result = aggregate(&records);

        assert_eq!(
            result.address.as_deref(),
            Some("москва, улица ленина, дом 5")
        );
        assert_eq!(result.data.entrances().collect::<Vec<_>>(), vec!["1", "2"]);
        let first = result.data.get("1").expect("entrance 1");
        assert_eq!(first[0].code, "111");
        assert_eq!(first[1].code, "333");
    }

    #[test]
    fn homonyms_without_canonical_city_are_dropped() {
        let records = vec![
            record(1, "казань", "1", "111", "yaeda"),
            record(2, "пушкино", "2", "222", "yaeda"),
        ];
        let result = aggregate(&records);

        assert_eq!(
            result.address.as_deref(),
            Some("казань, улица ленина, дом 5")
        );
        assert!(result.data.get("2").is_none());
    }

    #[test]
    fn address_comes_from_first_qualifying_record() {
        let mut second = record(2, "москва", "2", "222", "yaeda");
        second.house = "7".to_string();
        let records = vec![record(1, "москва", "1", "111", "yaeda"), second];
        let result = aggregate(&records);

        assert_eq!(
            result.address.as_deref(),
            Some("москва, улица ленина, дом 5")
        );
        assert_eq!(result.data.len(), 2);
    }
}
