//! Data shapes shared by the resolution pipeline, the HTTP API and the bot.

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// One row of the address store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressRecord {
    /// Row identifier.
    pub id: i64,
    /// City, possibly with administrative suffixes.
    pub city: String,
    /// Street name without its type.
    pub street: String,
    /// Street type noun (`улица`, `проспект`, ...).
    pub street_type: String,
    /// House number including block/building suffixes.
    pub house: String,
    /// Entrance label.
    pub entrance: String,
    /// Code category (`yaeda`, `delivery`, `oldcodes`).
    pub code_type: String,
    /// Access code.
    pub code: String,
}

/// A single access code with its category.
///
/// Serialized as a two-element array `[code, code_type]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "(String, String)", into = "(String, String)")]
pub struct CodeEntry {
    /// Access code.
    pub code: String,
    /// Code category.
    pub code_type: String,
}

impl CodeEntry {
    /// Create an entry from code and category.
    pub fn new(code: impl Into<String>, code_type: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            code_type: code_type.into(),
        }
    }
}

impl From<(String, String)> for CodeEntry {
    fn from((code, code_type): (String, String)) -> Self {
        Self { code, code_type }
    }
}

impl From<CodeEntry> for (String, String) {
    fn from(entry: CodeEntry) -> Self {
        (entry.code, entry.code_type)
    }
}

/// Entrance label to code list mapping that keeps first-insertion order.
///
/// Serialized as a JSON object; key order follows the store's row order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntranceCodes(Vec<(String, Vec<CodeEntry>)>);

impl EntranceCodes {
    /// Append a code to an entrance, creating the entrance on first use.
    pub fn push(&mut self, entrance: &str, entry: CodeEntry) {
        match self.0.iter_mut().find(|(label, _)| label == entrance) {
            Some((_, codes)) => codes.push(entry),
            None => self.0.push((entrance.to_string(), vec![entry])),
        }
    }

    /// Codes of one entrance in row order.
    #[must_use]
    pub fn get(&self, entrance: &str) -> Option<&[CodeEntry]> {
        self.0
            .iter()
            .find(|(label, _)| label == entrance)
            .map(|(_, codes)| codes.as_slice())
    }

    /// Entrance labels in insertion order.
    pub fn entrances(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(label, _)| label.as_str())
    }

    /// Number of entrances.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when no entrance has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Serialize for EntranceCodes {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (entrance, codes) in &self.0 {
            map.serialize_entry(entrance, codes)?;
        }
        map.end()
    }
}

struct EntranceCodesVisitor;

impl<'de> Visitor<'de> for EntranceCodesVisitor {
    type Value = EntranceCodes;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a map of entrance labels to [code, code_type] pairs")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut codes = EntranceCodes::default();
        while let Some((entrance, entries)) = access.next_entry::<String, Vec<CodeEntry>>()? {
            for entry in entries {
                codes.push(&entrance, entry);
            }
        }
        Ok(codes)
    }
}

impl<'de> Deserialize<'de> for EntranceCodes {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(EntranceCodesVisitor)
    }
}

/// Outcome of resolving one query.
///
/// An empty result serializes to `{}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchResult {
    /// Canonical address line, set once from the first qualifying record.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    /// Codes grouped by entrance.
    #[serde(default, skip_serializing_if = "EntranceCodes::is_empty")]
    pub data: EntranceCodes,
}

impl MatchResult {
    /// True when nothing matched.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_result_serializes_to_empty_object() {
        let json = serde_json::to_string(&MatchResult::default()).expect("serialize");
        assert_eq!(json, "{}");
    }

    #[test]
    fn entrance_order_survives_json() {
        let mut data = EntranceCodes::default();
        data.push("3", CodeEntry::new("111", "yaeda"));
        data.push("1", CodeEntry::new("222", "delivery"));
        data.push("3", CodeEntry::new("333", "oldcodes"));
        let result = MatchResult {
            address: Some("москва, улица ленина, дом 5".to_string()),
            data,
        };

        let json = serde_json::to_string(&result).expect("serialize");
        assert_eq!(
            json,
            r#"{"address":"москва, улица ленина, дом 5","data":{"3":[["111","yaeda"],["333","oldcodes"]],"1":[["222","delivery"]]}}"#
        );

        let back: MatchResult = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, result);
        assert_eq!(back.data.entrances().collect::<Vec<_>>(), vec!["3", "1"]);
    }

    #[test]
    fn get_returns_codes_in_push_order() {
        let mut data = EntranceCodes::default();
        data.push("1", CodeEntry::new("a", "yaeda"));
        data.push("1", CodeEntry::new("b", "yaeda"));
        let codes = data.get("1").expect("entrance present");
        assert_eq!(codes[0].code, "a");
        assert_eq!(codes[1].code, "b");
        assert!(data.get("2").is_none());
    }
}
