//! Wire shape of change records and tagged attribute values.
//!
//! Attribute images use the primary store's tagged encoding: every value is
//! a single-key object naming its type, e.g. `{"S": "text"}`, `{"N": "12.5"}`,
//! `{"BOOL": true}`, `{"M": {...}}`, `{"L": [...]}`. Numbers travel as
//! strings and are parsed on access.

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;

/// Kind of mutation a change record describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EventKind {
    Insert,
    Modify,
    Remove,
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Insert => write!(f, "INSERT"),
            Self::Modify => write!(f, "MODIFY"),
            Self::Remove => write!(f, "REMOVE"),
        }
    }
}

/// Kind of entity a change record is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EntityKind {
    Book,
    Purchase,
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Book => write!(f, "BOOK"),
            Self::Purchase => write!(f, "PURCHASE"),
        }
    }
}

/// One entry of the primary store's change log.
///
/// REMOVE carries only `before`; INSERT only `after`; MODIFY carries both
/// but projections read `after`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeRecord {
    pub event_name: EventKind,
    pub entity_kind: EntityKind,
    #[serde(default)]
    pub before: Option<AttrMap>,
    #[serde(default)]
    pub after: Option<AttrMap>,
}

/// One invocation's worth of change records, in delivery order.
#[derive(Debug, Clone, Deserialize)]
pub struct ChangeBatch {
    #[serde(alias = "Records")]
    pub records: Vec<ChangeRecord>,
}

/// A tagged attribute value.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub enum AttrValue {
    #[serde(rename = "S")]
    Str(String),
    #[serde(rename = "N")]
    Num(String),
    #[serde(rename = "BOOL")]
    Bool(bool),
    #[serde(rename = "NULL")]
    Null(bool),
    #[serde(rename = "M")]
    Map(HashMap<String, AttrValue>),
    #[serde(rename = "L")]
    List(Vec<AttrValue>),
}

/// Errors raised by typed attribute access.
///
/// Absent attributes are substituted with defaults by the `*_or_*`
/// accessors; only required-but-missing identity fields and values that are
/// present with the wrong shape produce errors.
#[derive(Debug, Error)]
pub enum AttrError {
    #[error("required attribute {0:?} is missing or empty")]
    Missing(&'static str),

    #[error("attribute {field:?} is not a valid {expected}: {value:?}")]
    Invalid {
        field: &'static str,
        expected: &'static str,
        value: String,
    },
}

/// An attribute image with typed accessors.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct AttrMap(pub HashMap<String, AttrValue>);

impl AttrMap {
    /// String attribute, or `None` when absent or not a string.
    pub fn str_opt(&self, field: &str) -> Option<&str> {
        match self.0.get(field) {
            Some(AttrValue::Str(s)) => Some(s),
            _ => None,
        }
    }

    /// String attribute, empty string when absent.
    pub fn string_or_default(&self, field: &str) -> String {
        self.str_opt(field).unwrap_or_default().to_string()
    }

    /// String attribute, the given default when absent.
    pub fn string_or(&self, field: &str, default: &str) -> String {
        self.str_opt(field).unwrap_or(default).to_string()
    }

    /// Required non-empty string attribute.
    pub fn require_str(&self, field: &'static str) -> Result<String, AttrError> {
        match self.str_opt(field) {
            Some(s) if !s.is_empty() => Ok(s.to_string()),
            _ => Err(AttrError::Missing(field)),
        }
    }

    /// Decimal number attribute, zero when absent.
    pub fn decimal_or_zero(&self, field: &'static str) -> Result<Decimal, AttrError> {
        self.parse_num(field, "decimal", Decimal::ZERO)
    }

    /// Unsigned integer attribute, zero when absent.
    pub fn u32_or_zero(&self, field: &'static str) -> Result<u32, AttrError> {
        self.parse_num(field, "unsigned integer", 0)
    }

    /// Signed integer attribute, zero when absent.
    pub fn i32_or_zero(&self, field: &'static str) -> Result<i32, AttrError> {
        self.parse_num(field, "integer", 0)
    }

    /// Float attribute, zero when absent.
    pub fn f64_or_zero(&self, field: &'static str) -> Result<f64, AttrError> {
        self.parse_num(field, "number", 0.0)
    }

    /// Boolean attribute, the given default when absent or mistyped.
    pub fn bool_or(&self, field: &str, default: bool) -> bool {
        match self.0.get(field) {
            Some(AttrValue::Bool(b)) => *b,
            _ => default,
        }
    }

    /// List attribute, empty when absent or not a list.
    pub fn list(&self, field: &str) -> &[AttrValue] {
        match self.0.get(field) {
            Some(AttrValue::List(items)) => items,
            _ => &[],
        }
    }

    fn parse_num<T: std::str::FromStr>(
        &self,
        field: &'static str,
        expected: &'static str,
        default: T,
    ) -> Result<T, AttrError> {
        match self.0.get(field) {
            None | Some(AttrValue::Null(_)) => Ok(default),
            Some(AttrValue::Num(raw)) => raw.parse().map_err(|_| AttrError::Invalid {
                field,
                expected,
                value: raw.clone(),
            }),
            Some(other) => Err(AttrError::Invalid {
                field,
                expected,
                value: format!("{other:?}"),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn attrs(value: serde_json::Value) -> AttrMap {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_tagged_values_deserialize() {
        let map = attrs(json!({
            "title": {"S": "Rayuela"},
            "price": {"N": "19.99"},
            "is_active": {"BOOL": true},
            "items": {"L": [{"M": {"quantity": {"N": "2"}}}]},
        }));

        assert_eq!(map.str_opt("title"), Some("Rayuela"));
        assert_eq!(map.decimal_or_zero("price").unwrap(), dec!(19.99));
        assert!(map.bool_or("is_active", false));
        assert_eq!(map.list("items").len(), 1);
    }

    #[test]
    fn test_missing_fields_fall_back_to_defaults() {
        let map = attrs(json!({}));

        assert_eq!(map.string_or_default("title"), "");
        assert_eq!(map.string_or("language", "es"), "es");
        assert_eq!(map.u32_or_zero("stock_quantity").unwrap(), 0);
        assert_eq!(map.decimal_or_zero("price").unwrap(), Decimal::ZERO);
        assert!(map.bool_or("is_active", true));
        assert!(map.list("items").is_empty());
    }

    #[test]
    fn test_require_str_rejects_missing_and_empty() {
        let map = attrs(json!({"book_id": {"S": ""}}));

        assert!(matches!(
            map.require_str("book_id"),
            Err(AttrError::Missing("book_id"))
        ));
        assert!(matches!(
            map.require_str("tenant_id"),
            Err(AttrError::Missing("tenant_id"))
        ));
    }

    #[test]
    fn test_malformed_number_is_an_error_not_a_default() {
        let map = attrs(json!({"price": {"N": "not-a-number"}}));

        assert!(matches!(
            map.decimal_or_zero("price"),
            Err(AttrError::Invalid { field: "price", .. })
        ));
    }

    #[test]
    fn test_wrong_type_is_an_error() {
        let map = attrs(json!({"pages": {"S": "300"}}));

        assert!(matches!(
            map.u32_or_zero("pages"),
            Err(AttrError::Invalid { field: "pages", .. })
        ));
    }

    #[test]
    fn test_batch_accepts_records_alias() {
        let batch: ChangeBatch = serde_json::from_value(json!({
            "Records": [{
                "eventName": "INSERT",
                "entityKind": "BOOK",
                "after": {"book_id": {"S": "b-1"}},
            }]
        }))
        .unwrap();

        assert_eq!(batch.records.len(), 1);
        assert_eq!(batch.records[0].event_name, EventKind::Insert);
        assert_eq!(batch.records[0].entity_kind, EntityKind::Book);
        assert!(batch.records[0].before.is_none());
    }
}
