//! Item Model Module
//!
//! The item record, its storage encoding and schema validation of untyped payloads.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Result, StoreError};

// == Schema ==
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FieldType {
    Integer,
    String,
    Boolean,
}

impl FieldType {
    fn accepts(self, value: &Value) -> bool {
        match self {
            FieldType::Integer => value.is_i64() || value.is_u64(),
            FieldType::String => value.is_string(),
            FieldType::Boolean => value.is_boolean(),
        }
    }

    fn name(self) -> &'static str {
        match self {
            FieldType::Integer => "integer",
            FieldType::String => "string",
            FieldType::Boolean => "boolean",
        }
    }
}

/// (field, type, required)
const SCHEMA: [(&str, FieldType, bool); 4] = [
    ("id", FieldType::Integer, false),
    ("name", FieldType::String, true),
    ("price", FieldType::String, true),
    ("available", FieldType::Boolean, true),
];

/// Checks an object against the item schema, collecting every violation.
fn schema_errors(object: &Map<String, Value>) -> BTreeMap<String, String> {
    let mut errors = BTreeMap::new();

    for (field, kind, required) in SCHEMA {
        match object.get(field) {
            None if required => {
                errors.insert(field.to_string(), "required field".to_string());
            }
            None => {}
            Some(Value::Null) => {
                errors.insert(field.to_string(), "null value not allowed".to_string());
            }
            Some(value) if !kind.accepts(value) => {
                errors.insert(field.to_string(), format!("must be of {} type", kind.name()));
            }
            Some(_) => {}
        }
    }

    for key in object.keys() {
        if !SCHEMA.iter().any(|(field, _, _)| *field == key.as_str()) {
            errors.insert(key.clone(), "unknown field".to_string());
        }
    }

    errors
}

fn format_errors(errors: &BTreeMap<String, String>) -> String {
    let parts: Vec<String> = errors
        .iter()
        .map(|(field, reason)| format!("{}: {}", field, reason))
        .collect();
    format!("Invalid item data: {{{}}}", parts.join(", "))
}

// == Item ==
/// A sellable item.
///
/// An item with `id == 0` has never been saved; the store assigns the real id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: u64,
    pub name: String,
    pub price: String,
    pub available: bool,
}

impl Default for Item {
    fn default() -> Self {
        Self {
            id: 0,
            name: String::new(),
            price: String::new(),
            available: true,
        }
    }
}

impl Item {
    // == Constructor ==
    /// Creates an unsaved, available item.
    pub fn new(name: impl Into<String>, price: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            price: price.into(),
            ..Self::default()
        }
    }

    /// Sets availability, builder style.
    pub fn with_availability(mut self, available: bool) -> Self {
        self.available = available;
        self
    }

    // == Apply Payload ==
    /// Validates an untyped payload and copies `name`, `price` and `available` onto the item.
    ///
    /// The item's `id` is left untouched even if the payload carries one.
    pub fn apply_payload(&mut self, data: Option<&Value>) -> Result<&mut Self> {
        let object = match data {
            Some(Value::Object(object)) => object,
            Some(other) => {
                return Err(StoreError::Validation(format!(
                    "Invalid item data: expected an object, got {}",
                    json_kind(other)
                )))
            }
            None => {
                return Err(StoreError::Validation(
                    "Invalid item data: body is missing".to_string(),
                ))
            }
        };

        let errors = schema_errors(object);
        if !errors.is_empty() {
            return Err(StoreError::Validation(format_errors(&errors)));
        }

        // Types were checked above.
        self.name = object["name"].as_str().unwrap_or_default().to_string();
        self.price = object["price"].as_str().unwrap_or_default().to_string();
        self.available = object["available"].as_bool().unwrap_or(true);
        Ok(self)
    }

    // == Storage Encoding ==
    pub(crate) fn to_record(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self).map_err(|e| StoreError::Backend(e.to_string()))
    }

    pub(crate) fn from_record(key: &str, raw: &[u8]) -> Result<Self> {
        serde_json::from_slice(raw).map_err(|e| StoreError::Corrupt {
            key: key.to_string(),
            reason: e.to_string(),
        })
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_create_an_item() {
        let item = Item::new("fido", "dog").with_availability(false);
        assert_eq!(item.id, 0);
        assert_eq!(item.name, "fido");
        assert_eq!(item.price, "dog");
        assert!(!item.available);
    }

    #[test]
    fn test_new_item_is_available() {
        assert!(Item::new("fido", "dog").available);
    }

    #[test]
    fn test_serialize_an_item() {
        let value = serde_json::to_value(Item::new("fido", "dog")).unwrap();
        assert_eq!(value["id"], 0);
        assert_eq!(value["name"], "fido");
        assert_eq!(value["price"], "dog");
        assert_eq!(value["available"], true);
    }

    #[test]
    fn test_apply_payload_to_an_item() {
        let data = json!({"id": 1, "name": "kitty", "price": "cat", "available": true});
        let mut item = Item {
            id: 1,
            ..Item::default()
        };
        item.apply_payload(Some(&data)).unwrap();
        assert_eq!(item.id, 1);
        assert_eq!(item.name, "kitty");
        assert_eq!(item.price, "cat");
        assert!(item.available);
    }

    #[test]
    fn test_apply_payload_keeps_existing_id() {
        let data = json!({"id": 99, "name": "kitty", "price": "cat", "available": false});
        let mut item = Item {
            id: 3,
            ..Item::default()
        };
        item.apply_payload(Some(&data)).unwrap();
        assert_eq!(item.id, 3);
        assert!(!item.available);
    }

    #[test]
    fn test_apply_payload_with_no_name() {
        let data = json!({"id": 0, "price": "cat"});
        let err = Item::default().apply_payload(Some(&data)).unwrap_err();
        let message = err.to_string();
        assert!(matches!(err, StoreError::Validation(_)));
        assert!(message.contains("name: required field"));
        assert!(message.contains("available: required field"));
    }

    #[test]
    fn test_apply_payload_with_no_data() {
        let mut item = Item::default();
        let result = item.apply_payload(None);
        assert!(matches!(result, Err(StoreError::Validation(_))));
    }

    #[test]
    fn test_apply_payload_with_bad_data() {
        let data = json!("string data");
        let mut item = Item::default();
        let result = item.apply_payload(Some(&data));
        assert!(matches!(result, Err(StoreError::Validation(_))));
    }

    #[test]
    fn test_apply_payload_with_wrong_types() {
        let data = json!({"name": 5, "price": "cat", "available": "yes"});
        let message = Item::default()
            .apply_payload(Some(&data))
            .unwrap_err()
            .to_string();
        assert!(message.contains("name: must be of string type"));
        assert!(message.contains("available: must be of boolean type"));
    }

    #[test]
    fn test_apply_payload_rejects_unknown_fields() {
        let data = json!({"name": "kitty", "price": "cat", "available": true, "color": "grey"});
        let message = Item::default()
            .apply_payload(Some(&data))
            .unwrap_err()
            .to_string();
        assert!(message.contains("color: unknown field"));
    }

    #[test]
    fn test_record_encoding() {
        let item = Item {
            id: 4,
            ..Item::new("fido", "dog")
        };
        let raw = item.to_record().unwrap();
        assert_eq!(Item::from_record("4", &raw).unwrap(), item);
        assert!(matches!(
            Item::from_record("4", b"\x80garbage"),
            Err(StoreError::Corrupt { .. })
        ));
    }
}
