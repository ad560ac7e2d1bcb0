//! Request DTOs for the item store API
//!
//! Defines the structure of incoming query strings and form bodies.

use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::{Result, StoreError};
use crate::store::{FieldValue, ItemAttribute};

/// Query string for GET /items
///
/// At most one filter applies: `price` wins over `name`, `name` over `available`.
/// Empty values count as absent.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ItemQuery {
    #[serde(default)]
    pub price: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub available: Option<String>,
}

impl ItemQuery {
    /// Picks the filter to run, or `None` to list everything.
    pub fn criterion(&self) -> Result<Option<(ItemAttribute, FieldValue)>> {
        if let Some(price) = non_empty(&self.price) {
            return Ok(Some((ItemAttribute::Price, price.into())));
        }
        if let Some(name) = non_empty(&self.name) {
            return Ok(Some((ItemAttribute::Name, name.into())));
        }
        if let Some(available) = non_empty(&self.available) {
            let flag = match available.to_ascii_lowercase().as_str() {
                "true" => true,
                "false" => false,
                _ => {
                    return Err(StoreError::BadRequest(format!(
                        "available must be true or false, got '{}'",
                        available
                    )))
                }
            };
            return Ok(Some((ItemAttribute::Available, flag.into())));
        }
        Ok(None)
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

/// Form body for POST /items from an HTML form.
///
/// Form submissions always create available items.
#[derive(Debug, Clone, Deserialize)]
pub struct ItemForm {
    pub name: String,
    pub price: String,
}

impl ItemForm {
    /// Converts the form into the JSON payload shape items are validated against.
    pub fn into_payload(self) -> Value {
        json!({
            "name": self.name,
            "price": self.price,
            "available": true,
        })
    }
}
