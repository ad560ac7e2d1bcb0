//! Query Module
//!
//! Attribute equality queries over a full scan of the item store.

use tracing::info;

use crate::error::Result;
use crate::store::{Item, ItemStore};

/// Item attribute a query can filter on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemAttribute {
    Id,
    Name,
    Price,
    Available,
}

impl std::fmt::Display for ItemAttribute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ItemAttribute::Id => "id",
            ItemAttribute::Name => "name",
            ItemAttribute::Price => "price",
            ItemAttribute::Available => "available",
        };
        f.write_str(name)
    }
}

/// A value an attribute is compared against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Number(u64),
    Text(String),
    Flag(bool),
}

impl FieldValue {
    /// Equality, ignoring case when both sides are text.
    pub fn matches(&self, other: &FieldValue) -> bool {
        match (self, other) {
            (FieldValue::Text(a), FieldValue::Text(b)) => a.to_lowercase() == b.to_lowercase(),
            (a, b) => a == b,
        }
    }
}

impl std::fmt::Display for FieldValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldValue::Number(n) => write!(f, "{}", n),
            FieldValue::Text(s) => f.write_str(s),
            FieldValue::Flag(b) => write!(f, "{}", b),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Flag(value)
    }
}

impl From<u64> for FieldValue {
    fn from(value: u64) -> Self {
        FieldValue::Number(value)
    }
}

impl Item {
    /// Reads one attribute as a comparable value.
    pub fn field(&self, attribute: ItemAttribute) -> FieldValue {
        match attribute {
            ItemAttribute::Id => FieldValue::Number(self.id),
            ItemAttribute::Name => FieldValue::Text(self.name.clone()),
            ItemAttribute::Price => FieldValue::Text(self.price.clone()),
            ItemAttribute::Available => FieldValue::Flag(self.available),
        }
    }
}

impl ItemStore {
    // == Find By ==
    /// Returns every item whose `attribute` equals `value`.
    ///
    /// Scans the whole keyspace; text comparison is case-insensitive and
    /// results come back in backend iteration order.
    pub async fn find_by(
        &self,
        attribute: ItemAttribute,
        value: impl Into<FieldValue>,
    ) -> Result<Vec<Item>> {
        let wanted = value.into();
        info!("Processing {} query for {}", attribute, wanted);

        self.scan(move |item| item.field(attribute).matches(&wanted))
            .await
    }

    pub async fn find_by_name(&self, name: &str) -> Result<Vec<Item>> {
        self.find_by(ItemAttribute::Name, name).await
    }

    pub async fn find_by_price(&self, price: &str) -> Result<Vec<Item>> {
        self.find_by(ItemAttribute::Price, price).await
    }

    pub async fn find_by_availability(&self, available: bool) -> Result<Vec<Item>> {
        self.find_by(ItemAttribute::Available, available).await
    }
}
