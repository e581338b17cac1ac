use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::ledger::LedgerOutcome;
use crate::price::Normalize;
use crate::store::Entry;

pub const DEFAULT_QUANTITY: i64 = 10;

/// Input for creating a catalog entry.
///
/// `price` is taken as raw JSON and normalized on the way in; anything that
/// does not normalize is stored as 0.0. `code`, if given, is requested and
/// honored only when its number is free.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewEntry {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub price: Value,
    #[serde(default)]
    pub quantity: Option<i64>,
    #[serde(default)]
    pub tags: String,
}

impl NewEntry {
    pub fn new(title: impl Into<String>) -> Self {
        NewEntry {
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn with_brand(mut self, brand: impl Into<String>) -> Self {
        self.brand = Some(brand.into());
        self
    }

    pub fn with_price(mut self, price: impl Into<Value>) -> Self {
        self.price = price.into();
        self
    }

    pub fn with_quantity(mut self, quantity: i64) -> Self {
        self.quantity = Some(quantity);
        self
    }

    pub fn with_tags(mut self, tags: impl Into<String>) -> Self {
        self.tags = tags.into();
        self
    }

    /// Build the entry to persist under `id`, without a code.
    pub(crate) fn to_entry(&self, id: String) -> Entry {
        Entry {
            id,
            code: None,
            title: self.title.clone(),
            brand: self.brand.clone(),
            description: self.description.clone(),
            price: self.price.normalize().unwrap_or(0.0),
            quantity: self.quantity.unwrap_or(DEFAULT_QUANTITY),
            tags: self.tags.clone(),
        }
    }
}

/// Partial update of a catalog entry. Absent fields are left alone.
///
/// `price` and `code` distinguish "absent" from an explicit `null`:
/// `Some(Value::Null)` resets the price to 0.0 and `Some(None)` clears the
/// code. A price that does not normalize leaves the stored price unchanged,
/// except an explicit empty string, which also resets it to 0.0.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EntryPatch {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub price: Option<Value>,
    #[serde(default)]
    pub quantity: Option<i64>,
    #[serde(default)]
    pub tags: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub code: Option<Option<String>>,
}

fn present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

impl EntryPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_price(mut self, price: impl Into<Value>) -> Self {
        self.price = Some(price.into());
        self
    }

    pub fn with_quantity(mut self, quantity: i64) -> Self {
        self.quantity = Some(quantity);
        self
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(Some(code.into()));
        self
    }

    pub fn clear_code(mut self) -> Self {
        self.code = Some(None);
        self
    }

    /// Apply every field except `code` to `entry`.
    pub(crate) fn apply_fields(&self, entry: &mut Entry) {
        if let Some(title) = &self.title {
            entry.title = title.clone();
        }
        if let Some(brand) = &self.brand {
            entry.brand = Some(brand.clone());
        }
        if let Some(description) = &self.description {
            entry.description = description.clone();
        }
        if let Some(raw) = &self.price {
            match raw.normalize() {
                Some(price) => entry.price = price,
                None if raw.is_null() || raw.as_str() == Some("") => entry.price = 0.0,
                None => {}
            }
        }
        if let Some(quantity) = self.quantity {
            entry.quantity = quantity;
        }
        if let Some(tags) = &self.tags {
            entry.tags = tags.clone();
        }
    }
}

/// Search over title, brand, code and tags.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub limit: Option<usize>,
}

impl SearchQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub(crate) fn matches(&self, entry: &Entry) -> bool {
        let Some(text) = self.text.as_deref().map(str::trim).filter(|t| !t.is_empty()) else {
            return true;
        };
        let needle = text.to_lowercase();
        let hit = |field: &str| field.to_lowercase().contains(&needle);

        hit(&entry.title)
            || entry.brand.as_deref().is_some_and(hit)
            || entry.code.as_deref().is_some_and(hit)
            || hit(&entry.tags)
    }
}

/// A committed entry mutation together with what the ledger did about it.
#[derive(Debug, Clone)]
pub struct Committed<T> {
    pub value: T,
    pub ledger: Vec<LedgerOutcome>,
}
