use serde::{Deserialize, Serialize};

/// A catalog entry as persisted in the entries table.
///
/// `code` is the authoritative human-facing identifier; the store keeps it
/// unique across entries whenever it is set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    pub id: String,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub quantity: i64,
    #[serde(default)]
    pub tags: String,
}

impl Entry {
    /// A bare entry with the given id and no code.
    pub fn with_id(id: impl Into<String>) -> Self {
        Entry {
            id: id.into(),
            code: None,
            title: String::new(),
            brand: None,
            description: String::new(),
            price: 0.0,
            quantity: 0,
            tags: String::new(),
        }
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }
}

/// A row of the secondary reservation ledger.
///
/// `num` is unique when set. `owner == None` means the number is free: it was
/// claimed once and released, or seeded without an assignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reservation {
    pub id: u64,
    pub num: Option<u64>,
    pub owner: Option<String>,
    pub label: Option<String>,
}

impl Reservation {
    pub fn is_free(&self) -> bool {
        self.owner.is_none()
    }

    pub fn is_owned_by(&self, owner: &str) -> bool {
        self.owner.as_deref() == Some(owner)
    }
}
