use thiserror::Error;

/// Errors reported by a [`CatalogStore`](super::CatalogStore) backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The requested table does not exist in this store.
    #[error("table {0} does not exist")]
    MissingTable(&'static str),

    /// A write would break a uniqueness constraint (entry code, reservation number).
    #[error("unique constraint {constraint} violated by {value}")]
    UniqueViolation {
        constraint: &'static str,
        value: String,
    },

    /// A row with the same primary key already exists.
    #[error("duplicate key {key} in {table}")]
    DuplicateKey { table: &'static str, key: String },

    /// The row addressed by an update was not found.
    #[error("row {key} not found in {table}")]
    NotFound { table: &'static str, key: String },

    /// Any other backend failure (connection loss, timeout, driver error).
    #[error("storage backend error: {0}")]
    Backend(String),
}

impl StoreError {
    /// Whether this error is the entry-code uniqueness constraint firing.
    pub fn is_code_conflict(&self) -> bool {
        matches!(
            self,
            StoreError::UniqueViolation {
                constraint: super::ENTRY_CODE_CONSTRAINT,
                ..
            }
        )
    }
}
