use thiserror::Error;

use crate::store::StoreError;

/// Hard failures of catalog operations.
///
/// Anything returned here means the entry mutation did not happen; the
/// store transaction was rolled back.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("entry not found: {0}")]
    NotFound(String),

    /// The requested code is already held by another entry.
    #[error("code {code} is already in use")]
    CodeInUse { code: String },

    /// Every allocation attempt collided with a concurrent writer.
    #[error("could not allocate a free code after {attempts} attempt(s)")]
    AllocationExhausted { attempts: u32 },

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl CatalogError {
    /// Whether the caller should present this as a "code in use" condition.
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            CatalogError::CodeInUse { .. } | CatalogError::AllocationExhausted { .. }
        )
    }
}
