//! Storage collaborator for catalog entries and the reservation ledger.
//!
//! The store is treated as an opaque transactional backend. The crate only
//! relies on whole-table reads, closure-scoped transactions, and a uniqueness
//! constraint on non-null entry codes.
//!
//! ## Example
//!
//! ```ignore
//! use catalog_codes::{CatalogStore, Entry, InMemoryCatalogStore, StoreError};
//!
//! let store = InMemoryCatalogStore::new();
//! store.transaction(|tx| tx.insert_entry(Entry::with_id("e1").with_code("PRD0001")))?;
//! assert_eq!(store.entries()?.len(), 1);
//! ```

mod error;
mod in_memory;
mod model;
mod store;

pub use error::StoreError;
pub use in_memory::InMemoryCatalogStore;
pub use model::{Entry, Reservation};
pub use store::{CatalogStore, Transaction};

pub const ENTRIES_TABLE: &str = "entries";
pub const RESERVATIONS_TABLE: &str = "reservations";

/// Uniqueness constraint on non-null `entries.code`.
pub const ENTRY_CODE_CONSTRAINT: &str = "entries.code";
/// Uniqueness constraint on non-null `reservations.num`.
pub const RESERVATION_NUM_CONSTRAINT: &str = "reservations.num";
