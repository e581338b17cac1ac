mod allocator;
mod catalog;
mod code;
mod config;
mod error;
mod ledger;
mod price;
mod store;

pub use allocator::{candidate, smallest_missing, CodeAllocator, UsedSetCollector};
pub use catalog::{Catalog, Committed, EntryPatch, NewEntry, SearchQuery, DEFAULT_QUANTITY};
pub use code::{CodeFormat, DEFAULT_PREFIX, DEFAULT_WIDTH};
pub use config::{CatalogConfig, DEFAULT_MAX_ATTEMPTS};
pub use error::CatalogError;
pub use ledger::{LedgerOutcome, MappingLedger};
pub use price::{normalize, normalize_str, Normalize};
pub use store::{
    CatalogStore, Entry, InMemoryCatalogStore, Reservation, StoreError, Transaction,
    ENTRIES_TABLE, ENTRY_CODE_CONSTRAINT, RESERVATIONS_TABLE, RESERVATION_NUM_CONSTRAINT,
};

// Re-export serde_json so callers can build raw price values without a direct dependency
pub use serde_json::{json, Value};
