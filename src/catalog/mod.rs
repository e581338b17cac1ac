//! Catalog entry lifecycle: create, update, delete, lookup and search, with
//! code allocation on create and ledger bookkeeping after every commit.
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use catalog_codes::{Catalog, InMemoryCatalogStore, NewEntry};
//!
//! let catalog = Catalog::new(Arc::new(InMemoryCatalogStore::new()))?;
//! let lamp = catalog.create(NewEntry::new("Desk Lamp").with_price("€ 49,90"))?;
//! assert_eq!(lamp.value.code.as_deref(), Some("PRD0001"));
//! assert_eq!(lamp.value.price, 49.9);
//! ```

mod entry;
mod service;

pub use entry::{Committed, EntryPatch, NewEntry, SearchQuery, DEFAULT_QUANTITY};
pub use service::Catalog;
