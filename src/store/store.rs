//! CatalogStore - the transactional storage collaborator.

use super::{Entry, Reservation, StoreError};

/// Operations available inside a store transaction.
///
/// Everything written through a `Transaction` becomes visible atomically when
/// the enclosing [`CatalogStore::transaction`] closure returns `Ok`, and is
/// discarded otherwise.
pub trait Transaction {
    /// Get an entry by primary id.
    fn get_entry(&self, id: &str) -> Result<Option<Entry>, StoreError>;

    /// All entries, as seen by this transaction.
    fn entries(&self) -> Result<Vec<Entry>, StoreError>;

    /// Insert a new entry. Fails with `DuplicateKey` on an existing id and
    /// with `UniqueViolation` when another entry already holds its code.
    fn insert_entry(&mut self, entry: Entry) -> Result<(), StoreError>;

    /// Replace an existing entry. Same code uniqueness rule as insert.
    fn update_entry(&mut self, entry: Entry) -> Result<(), StoreError>;

    /// Delete an entry by id. Returns true if it existed.
    fn delete_entry(&mut self, id: &str) -> Result<bool, StoreError>;

    /// All reservation rows, as seen by this transaction.
    fn reservations(&self) -> Result<Vec<Reservation>, StoreError>;

    /// Insert a reservation row; the store assigns its id.
    /// Fails with `UniqueViolation` when `num` is already reserved.
    fn insert_reservation(
        &mut self,
        num: Option<u64>,
        owner: Option<&str>,
        label: Option<&str>,
    ) -> Result<Reservation, StoreError>;

    /// Replace an existing reservation row (matched by id).
    fn update_reservation(&mut self, reservation: &Reservation) -> Result<(), StoreError>;
}

/// The storage collaborator consumed by the allocator, ledger and catalog.
///
/// Implementations must enforce uniqueness of non-null entry codes; that
/// constraint is what ultimately keeps two entries from sharing a code.
pub trait CatalogStore: Send + Sync {
    /// Whether the reservation table exists. Resolved once by consumers.
    fn has_reservation_table(&self) -> bool;

    /// Read every entry outside of any transaction.
    fn entries(&self) -> Result<Vec<Entry>, StoreError>;

    /// Read every reservation row outside of any transaction.
    /// Returns `MissingTable` when the table is absent.
    fn reservations(&self) -> Result<Vec<Reservation>, StoreError>;

    /// Run `f` inside a transaction. Commits when `f` returns `Ok`. On `Err`,
    /// or if `f` panics, nothing `f` wrote becomes visible and the store stays
    /// usable.
    fn transaction<T, E, F>(&self, f: F) -> Result<T, E>
    where
        E: From<StoreError>,
        F: FnOnce(&mut dyn Transaction) -> Result<T, E>;
}
