//! InMemoryCatalogStore - HashMap-style catalog store for testing and development.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::RwLock;

use super::{
    CatalogStore, Entry, Reservation, StoreError, Transaction, ENTRIES_TABLE,
    ENTRY_CODE_CONSTRAINT, RESERVATIONS_TABLE, RESERVATION_NUM_CONSTRAINT,
};

#[derive(Debug, Clone, Default)]
struct Tables {
    entries: BTreeMap<String, Entry>,
    /// `None` when the store was created without a reservation table.
    reservations: Option<Vec<Reservation>>,
    next_reservation_id: u64,
}

impl Tables {
    fn reservations(&self) -> Result<&Vec<Reservation>, StoreError> {
        self.reservations
            .as_ref()
            .ok_or(StoreError::MissingTable(RESERVATIONS_TABLE))
    }

    fn reservations_mut(&mut self) -> Result<&mut Vec<Reservation>, StoreError> {
        self.reservations
            .as_mut()
            .ok_or(StoreError::MissingTable(RESERVATIONS_TABLE))
    }

    fn check_code_unique(&self, entry: &Entry) -> Result<(), StoreError> {
        let Some(code) = entry.code.as_deref() else {
            return Ok(());
        };
        let taken = self
            .entries
            .values()
            .any(|other| other.id != entry.id && other.code.as_deref() == Some(code));
        if taken {
            return Err(StoreError::UniqueViolation {
                constraint: ENTRY_CODE_CONSTRAINT,
                value: code.to_string(),
            });
        }
        Ok(())
    }
}

/// In-memory catalog store.
///
/// Transactions take the write lock, stage their writes on a copy of the
/// tables and swap it in on success, so they are fully serialized and a
/// failed or panicking closure leaves no trace. Clone-friendly via Arc.
#[derive(Clone)]
pub struct InMemoryCatalogStore {
    tables: Arc<RwLock<Tables>>,
}

impl Default for InMemoryCatalogStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryCatalogStore {
    /// Create an empty store with both the entries and reservations tables.
    pub fn new() -> Self {
        Self {
            tables: Arc::new(RwLock::new(Tables {
                entries: BTreeMap::new(),
                reservations: Some(Vec::new()),
                next_reservation_id: 1,
            })),
        }
    }

    /// Create an empty store that has no reservation table at all.
    pub fn without_reservations() -> Self {
        Self {
            tables: Arc::new(RwLock::new(Tables {
                next_reservation_id: 1,
                ..Tables::default()
            })),
        }
    }
}

impl CatalogStore for InMemoryCatalogStore {
    fn has_reservation_table(&self) -> bool {
        self.tables.read().reservations.is_some()
    }

    fn entries(&self) -> Result<Vec<Entry>, StoreError> {
        Ok(self.tables.read().entries.values().cloned().collect())
    }

    fn reservations(&self) -> Result<Vec<Reservation>, StoreError> {
        Ok(self.tables.read().reservations()?.clone())
    }

    fn transaction<T, E, F>(&self, f: F) -> Result<T, E>
    where
        E: From<StoreError>,
        F: FnOnce(&mut dyn Transaction) -> Result<T, E>,
    {
        let mut tables = self.tables.write();

        let mut staged = tables.clone();
        let value = f(&mut InMemoryTransaction {
            tables: &mut staged,
        })?;
        *tables = staged;

        Ok(value)
    }
}

/// Staged view handed to transaction closures.
struct InMemoryTransaction<'a> {
    tables: &'a mut Tables,
}

impl Transaction for InMemoryTransaction<'_> {
    fn get_entry(&self, id: &str) -> Result<Option<Entry>, StoreError> {
        Ok(self.tables.entries.get(id).cloned())
    }

    fn entries(&self) -> Result<Vec<Entry>, StoreError> {
        Ok(self.tables.entries.values().cloned().collect())
    }

    fn insert_entry(&mut self, entry: Entry) -> Result<(), StoreError> {
        if self.tables.entries.contains_key(&entry.id) {
            return Err(StoreError::DuplicateKey {
                table: ENTRIES_TABLE,
                key: entry.id,
            });
        }
        self.tables.check_code_unique(&entry)?;
        self.tables.entries.insert(entry.id.clone(), entry);
        Ok(())
    }

    fn update_entry(&mut self, entry: Entry) -> Result<(), StoreError> {
        if !self.tables.entries.contains_key(&entry.id) {
            return Err(StoreError::NotFound {
                table: ENTRIES_TABLE,
                key: entry.id,
            });
        }
        self.tables.check_code_unique(&entry)?;
        self.tables.entries.insert(entry.id.clone(), entry);
        Ok(())
    }

    fn delete_entry(&mut self, id: &str) -> Result<bool, StoreError> {
        Ok(self.tables.entries.remove(id).is_some())
    }

    fn reservations(&self) -> Result<Vec<Reservation>, StoreError> {
        Ok(self.tables.reservations()?.clone())
    }

    fn insert_reservation(
        &mut self,
        num: Option<u64>,
        owner: Option<&str>,
        label: Option<&str>,
    ) -> Result<Reservation, StoreError> {
        let id = self.tables.next_reservation_id;
        let rows = self.tables.reservations_mut()?;

        if let Some(n) = num {
            if rows.iter().any(|row| row.num == Some(n)) {
                return Err(StoreError::UniqueViolation {
                    constraint: RESERVATION_NUM_CONSTRAINT,
                    value: n.to_string(),
                });
            }
        }

        let row = Reservation {
            id,
            num,
            owner: owner.map(str::to_string),
            label: label.map(str::to_string),
        };
        rows.push(row.clone());
        self.tables.next_reservation_id += 1;

        Ok(row)
    }

    fn update_reservation(&mut self, reservation: &Reservation) -> Result<(), StoreError> {
        let rows = self.tables.reservations_mut()?;

        if let Some(n) = reservation.num {
            let clash = rows
                .iter()
                .any(|row| row.id != reservation.id && row.num == Some(n));
            if clash {
                return Err(StoreError::UniqueViolation {
                    constraint: RESERVATION_NUM_CONSTRAINT,
                    value: n.to_string(),
                });
            }
        }

        let row = rows
            .iter_mut()
            .find(|row| row.id == reservation.id)
            .ok_or_else(|| StoreError::NotFound {
                table: RESERVATIONS_TABLE,
                key: reservation.id.to_string(),
            })?;
        *row = reservation.clone();

        Ok(())
    }
}
