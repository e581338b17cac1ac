//! Store wrappers for exercising failure and race handling.
//!
//! `FaultyStore` fails selected reads or writes on demand. `RacingStore`
//! commits a rival entry right after every allocator scan, so the next insert
//! loses its code the same way it would to a concurrent writer.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use catalog_codes::{
    Catalog, CatalogConfig, CatalogStore, Entry, InMemoryCatalogStore, NewEntry, Reservation,
    StoreError, Transaction,
};

/// Catalog over a fresh in-memory store, with entries created in order.
pub fn catalog_with(titles: &[&str]) -> Catalog<InMemoryCatalogStore> {
    let catalog = Catalog::new(Arc::new(InMemoryCatalogStore::new())).unwrap();
    for title in titles {
        catalog.create(NewEntry::new(*title)).unwrap();
    }
    catalog
}

/// Insert entries with fixed codes directly into the store.
pub fn seed_codes(store: &InMemoryCatalogStore, codes: &[&str]) {
    store
        .transaction(|tx| {
            for code in codes {
                tx.insert_entry(Entry::with_id(format!("seed-{}", code)).with_code(*code))?;
            }
            Ok::<_, StoreError>(())
        })
        .unwrap();
}

pub fn reservation(store: &impl CatalogStore, num: u64) -> Option<Reservation> {
    store
        .reservations()
        .unwrap()
        .into_iter()
        .find(|row| row.num == Some(num))
}

fn backend(what: &str) -> StoreError {
    StoreError::Backend(format!("{} unavailable", what))
}

#[derive(Default)]
pub struct FaultyStore {
    pub inner: InMemoryCatalogStore,
    fail_entries: AtomicBool,
    fail_reservations: AtomicBool,
}

impl FaultyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make reads of the entries table fail.
    pub fn fail_entries(&self, fail: bool) {
        self.fail_entries.store(fail, Ordering::SeqCst);
    }

    /// Make every reservation read and write fail.
    pub fn fail_reservations(&self, fail: bool) {
        self.fail_reservations.store(fail, Ordering::SeqCst);
    }

    pub fn catalog(self: &Arc<Self>) -> Catalog<FaultyStore> {
        Catalog::new(Arc::clone(self)).unwrap()
    }
}

impl CatalogStore for FaultyStore {
    fn has_reservation_table(&self) -> bool {
        self.inner.has_reservation_table()
    }

    fn entries(&self) -> Result<Vec<Entry>, StoreError> {
        if self.fail_entries.load(Ordering::SeqCst) {
            return Err(backend("entries"));
        }
        self.inner.entries()
    }

    fn reservations(&self) -> Result<Vec<Reservation>, StoreError> {
        if self.fail_reservations.load(Ordering::SeqCst) {
            return Err(backend("reservations"));
        }
        self.inner.reservations()
    }

    fn transaction<T, E, F>(&self, f: F) -> Result<T, E>
    where
        E: From<StoreError>,
        F: FnOnce(&mut dyn Transaction) -> Result<T, E>,
    {
        let fail_reservations = self.fail_reservations.load(Ordering::SeqCst);
        self.inner.transaction(|tx| {
            f(&mut FaultyTransaction {
                inner: tx,
                fail_reservations,
            })
        })
    }
}

struct FaultyTransaction<'a> {
    inner: &'a mut dyn Transaction,
    fail_reservations: bool,
}

impl FaultyTransaction<'_> {
    fn check(&self) -> Result<(), StoreError> {
        if self.fail_reservations {
            return Err(backend("reservations"));
        }
        Ok(())
    }
}

impl Transaction for FaultyTransaction<'_> {
    fn get_entry(&self, id: &str) -> Result<Option<Entry>, StoreError> {
        self.inner.get_entry(id)
    }

    fn entries(&self) -> Result<Vec<Entry>, StoreError> {
        self.inner.entries()
    }

    fn insert_entry(&mut self, entry: Entry) -> Result<(), StoreError> {
        self.inner.insert_entry(entry)
    }

    fn update_entry(&mut self, entry: Entry) -> Result<(), StoreError> {
        self.inner.update_entry(entry)
    }

    fn delete_entry(&mut self, id: &str) -> Result<bool, StoreError> {
        self.inner.delete_entry(id)
    }

    fn reservations(&self) -> Result<Vec<Reservation>, StoreError> {
        self.check()?;
        self.inner.reservations()
    }

    fn insert_reservation(
        &mut self,
        num: Option<u64>,
        owner: Option<&str>,
        label: Option<&str>,
    ) -> Result<Reservation, StoreError> {
        self.check()?;
        self.inner.insert_reservation(num, owner, label)
    }

    fn update_reservation(&mut self, reservation: &Reservation) -> Result<(), StoreError> {
        self.check()?;
        self.inner.update_reservation(reservation)
    }
}

/// Commits one queued rival entry after each read of the entries table.
#[derive(Default)]
pub struct RacingStore {
    pub inner: InMemoryCatalogStore,
    rivals: Mutex<VecDeque<String>>,
}

impl RacingStore {
    pub fn with_rivals(codes: &[&str]) -> Self {
        RacingStore {
            inner: InMemoryCatalogStore::new(),
            rivals: Mutex::new(codes.iter().map(|code| code.to_string()).collect()),
        }
    }

    pub fn pending_rivals(&self) -> usize {
        self.rivals.lock().len()
    }
}

impl CatalogStore for RacingStore {
    fn has_reservation_table(&self) -> bool {
        self.inner.has_reservation_table()
    }

    fn entries(&self) -> Result<Vec<Entry>, StoreError> {
        let snapshot = self.inner.entries()?;
        let rival = self.rivals.lock().pop_front();
        if let Some(code) = rival {
            self.inner.transaction(|tx| {
                tx.insert_entry(Entry::with_id(format!("rival-{}", code)).with_code(code))
            })?;
        }
        Ok(snapshot)
    }

    fn reservations(&self) -> Result<Vec<Reservation>, StoreError> {
        self.inner.reservations()
    }

    fn transaction<T, E, F>(&self, f: F) -> Result<T, E>
    where
        E: From<StoreError>,
        F: FnOnce(&mut dyn Transaction) -> Result<T, E>,
    {
        self.inner.transaction(f)
    }
}

pub fn racing_catalog(rivals: &[&str], config: CatalogConfig) -> (Arc<RacingStore>, Catalog<RacingStore>) {
    let store = Arc::new(RacingStore::with_rivals(rivals));
    let catalog = Catalog::with_config(Arc::clone(&store), config).unwrap();
    (store, catalog)
}
