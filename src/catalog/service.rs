use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, error, info, warn};

use crate::allocator::CodeAllocator;
use crate::code::CodeFormat;
use crate::config::CatalogConfig;
use crate::error::CatalogError;
use crate::ledger::{LedgerOutcome, MappingLedger};
use crate::price::Normalize;
use crate::store::{CatalogStore, Entry, StoreError};

use super::{Committed, EntryPatch, NewEntry, SearchQuery};

/// Catalog entry lifecycle on top of a [`CatalogStore`].
///
/// Entry writes are authoritative and fail hard with [`CatalogError`].
/// Ledger bookkeeping runs after the write has committed and only ever
/// reports a [`LedgerOutcome`].
pub struct Catalog<S> {
    store: Arc<S>,
    config: CatalogConfig,
    allocator: CodeAllocator,
    ledger: MappingLedger,
    allocation: Mutex<()>,
}

impl<S: CatalogStore> Catalog<S> {
    /// Create a catalog with the default configuration.
    pub fn new(store: Arc<S>) -> Result<Self, CatalogError> {
        Self::with_config(store, CatalogConfig::default())
    }

    /// Create a catalog. Whether the store has a reservation table is
    /// checked once here and fixed for the catalog's lifetime.
    pub fn with_config(store: Arc<S>, config: CatalogConfig) -> Result<Self, CatalogError> {
        config.validate()?;

        let codec = config.codec();
        let reservations = store.has_reservation_table();
        if !reservations {
            info!("reservation table not present, ledger disabled");
        }

        Ok(Catalog {
            allocator: CodeAllocator::new(codec.clone(), reservations),
            ledger: MappingLedger::new(codec, reservations),
            store,
            config,
            allocation: Mutex::new(()),
        })
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn config(&self) -> &CatalogConfig {
        &self.config
    }

    pub fn codec(&self) -> &CodeFormat {
        self.allocator.codec()
    }

    pub fn ledger_enabled(&self) -> bool {
        self.ledger.is_enabled()
    }

    /// Compute the code a new entry would get right now.
    pub fn allocate_code(&self, requested: Option<&str>) -> Result<String, CatalogError> {
        Ok(self.allocator.allocate(self.store.as_ref(), requested)?)
    }

    pub fn claim(&self, owner: &str, code: &str, label: Option<&str>) -> LedgerOutcome {
        self.ledger.claim(self.store.as_ref(), owner, code, label)
    }

    pub fn free(&self, owner: Option<&str>, code: Option<&str>) -> LedgerOutcome {
        self.ledger.free(self.store.as_ref(), owner, code)
    }

    /// Release only what `owner` holds for `code`.
    pub fn release(&self, owner: &str, code: &str) -> LedgerOutcome {
        self.ledger.release(self.store.as_ref(), owner, code)
    }

    pub fn normalize_price<T: Normalize + ?Sized>(&self, raw: &T) -> Option<f64> {
        raw.normalize()
    }

    /// Create an entry with a freshly allocated code, then claim the code in
    /// the ledger.
    pub fn create(&self, new: NewEntry) -> Result<Committed<Entry>, CatalogError> {
        let id = new
            .id
            .clone()
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        let entry = self.insert_with_code(new.to_entry(id), new.code.as_deref())?;

        let code = entry.code.as_deref().unwrap_or_default();
        let claim = self.claim(&entry.id, code, label(&entry));
        info!(id = %entry.id, code, "created catalog entry");

        Ok(Committed {
            value: entry,
            ledger: vec![claim],
        })
    }

    /// Allocate and insert, recomputing the code whenever the insert loses
    /// the code to a concurrent writer.
    fn insert_with_code(
        &self,
        mut entry: Entry,
        requested: Option<&str>,
    ) -> Result<Entry, CatalogError> {
        let _guard = self
            .config
            .serialize_allocations
            .then(|| self.allocation.lock());

        let attempts = self.config.max_attempts;
        for attempt in 1..=attempts {
            let code = self.allocate_code(requested)?;
            entry.code = Some(code.clone());

            match self.store.transaction(|tx| tx.insert_entry(entry.clone())) {
                Ok(()) => return Ok(entry),
                Err(err) if err.is_code_conflict() => {
                    warn!(attempt, code = %code, "code taken by a concurrent insert, retrying");
                }
                Err(err) => return Err(err.into()),
            }
        }

        error!(attempts, id = %entry.id, "could not allocate a free code");
        Err(CatalogError::AllocationExhausted { attempts })
    }

    /// Update the entry addressed by id or code.
    ///
    /// A code change is checked against every other entry and fails with
    /// `CodeInUse` when the number is taken. After commit the new code is
    /// claimed and the old one freed.
    pub fn update(&self, key: &str, patch: EntryPatch) -> Result<Committed<Entry>, CatalogError> {
        let codec = self.codec();

        let (entry, previous) = self.store.transaction(|tx| {
            let entries = tx.entries()?;
            let mut entry = locate(&entries, codec, key)
                .cloned()
                .ok_or_else(|| CatalogError::NotFound(key.to_string()))?;
            let previous = entry.code.clone();

            patch.apply_fields(&mut entry);

            if let Some(requested) = &patch.code {
                entry.code = requested.as_deref().and_then(|code| codec.canonicalize(code));
                if let Some(code) = entry.code.as_deref() {
                    if code_taken(&entries, codec, code, &entry.id) {
                        return Err(CatalogError::CodeInUse {
                            code: code.to_string(),
                        });
                    }
                }
            }

            tx.update_entry(entry.clone())
                .map_err(|err| code_in_use(err, entry.code.as_deref()))?;
            Ok::<_, CatalogError>((entry, previous))
        })?;

        let mut ledger = Vec::new();
        if entry.code != previous {
            debug!(id = %entry.id, from = ?previous, to = ?entry.code, "entry code changed");
            if let Some(code) = entry.code.as_deref() {
                ledger.push(self.claim(&entry.id, code, label(&entry)));
            }
            // A claim for a new non-numeric code relabels the owner's
            // label-only row, so that row must not be released afterwards.
            if let Some(old) = previous.as_deref() {
                let number = |code: &str| codec.parse(code).filter(|n| *n > 0);
                let same_row = entry
                    .code
                    .as_deref()
                    .is_some_and(|code| number(code) == number(old));
                if !same_row {
                    ledger.push(self.release(&entry.id, old));
                }
            }
        }

        Ok(Committed {
            value: entry,
            ledger,
        })
    }

    /// Delete the entry addressed by id or code and release its code.
    pub fn delete(&self, key: &str) -> Result<Committed<Entry>, CatalogError> {
        let codec = self.codec();

        let entry = self.store.transaction(|tx| {
            let entries = tx.entries()?;
            let entry = locate(&entries, codec, key)
                .cloned()
                .ok_or_else(|| CatalogError::NotFound(key.to_string()))?;
            tx.delete_entry(&entry.id)?;
            Ok::<_, CatalogError>(entry)
        })?;

        let freed = self.free(Some(&entry.id), entry.code.as_deref());
        info!(id = %entry.id, code = ?entry.code, "deleted catalog entry");

        Ok(Committed {
            value: entry,
            ledger: vec![freed],
        })
    }

    /// Look up an entry by id, falling back to its code.
    pub fn get(&self, key: &str) -> Result<Option<Entry>, CatalogError> {
        let entries = self.store.entries()?;
        Ok(locate(&entries, self.codec(), key).cloned())
    }

    /// Entries matching `query`, ordered by title.
    pub fn search(&self, query: &SearchQuery) -> Result<Vec<Entry>, CatalogError> {
        let mut found: Vec<Entry> = self
            .store
            .entries()?
            .into_iter()
            .filter(|entry| query.matches(entry))
            .collect();
        found.sort_by(|a, b| a.title.cmp(&b.title).then_with(|| a.id.cmp(&b.id)));

        if let Some(limit) = query.limit.filter(|limit| *limit > 0) {
            found.truncate(limit);
        }
        Ok(found)
    }
}

fn label(entry: &Entry) -> Option<&str> {
    Some(entry.title.as_str()).filter(|title| !title.is_empty())
}

/// Find by primary id first, then by code (by number for decodable codes).
fn locate<'a>(entries: &'a [Entry], codec: &CodeFormat, key: &str) -> Option<&'a Entry> {
    if let Some(entry) = entries.iter().find(|entry| entry.id == key) {
        return Some(entry);
    }
    let key = key.trim();
    match codec.parse(key) {
        Some(n) => entries
            .iter()
            .find(|entry| entry.code.as_deref().and_then(|code| codec.parse(code)) == Some(n)),
        None => entries
            .iter()
            .find(|entry| entry.code.as_deref() == Some(key)),
    }
}

/// Whether an entry other than `owner` already holds `code` or its number.
fn code_taken(entries: &[Entry], codec: &CodeFormat, code: &str, owner: &str) -> bool {
    let num = codec.parse(code);
    entries
        .iter()
        .filter(|entry| entry.id != owner)
        .filter_map(|entry| entry.code.as_deref())
        .any(|other| other == code || (num.is_some() && codec.parse(other) == num))
}

fn code_in_use(err: StoreError, code: Option<&str>) -> CatalogError {
    match code {
        Some(code) if err.is_code_conflict() => CatalogError::CodeInUse {
            code: code.to_string(),
        },
        _ => err.into(),
    }
}
