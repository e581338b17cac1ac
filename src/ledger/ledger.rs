use tracing::{debug, warn};

use crate::code::CodeFormat;
use crate::store::{CatalogStore, Reservation, StoreError, Transaction};

use super::LedgerOutcome;

/// Best-effort bookkeeping of which owner holds which code number.
///
/// The ledger is a secondary index: an entry's own code is authoritative,
/// and every ledger failure is logged and reported as a [`LedgerOutcome`]
/// instead of being propagated. Rows are never deleted; freeing a number
/// only clears its owner.
#[derive(Debug, Clone)]
pub struct MappingLedger {
    codec: CodeFormat,
    enabled: bool,
}

/// Which reservation rows a `free` or `release` call targets.
enum Target<'a> {
    Owner(&'a str),
    Number(u64),
    Label(&'a str),
    /// Rows `owner` holds for one code: the numbered row, or its label-only
    /// rows when the code does not decode.
    Held { owner: &'a str, num: Option<u64> },
}

impl Target<'_> {
    fn matches(&self, row: &Reservation) -> bool {
        match self {
            Target::Owner(owner) => row.is_owned_by(owner),
            Target::Number(n) => row.num == Some(*n),
            Target::Label(label) => row.num.is_none() && row.label.as_deref() == Some(*label),
            Target::Held { owner, num } => row.is_owned_by(owner) && row.num == *num,
        }
    }
}

impl MappingLedger {
    /// `enabled` is false when the store has no reservation table.
    pub fn new(codec: CodeFormat, enabled: bool) -> Self {
        MappingLedger { codec, enabled }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Record that `owner` holds `code`.
    ///
    /// Claiming a free row, or one the owner already holds, is idempotent.
    /// A row held by someone else is left untouched and reported as a
    /// conflict. Codes that do not decode get a label-only row, one per
    /// owner; claiming again relabels it instead of adding another.
    pub fn claim<S: CatalogStore>(
        &self,
        store: &S,
        owner: &str,
        code: &str,
        label: Option<&str>,
    ) -> LedgerOutcome {
        if !self.enabled {
            return LedgerOutcome::Unavailable;
        }
        let code = code.trim();
        if owner.is_empty() || code.is_empty() {
            return LedgerOutcome::Skipped;
        }

        let num = self.codec.parse(code).filter(|n| *n > 0);
        let result = store.transaction(|tx| match num {
            Some(n) => claim_number(tx, n, owner, label),
            None => claim_label(tx, owner, label.unwrap_or(code)),
        });

        match result {
            Ok(LedgerOutcome::Conflict { num, owner: holder }) => {
                warn!(code, num, owner, holder = %holder, "code already claimed by another owner");
                LedgerOutcome::Conflict { num, owner: holder }
            }
            Ok(outcome) => {
                debug!(code, owner, outcome = %outcome, "ledger claim");
                outcome
            }
            Err(err) => {
                warn!(code, owner, error = %err, "failed to record code claim");
                LedgerOutcome::Failed {
                    reason: err.to_string(),
                }
            }
        }
    }

    /// Release reservations back to the pool.
    ///
    /// Rows are matched by owner when one is given, otherwise by the decoded
    /// code number. For codes that do not decode, label-only rows whose label
    /// equals the code are matched. Matching nothing is not an error.
    pub fn free<S: CatalogStore>(
        &self,
        store: &S,
        owner: Option<&str>,
        code: Option<&str>,
    ) -> LedgerOutcome {
        if !self.enabled {
            return LedgerOutcome::Unavailable;
        }

        let owner = owner.filter(|owner| !owner.is_empty());
        let code = code.map(str::trim).filter(|code| !code.is_empty());
        let target = match (owner, code) {
            (Some(owner), _) => Target::Owner(owner),
            (None, Some(code)) => match self.codec.parse(code) {
                Some(n) => Target::Number(n),
                None => Target::Label(code),
            },
            (None, None) => return LedgerOutcome::Skipped,
        };

        self.free_rows(store, &target, owner, code)
    }

    /// Release only the rows `owner` holds for `code`, leaving its other
    /// claims and everyone else's rows alone. For a code that does not
    /// decode this is the owner's label-only row, whatever its label.
    pub fn release<S: CatalogStore>(&self, store: &S, owner: &str, code: &str) -> LedgerOutcome {
        if !self.enabled {
            return LedgerOutcome::Unavailable;
        }
        let code = code.trim();
        if owner.is_empty() || code.is_empty() {
            return LedgerOutcome::Skipped;
        }

        let num = self.codec.parse(code).filter(|n| *n > 0);
        self.free_rows(store, &Target::Held { owner, num }, Some(owner), Some(code))
    }

    fn free_rows<S: CatalogStore>(
        &self,
        store: &S,
        target: &Target<'_>,
        owner: Option<&str>,
        code: Option<&str>,
    ) -> LedgerOutcome {
        let result = store.transaction(|tx| {
            let mut freed = 0;
            for mut row in tx.reservations()? {
                if row.is_free() || !target.matches(&row) {
                    continue;
                }
                row.owner = None;
                tx.update_reservation(&row)?;
                freed += 1;
            }
            Ok::<_, StoreError>(LedgerOutcome::Freed { rows: freed })
        });

        match result {
            Ok(outcome) => {
                debug!(owner = ?owner, code = ?code, outcome = %outcome, "ledger free");
                outcome
            }
            Err(err) => {
                warn!(owner = ?owner, code = ?code, error = %err, "failed to free code reservation");
                LedgerOutcome::Failed {
                    reason: err.to_string(),
                }
            }
        }
    }
}

fn claim_number(
    tx: &mut dyn Transaction,
    num: u64,
    owner: &str,
    label: Option<&str>,
) -> Result<LedgerOutcome, StoreError> {
    let existing = tx.reservations()?.into_iter().find(|row| row.num == Some(num));

    match existing {
        Some(mut row) if row.is_free() || row.is_owned_by(owner) => {
            row.owner = Some(owner.to_string());
            if let Some(label) = label {
                row.label = Some(label.to_string());
            }
            tx.update_reservation(&row)?;
            Ok(LedgerOutcome::Claimed { num: Some(num) })
        }
        Some(row) => Ok(LedgerOutcome::Conflict {
            num,
            owner: row.owner.unwrap_or_default(),
        }),
        None => {
            tx.insert_reservation(Some(num), Some(owner), label)?;
            Ok(LedgerOutcome::Inserted { num: Some(num) })
        }
    }
}

fn claim_label(
    tx: &mut dyn Transaction,
    owner: &str,
    label: &str,
) -> Result<LedgerOutcome, StoreError> {
    let existing = tx
        .reservations()?
        .into_iter()
        .find(|row| row.num.is_none() && row.is_owned_by(owner));

    match existing {
        Some(mut row) => {
            row.label = Some(label.to_string());
            tx.update_reservation(&row)?;
            Ok(LedgerOutcome::Claimed { num: None })
        }
        None => {
            tx.insert_reservation(None, Some(owner), Some(label))?;
            Ok(LedgerOutcome::Inserted { num: None })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryCatalogStore;

    fn ledger() -> MappingLedger {
        MappingLedger::new(CodeFormat::default(), true)
    }

    fn row(store: &InMemoryCatalogStore, num: u64) -> Reservation {
        store
            .reservations()
            .unwrap()
            .into_iter()
            .find(|row| row.num == Some(num))
            .unwrap()
    }

    #[test]
    fn claim_inserts_new_row() {
        let store = InMemoryCatalogStore::new();
        let outcome = ledger().claim(&store, "e1", "PRD0005", Some("Lamp"));

        assert_eq!(outcome, LedgerOutcome::Inserted { num: Some(5) });
        let row = row(&store, 5);
        assert!(row.is_owned_by("e1"));
        assert_eq!(row.label.as_deref(), Some("Lamp"));
    }

    #[test]
    fn claim_is_idempotent() {
        let store = InMemoryCatalogStore::new();
        let ledger = ledger();
        ledger.claim(&store, "e1", "PRD0005", None);
        let again = ledger.claim(&store, "e1", "prd5", Some("Renamed"));

        assert_eq!(again, LedgerOutcome::Claimed { num: Some(5) });
        assert_eq!(store.reservations().unwrap().len(), 1);
        assert_eq!(row(&store, 5).label.as_deref(), Some("Renamed"));
    }

    #[test]
    fn claim_conflict_leaves_row_untouched() {
        let store = InMemoryCatalogStore::new();
        let ledger = ledger();
        ledger.claim(&store, "e1", "PRD0005", Some("Lamp"));
        let outcome = ledger.claim(&store, "e2", "PRD0005", Some("Chair"));

        assert_eq!(
            outcome,
            LedgerOutcome::Conflict {
                num: 5,
                owner: "e1".into()
            }
        );
        let row = row(&store, 5);
        assert!(row.is_owned_by("e1"));
        assert_eq!(row.label.as_deref(), Some("Lamp"));
    }

    #[test]
    fn claim_takes_over_free_row() {
        let store = InMemoryCatalogStore::new();
        store
            .transaction(|tx| tx.insert_reservation(Some(3), None, Some("seeded")))
            .unwrap();

        let outcome = ledger().claim(&store, "e9", "PRD0003", None);
        assert_eq!(outcome, LedgerOutcome::Claimed { num: Some(3) });
        let row = row(&store, 3);
        assert!(row.is_owned_by("e9"));
        assert_eq!(row.label.as_deref(), Some("seeded"));
    }

    #[test]
    fn claim_non_numeric_code_is_label_only() {
        let store = InMemoryCatalogStore::new();
        let outcome = ledger().claim(&store, "e1", "LEGACY-7", None);

        assert_eq!(outcome, LedgerOutcome::Inserted { num: None });
        let rows = store.reservations().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].num, None);
        assert_eq!(rows[0].label.as_deref(), Some("LEGACY-7"));
    }

    #[test]
    fn repeated_label_claim_reuses_row() {
        let store = InMemoryCatalogStore::new();
        let ledger = ledger();
        ledger.claim(&store, "e1", "LEGACY-7", Some("Lamp"));
        let again = ledger.claim(&store, "e1", "LEGACY-7", Some("Desk Lamp"));

        assert_eq!(again, LedgerOutcome::Claimed { num: None });
        let rows = store.reservations().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].label.as_deref(), Some("Desk Lamp"));

        // Another owner gets its own row.
        ledger.claim(&store, "e2", "LEGACY-7", None);
        assert_eq!(store.reservations().unwrap().len(), 2);
    }

    #[test]
    fn release_label_only_row_whatever_its_label() {
        let store = InMemoryCatalogStore::new();
        let ledger = ledger();
        ledger.claim(&store, "e1", "LEGACY-7", Some("Lamp"));
        ledger.claim(&store, "e1", "PRD0002", Some("Lamp"));

        assert_eq!(
            ledger.release(&store, "e1", "LEGACY-7"),
            LedgerOutcome::Freed { rows: 1 }
        );
        let rows = store.reservations().unwrap();
        assert!(rows.iter().filter(|row| row.num.is_none()).all(Reservation::is_free));
        assert!(row(&store, 2).is_owned_by("e1"));
    }

    #[test]
    fn release_leaves_other_owners_alone() {
        let store = InMemoryCatalogStore::new();
        let ledger = ledger();
        ledger.claim(&store, "ghost", "PRD0004", None);
        ledger.claim(&store, "e1", "PRD0005", None);

        assert_eq!(
            ledger.release(&store, "e1", "PRD0004"),
            LedgerOutcome::Freed { rows: 0 }
        );
        assert_eq!(
            ledger.release(&store, "e1", "prd5"),
            LedgerOutcome::Freed { rows: 1 }
        );
        assert!(row(&store, 4).is_owned_by("ghost"));
        assert!(row(&store, 5).is_free());
        assert_eq!(ledger.release(&store, "", "PRD0004"), LedgerOutcome::Skipped);
    }

    #[test]
    fn claim_empty_code_is_skipped() {
        let store = InMemoryCatalogStore::new();
        assert_eq!(ledger().claim(&store, "e1", "  ", None), LedgerOutcome::Skipped);
        assert!(store.reservations().unwrap().is_empty());
    }

    #[test]
    fn free_by_code_keeps_row() {
        let store = InMemoryCatalogStore::new();
        let ledger = ledger();
        ledger.claim(&store, "e1", "PRD0005", Some("Lamp"));

        assert_eq!(
            ledger.free(&store, None, Some("PRD0005")),
            LedgerOutcome::Freed { rows: 1 }
        );
        let row = row(&store, 5);
        assert!(row.is_free());
        assert_eq!(row.label.as_deref(), Some("Lamp"));
    }

    #[test]
    fn free_by_owner_releases_all_rows() {
        let store = InMemoryCatalogStore::new();
        let ledger = ledger();
        ledger.claim(&store, "e1", "PRD0001", None);
        ledger.claim(&store, "e1", "PRD0002", None);
        ledger.claim(&store, "e2", "PRD0003", None);

        assert_eq!(
            ledger.free(&store, Some("e1"), Some("PRD0003")),
            LedgerOutcome::Freed { rows: 2 }
        );
        assert!(row(&store, 1).is_free());
        assert!(row(&store, 2).is_free());
        assert!(row(&store, 3).is_owned_by("e2"));
    }

    #[test]
    fn free_label_only_row_by_code() {
        let store = InMemoryCatalogStore::new();
        let ledger = ledger();
        ledger.claim(&store, "e1", "LEGACY-7", None);

        assert_eq!(
            ledger.free(&store, None, Some("LEGACY-7")),
            LedgerOutcome::Freed { rows: 1 }
        );
    }

    #[test]
    fn free_without_target_is_noop() {
        let store = InMemoryCatalogStore::new();
        let ledger = ledger();
        assert_eq!(ledger.free(&store, None, None), LedgerOutcome::Skipped);
        assert_eq!(ledger.free(&store, Some(""), Some(" ")), LedgerOutcome::Skipped);
        assert_eq!(
            ledger.free(&store, None, Some("PRD0042")),
            LedgerOutcome::Freed { rows: 0 }
        );
    }

    #[test]
    fn disabled_ledger_is_unavailable() {
        let store = InMemoryCatalogStore::without_reservations();
        let ledger = MappingLedger::new(CodeFormat::default(), false);
        assert_eq!(
            ledger.claim(&store, "e1", "PRD0001", None),
            LedgerOutcome::Unavailable
        );
        assert_eq!(
            ledger.free(&store, Some("e1"), None),
            LedgerOutcome::Unavailable
        );
    }

    #[test]
    fn store_failure_is_swallowed() {
        // The flag claims a table the store does not have.
        let store = InMemoryCatalogStore::without_reservations();
        let ledger = ledger();

        assert!(ledger.claim(&store, "e1", "PRD0001", None).is_failed());
        assert!(ledger.free(&store, Some("e1"), None).is_failed());
    }
}
