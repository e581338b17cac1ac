use std::fmt;

/// What a best-effort ledger operation did.
///
/// Ledger operations never fail the caller; this is the soft counterpart of
/// [`CatalogError`](crate::CatalogError) and is meant to be logged or
/// inspected, not propagated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerOutcome {
    /// An existing row was claimed (or re-claimed) for the owner. `num` is
    /// `None` for label-only reservations.
    Claimed { num: Option<u64> },
    /// A new row was inserted. `num` is `None` for label-only reservations.
    Inserted { num: Option<u64> },
    /// The number is held by a different owner; the row was left untouched.
    Conflict { num: u64, owner: String },
    /// Rows released back to the pool.
    Freed { rows: usize },
    /// Nothing to do (no owner or code given).
    Skipped,
    /// The store has no reservation table.
    Unavailable,
    /// The store rejected the operation; the error was logged and swallowed.
    Failed { reason: String },
}

impl LedgerOutcome {
    pub fn is_conflict(&self) -> bool {
        matches!(self, LedgerOutcome::Conflict { .. })
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, LedgerOutcome::Failed { .. })
    }

    /// Whether the ledger now reflects the requested state.
    pub fn is_applied(&self) -> bool {
        matches!(
            self,
            LedgerOutcome::Claimed { .. } | LedgerOutcome::Inserted { .. } | LedgerOutcome::Freed { .. }
        )
    }
}

impl fmt::Display for LedgerOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LedgerOutcome::Claimed { num: Some(num) } => write!(f, "claimed #{}", num),
            LedgerOutcome::Claimed { num: None } => write!(f, "claimed label"),
            LedgerOutcome::Inserted { num: Some(num) } => write!(f, "reserved #{}", num),
            LedgerOutcome::Inserted { num: None } => write!(f, "reserved label"),
            LedgerOutcome::Conflict { num, owner } => {
                write!(f, "#{} already claimed by {}", num, owner)
            }
            LedgerOutcome::Freed { rows } => write!(f, "freed {} row(s)", rows),
            LedgerOutcome::Skipped => write!(f, "skipped"),
            LedgerOutcome::Unavailable => write!(f, "reservation table unavailable"),
            LedgerOutcome::Failed { reason } => write!(f, "ledger write failed: {}", reason),
        }
    }
}
