use std::collections::BTreeSet;

use tracing::debug;

use crate::code::CodeFormat;
use crate::store::{CatalogStore, StoreError};

use super::UsedSetCollector;

/// Picks codes for new entries.
///
/// A requested code is honored when its number is free. Otherwise the
/// smallest positive number not in use is chosen, so codes stay dense and
/// reproducible for a given store state instead of drifting upward the way an
/// auto-increment sequence does after deletions.
#[derive(Debug, Clone)]
pub struct CodeAllocator {
    codec: CodeFormat,
    collector: UsedSetCollector,
}

impl CodeAllocator {
    pub fn new(codec: CodeFormat, reservations: bool) -> Self {
        CodeAllocator {
            collector: UsedSetCollector::new(codec.clone(), reservations),
            codec,
        }
    }

    pub fn codec(&self) -> &CodeFormat {
        &self.codec
    }

    /// Compute the code to assign against the current store state.
    ///
    /// Only reads; the caller persists the result and must be prepared for
    /// the store's uniqueness constraint to reject it under concurrency.
    pub fn allocate<S: CatalogStore>(
        &self,
        store: &S,
        requested: Option<&str>,
    ) -> Result<String, StoreError> {
        let used = self.collector.collect(store)?;
        let requested = requested.and_then(|code| self.codec.parse(code));
        let n = candidate(&used, requested);

        debug!(candidate = n, requested = ?requested, "allocated code number");
        Ok(self.codec.format(n))
    }
}

/// The requested number if it is positive and unused, else the smallest
/// positive number missing from `used`.
pub fn candidate(used: &BTreeSet<u64>, requested: Option<u64>) -> u64 {
    if let Some(n) = requested {
        if n > 0 && !used.contains(&n) {
            return n;
        }
    }
    smallest_missing(used)
}

/// Smallest positive integer not in `used`. Always terminates: the walk
/// stops at the first gap in the sorted set, or one past its maximum.
pub fn smallest_missing(used: &BTreeSet<u64>) -> u64 {
    let mut next = 1;
    for &n in used.range(1..) {
        if n != next {
            break;
        }
        next += 1;
    }
    next
}
