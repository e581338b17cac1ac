use std::collections::BTreeSet;

use tracing::{debug, warn};

use crate::code::CodeFormat;
use crate::store::{CatalogStore, StoreError};

/// Gathers the set of integers already taken by entry codes and reservations.
#[derive(Debug, Clone)]
pub struct UsedSetCollector {
    codec: CodeFormat,
    reservations: bool,
}

impl UsedSetCollector {
    /// `reservations` says whether the reservation table exists in the store.
    pub fn new(codec: CodeFormat, reservations: bool) -> Self {
        UsedSetCollector {
            codec,
            reservations,
        }
    }

    /// Union of decoded entry codes and the numbers of claimed reservations.
    /// Released reservations keep their number but no longer block it.
    ///
    /// Failing to read entries is an error: guessing an empty set would hand
    /// out codes that are already in use. A failing reservation read only
    /// loses that table's contribution.
    pub fn collect<S: CatalogStore>(&self, store: &S) -> Result<BTreeSet<u64>, StoreError> {
        let mut used: BTreeSet<u64> = store
            .entries()?
            .iter()
            .filter_map(|entry| entry.code.as_deref())
            .filter_map(|code| self.codec.parse(code))
            .filter(|n| *n > 0)
            .collect();

        if self.reservations {
            match store.reservations() {
                Ok(rows) => used.extend(
                    rows.iter()
                        .filter(|row| !row.is_free())
                        .filter_map(|row| row.num)
                        .filter(|n| *n > 0),
                ),
                Err(err) => warn!(error = %err, "reservation scan failed, using entry codes only"),
            }
        }

        debug!(used = used.len(), "collected used code numbers");
        Ok(used)
    }
}
