//! The reservation ledger: a best-effort, eventually consistent record of
//! which owner holds which code number.

mod ledger;
mod outcome;

pub use ledger::MappingLedger;
pub use outcome::LedgerOutcome;
