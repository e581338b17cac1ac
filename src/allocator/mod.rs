//! Smallest-missing code allocation.

mod allocator;
mod collector;

pub use allocator::{candidate, smallest_missing, CodeAllocator};
pub use collector::UsedSetCollector;
