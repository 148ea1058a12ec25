//! Monotonic sequence allocator.
//!
//! One allocator per ID space. Issued values are never reused, even when the
//! operation that requested them later fails.

use std::sync::atomic::{AtomicU64, Ordering};

use rfp_types::constants;

/// Issues strictly increasing `u64` sequence numbers.
#[derive(Debug)]
pub struct SequenceAllocator {
    next: AtomicU64,
}

impl SequenceAllocator {
    /// Allocator whose first issued value is [`constants::FIRST_SEQUENCE_ID`].
    #[must_use]
    pub fn new() -> Self {
        Self::starting_at(constants::FIRST_SEQUENCE_ID)
    }

    #[must_use]
    pub fn starting_at(first: u64) -> Self {
        Self {
            next: AtomicU64::new(first),
        }
    }

    /// Issue the next value.
    pub fn issue(&self) -> u64 {
        let id = self.next.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(id, "Sequence issued");
        id
    }
}

impl Default for SequenceAllocator {
    fn default() -> Self {
        Self::new()
    }
}
