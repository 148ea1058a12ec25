//! RFP registry. Owns every RFP record and its lifecycle status.
//!
//! Records are inserted once and never removed. Status changes go through
//! [`Rfp::settle`], which zeroes the bounty in the same step.

use std::collections::BTreeMap;

use rfp_types::{Address, Amount, BlockHeight, Result, Rfp, RfpError, RfpId, RfpStatus};
use rust_decimal::Decimal;

use crate::sequence::SequenceAllocator;

/// Ordered store of RFP records.
pub struct RfpRegistry {
    rfps: BTreeMap<RfpId, Rfp>,
    sequence: SequenceAllocator,
}

/// Fields supplied by the creator of an RFP.
#[derive(Debug, Clone)]
pub struct NewRfp {
    pub requestor: Address,
    pub created_at: BlockHeight,
    pub expiry: BlockHeight,
    pub description: String,
    pub bounty: Amount,
}

impl RfpRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::with_allocator(SequenceAllocator::new())
    }

    #[must_use]
    pub fn with_allocator(sequence: SequenceAllocator) -> Self {
        Self {
            rfps: BTreeMap::new(),
            sequence,
        }
    }

    /// Check that `expiry` leaves at least `min_duration` heights after `now`.
    ///
    /// # Errors
    /// Returns [`RfpError::InvalidDuration`] unless `expiry > now + min_duration`.
    pub fn check_expiry(now: BlockHeight, expiry: BlockHeight, min_duration: u64) -> Result<()> {
        let earliest = now.saturating_add(min_duration);
        if expiry <= earliest {
            return Err(RfpError::InvalidDuration { expiry, earliest });
        }
        Ok(())
    }

    /// Store a new `Open` RFP under the next sequence id.
    pub fn insert(&mut self, new: NewRfp) -> RfpId {
        let id = RfpId(self.sequence.issue());
        let rfp = Rfp {
            id,
            requestor: new.requestor,
            created_at: new.created_at,
            expiry: new.expiry,
            description: new.description,
            bounty: new.bounty,
            status: RfpStatus::Open,
        };
        self.rfps.insert(id, rfp);
        id
    }

    /// # Errors
    /// Returns [`RfpError::RfpNotFound`] for an unknown id.
    pub fn get(&self, id: RfpId) -> Result<&Rfp> {
        self.rfps.get(&id).ok_or(RfpError::RfpNotFound(id))
    }

    /// # Errors
    /// Returns [`RfpError::RfpNotFound`] for an unknown id.
    pub fn get_mut(&mut self, id: RfpId) -> Result<&mut Rfp> {
        self.rfps.get_mut(&id).ok_or(RfpError::RfpNotFound(id))
    }

    /// All RFPs currently `Open`, in id order.
    pub fn open(&self) -> impl Iterator<Item = &Rfp> {
        self.rfps.values().filter(|r| r.is_open())
    }

    /// Sum of bounties still held for open RFPs.
    ///
    /// # Errors
    /// Returns [`RfpError::CustodyInvariantViolation`] if the sum overflows.
    pub fn open_bounty_total(&self) -> Result<Amount> {
        self.rfps
            .values()
            .try_fold(Decimal::ZERO, |acc, r| acc.checked_add(r.bounty))
            .ok_or_else(|| RfpError::CustodyInvariantViolation {
                reason: "open bounties overflow".into(),
            })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rfps.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rfps.is_empty()
    }
}

impl Default for RfpRegistry {
    fn default() -> Self {
        Self::new()
    }
}
