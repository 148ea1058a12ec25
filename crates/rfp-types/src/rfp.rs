//! # RFP: a funded request for proposals
//!
//! ## State Machine
//!
//! ```text
//!            award    ┌─────────┐
//!        ┌──────────▶│ AWARDED │
//!        │            └─────────┘
//!   ┌────┴─┐  cancel  ┌───────────┐
//!   │ OPEN ├────────▶│ CANCELLED │
//!   └────┬─┘          └───────────┘
//!        │ expiry sweep ┌─────────┐
//!        └────────────▶│ EXPIRED │
//!                       └─────────┘
//! ```
//!
//! `CLOSED` and `PROPOSED` are declared but reserved: no transition produces
//! them. Every exit from `OPEN` zeroes the bounty in the same step.

use serde::{Deserialize, Serialize};

use crate::{Address, Amount, BlockHeight, RfpId};

/// The lifecycle status of an RFP.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RfpStatus {
    /// Accepting submissions; bounty held in escrow.
    Open,
    /// Reserved. Unreachable.
    Closed,
    /// A submission was selected and the bounty paid to its creator.
    Awarded,
    /// Swept after expiry; bounty refunded to the requestor.
    Expired,
    /// Withdrawn by the requestor; bounty refunded.
    Cancelled,
    /// Reserved. Unreachable.
    Proposed,
}

impl RfpStatus {
    /// Can an RFP move from this status to `target`?
    #[must_use]
    pub fn can_transition_to(&self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::Open, Self::Awarded | Self::Cancelled | Self::Expired)
        )
    }

    /// Whether no further transition is possible.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Open)
    }
}

impl std::fmt::Display for RfpStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Open => write!(f, "OPEN"),
            Self::Closed => write!(f, "CLOSED"),
            Self::Awarded => write!(f, "AWARDED"),
            Self::Expired => write!(f, "EXPIRED"),
            Self::Cancelled => write!(f, "CANCELLED"),
            Self::Proposed => write!(f, "PROPOSED"),
        }
    }
}

/// One funded request. Records are never destroyed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rfp {
    pub id: RfpId,
    pub requestor: Address,
    pub created_at: BlockHeight,
    /// Last height at which the RFP may be awarded.
    pub expiry: BlockHeight,
    /// Opaque reference, e.g. an off-chain pointer.
    pub description: String,
    /// Amount currently held in escrow for this RFP.
    pub bounty: Amount,
    pub status: RfpStatus,
}

impl Rfp {
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.status == RfpStatus::Open
    }

    /// Whether `now` is past the award window.
    #[must_use]
    pub fn is_expired_at(&self, now: BlockHeight) -> bool {
        now > self.expiry
    }

    /// Move to `target`, zeroing the bounty, and return the amount released.
    ///
    /// # Errors
    /// Returns [`crate::RfpError::AlreadyAwarded`] from `Awarded`, and
    /// [`crate::RfpError::NotOpen`] from any other non-open status.
    pub fn settle(&mut self, target: RfpStatus) -> crate::Result<Amount> {
        if !self.status.can_transition_to(target) {
            return Err(match self.status {
                RfpStatus::Awarded => crate::RfpError::AlreadyAwarded(self.id),
                status => crate::RfpError::NotOpen {
                    rfp: self.id,
                    status,
                },
            });
        }
        let released = self.bounty;
        self.status = target;
        self.bounty = Amount::ZERO;
        Ok(released)
    }
}
