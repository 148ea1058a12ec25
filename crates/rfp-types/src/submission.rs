//! # Submission: a proposal filed against an open RFP
//!
//! ## State Machine
//!
//! ```text
//!   ┌───────────┐  award  ┌──────────┐  forward  ┌──────────┐
//!   │ SUBMITTED ├────────▶│ SELECTED ├──────────▶│ PROPOSED │
//!   └─────┬─────┘         └──────────┘           └──────────┘
//!         │ reject
//!         ▼
//!   ┌──────────┐
//!   │ REJECTED │
//!   └──────────┘
//! ```
//!
//! `PROPOSED` is terminal and only reachable from `SELECTED`; that ordering
//! is what makes forwarding idempotent.

use serde::{Deserialize, Serialize};

use crate::{Address, Payload, RfpError, RfpId, SubmissionId};

/// The lifecycle status of a submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SubmissionStatus {
    /// Filed and eligible for award while its RFP is open.
    Submitted,
    /// Won the award; bounty paid to the creator.
    Selected,
    /// Payload forwarded to the proposal factory. **Terminal.**
    Proposed,
    /// Rejected by the requestor. **Terminal.**
    Rejected,
}

impl SubmissionStatus {
    /// Can a submission move from this status to `target`?
    #[must_use]
    pub fn can_transition_to(&self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::Submitted, Self::Selected | Self::Rejected) | (Self::Selected, Self::Proposed)
        )
    }
}

impl std::fmt::Display for SubmissionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Submitted => write!(f, "SUBMITTED"),
            Self::Selected => write!(f, "SELECTED"),
            Self::Proposed => write!(f, "PROPOSED"),
            Self::Rejected => write!(f, "REJECTED"),
        }
    }
}

/// One proposal filed against an RFP. Records are never destroyed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Submission {
    pub id: SubmissionId,
    pub rfp_id: RfpId,
    pub creator: Address,
    pub description: String,
    pub payload: Payload,
    pub status: SubmissionStatus,
}

impl Submission {
    /// Fail unless this submission was filed against `rfp_id`.
    ///
    /// # Errors
    /// Returns [`RfpError::InvalidSubmissionState`] on mismatch.
    pub fn ensure_targets(&self, rfp_id: RfpId) -> crate::Result<()> {
        if self.rfp_id != rfp_id {
            return Err(RfpError::InvalidSubmissionState {
                submission: self.id,
                reason: format!("filed against {}, not {rfp_id}", self.rfp_id),
            });
        }
        Ok(())
    }

    /// Attempt the `Submitted → Selected` transition.
    ///
    /// # Errors
    /// Returns [`RfpError::InvalidSubmissionState`] if not `Submitted`.
    pub fn mark_selected(&mut self) -> crate::Result<()> {
        self.transition(SubmissionStatus::Selected)
    }

    /// Attempt the `Submitted → Rejected` transition.
    ///
    /// # Errors
    /// Returns [`RfpError::InvalidSubmissionState`] if not `Submitted`.
    pub fn mark_rejected(&mut self) -> crate::Result<()> {
        self.transition(SubmissionStatus::Rejected)
    }

    /// Attempt the `Selected → Proposed` transition.
    ///
    /// # Errors
    /// Returns [`RfpError::NotSelected`] if not `Selected`.
    pub fn mark_proposed(&mut self) -> crate::Result<()> {
        if !self.status.can_transition_to(SubmissionStatus::Proposed) {
            return Err(RfpError::NotSelected {
                submission: self.id,
                status: self.status,
            });
        }
        self.status = SubmissionStatus::Proposed;
        Ok(())
    }

    fn transition(&mut self, target: SubmissionStatus) -> crate::Result<()> {
        if !self.status.can_transition_to(target) {
            return Err(RfpError::InvalidSubmissionState {
                submission: self.id,
                reason: format!("cannot move from {} to {target}", self.status),
            });
        }
        self.status = target;
        Ok(())
    }
}
