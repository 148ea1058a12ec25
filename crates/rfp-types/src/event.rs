//! Notifications forming the externally observable audit trail.
//!
//! Exactly one notification is recorded per committed transition, after the
//! transition is committed and before any external call is issued.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Address, Amount, BlockHeight, RfpId, RfpStatus, SubmissionId, SubmissionStatus};

/// What happened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Notification {
    RfpCreated {
        rfp_id: RfpId,
        creator: Address,
        bounty: Amount,
        expiry: BlockHeight,
        description: String,
    },
    RfpStatusChanged {
        rfp_id: RfpId,
        status: RfpStatus,
    },
    SubmissionCreated {
        submission_id: SubmissionId,
        creator: Address,
        rfp_id: RfpId,
    },
    SubmissionStatusChanged {
        rfp_id: RfpId,
        submission_id: SubmissionId,
        status: SubmissionStatus,
    },
    /// A release transfer failed; the amount is now owed to `beneficiary`.
    PayoutDeferred {
        beneficiary: Address,
        amount: Amount,
    },
    /// A deferred payout was collected.
    PendingWithdrawn {
        beneficiary: Address,
        amount: Amount,
    },
}

impl std::fmt::Display for Notification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RfpCreated { .. } => write!(f, "RFP_CREATED"),
            Self::RfpStatusChanged { .. } => write!(f, "RFP_STATUS_CHANGED"),
            Self::SubmissionCreated { .. } => write!(f, "SUBMISSION_CREATED"),
            Self::SubmissionStatusChanged { .. } => write!(f, "SUBMISSION_STATUS_CHANGED"),
            Self::PayoutDeferred { .. } => write!(f, "PAYOUT_DEFERRED"),
            Self::PendingWithdrawn { .. } => write!(f, "PENDING_WITHDRAWN"),
        }
    }
}

/// A notification as stored in the engine's event log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    /// Position in the log, starting at 0, gap-free.
    pub seq: u64,
    /// Logical height of the operation that produced it.
    pub height: BlockHeight,
    /// Wall-clock time of recording. Informational only.
    pub recorded_at: DateTime<Utc>,
    pub notification: Notification,
}
