//! Error types for the RFP escrow engine.
//!
//! All errors use the `RFP_ERR_` prefix convention for easy grepping in logs.
//! Error codes are grouped by subsystem:
//! - 1xx: RFP registry errors
//! - 2xx: Submission errors
//! - 3xx: Escrow / custody errors
//! - 4xx: Forwarding errors
//! - 9xx: Configuration / general errors

use thiserror::Error;

use crate::{Amount, BlockHeight, RfpId, RfpStatus, SubmissionId, SubmissionStatus};

/// Central error enum for all engine operations.
#[derive(Debug, Error)]
pub enum RfpError {
    // =================================================================
    // RFP Registry Errors (1xx)
    // =================================================================
    /// The caller is not the identity required by the operation.
    #[error("RFP_ERR_100: Unauthorized: {reason}")]
    Unauthorized { reason: String },

    /// The referenced RFP does not exist.
    #[error("RFP_ERR_101: RFP not found: {0}")]
    RfpNotFound(RfpId),

    /// The RFP is not in the `Open` state.
    #[error("RFP_ERR_102: RFP {rfp} is not open (status {status})")]
    NotOpen { rfp: RfpId, status: RfpStatus },

    /// The RFP has already been awarded; its bounty is gone.
    #[error("RFP_ERR_103: RFP {0} already awarded")]
    AlreadyAwarded(RfpId),

    /// The logical clock is past the RFP's expiry.
    #[error("RFP_ERR_104: RFP {rfp} expired at {expiry}, now {now}")]
    Expired {
        rfp: RfpId,
        expiry: BlockHeight,
        now: BlockHeight,
    },

    /// The RFP's expiry has not been reached yet (expiry sweep too early).
    #[error("RFP_ERR_105: RFP {rfp} does not expire until {expiry}, now {now}")]
    NotExpired {
        rfp: RfpId,
        expiry: BlockHeight,
        now: BlockHeight,
    },

    /// The requested expiry is too close to the current height.
    #[error("RFP_ERR_106: Invalid duration: expiry {expiry} must be after {earliest}")]
    InvalidDuration {
        expiry: BlockHeight,
        earliest: BlockHeight,
    },

    // =================================================================
    // Submission Errors (2xx)
    // =================================================================
    /// The referenced submission does not exist.
    #[error("RFP_ERR_200: Submission not found: {0}")]
    SubmissionNotFound(SubmissionId),

    /// The submission is in the wrong state, or targets a different RFP.
    #[error("RFP_ERR_201: Invalid submission state for {submission}: {reason}")]
    InvalidSubmissionState {
        submission: SubmissionId,
        reason: String,
    },

    /// The submission payload is malformed.
    #[error("RFP_ERR_202: Invalid payload: {reason}")]
    InvalidPayload { reason: String },

    // =================================================================
    // Escrow / Custody Errors (3xx)
    // =================================================================
    /// The token ledger reported a failed transfer.
    #[error("RFP_ERR_300: Transfer of {amount} failed: {reason}")]
    TransferFailed { amount: Amount, reason: String },

    /// A bounty or value amount is out of range.
    #[error("RFP_ERR_301: Invalid amount {amount}: {reason}")]
    InvalidAmount { amount: Amount, reason: String },

    /// No deferred payout is owed to the caller.
    #[error("RFP_ERR_302: Nothing to withdraw")]
    NothingToWithdraw,

    /// Custody conservation invariant violated.
    #[error("RFP_ERR_303: Custody invariant violation: {reason}")]
    CustodyInvariantViolation { reason: String },

    // =================================================================
    // Forwarding Errors (4xx)
    // =================================================================
    /// Forwarding requires the submission to be `Selected`.
    #[error("RFP_ERR_400: Submission {submission} not selected (status {status})")]
    NotSelected {
        submission: SubmissionId,
        status: SubmissionStatus,
    },

    // =================================================================
    // Configuration / General (9xx)
    // =================================================================
    /// Serialization / deserialization error.
    #[error("RFP_ERR_900: Serialization error: {0}")]
    Serialization(String),

    /// Configuration error (invalid config file, missing fields, etc.).
    #[error("RFP_ERR_901: Configuration error: {0}")]
    Configuration(String),
}

impl RfpError {
    /// Whether this error means a referenced record does not exist.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::RfpNotFound(_) | Self::SubmissionNotFound(_))
    }
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, RfpError>;

impl From<serde_json::Error> for RfpError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
