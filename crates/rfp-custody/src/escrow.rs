//! Escrow: moves bounties into and out of custody.
//!
//! `lock` is fatal on failure: the caller must not create the RFP.
//! `release` never fails the caller; a refused transfer comes back as
//! [`Payout::Deferred`] so the caller can queue the obligation instead of
//! un-committing state that a re-entrant call may already have observed.

use std::sync::Arc;

use rfp_types::{Address, Amount, Result, RfpError};
use serde::{Deserialize, Serialize};

use crate::ledger::TokenLedger;

/// Outcome of a release.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Payout {
    /// Funds reached the beneficiary.
    Paid { to: Address, amount: Amount },
    /// The ledger refused the transfer; the amount is still in custody.
    Deferred { to: Address, amount: Amount },
}

impl Payout {
    #[must_use]
    pub fn is_paid(&self) -> bool {
        matches!(self, Self::Paid { .. })
    }

    #[must_use]
    pub fn amount(&self) -> Amount {
        match self {
            Self::Paid { amount, .. } | Self::Deferred { amount, .. } => *amount,
        }
    }

    #[must_use]
    pub fn beneficiary(&self) -> Address {
        match self {
            Self::Paid { to, .. } | Self::Deferred { to, .. } => *to,
        }
    }
}

/// Handle on the ledger plus the custody account the engine holds funds in.
#[derive(Clone)]
pub struct Escrow {
    custody: Address,
    ledger: Arc<dyn TokenLedger>,
}

impl Escrow {
    #[must_use]
    pub fn new(custody: Address, ledger: Arc<dyn TokenLedger>) -> Self {
        Self { custody, ledger }
    }

    /// The account escrowed funds are held under.
    #[must_use]
    pub fn custody(&self) -> Address {
        self.custody
    }

    /// Pull `amount` from `from` into custody.
    ///
    /// # Errors
    /// - `InvalidAmount` if `amount` is not strictly positive (no call is made)
    /// - `TransferFailed` if the ledger refuses
    pub fn lock(&self, from: Address, amount: Amount) -> Result<()> {
        if amount <= Amount::ZERO {
            return Err(RfpError::InvalidAmount {
                amount,
                reason: "bounty must be positive".into(),
            });
        }
        if !self.ledger.transfer(from, self.custody, amount) {
            tracing::warn!(from = %from, amount = %amount, "Escrow lock refused by ledger");
            return Err(RfpError::TransferFailed {
                amount,
                reason: format!("ledger refused transfer from {from} into custody"),
            });
        }
        tracing::debug!(from = %from, amount = %amount, "Bounty locked");
        Ok(())
    }

    /// Pay `amount` out of custody to `to`.
    ///
    /// Callers must have committed every bookkeeping change for this payout
    /// before calling: the ledger is untrusted and may re-enter.
    pub fn release(&self, to: Address, amount: Amount) -> Payout {
        if self.ledger.transfer(self.custody, to, amount) {
            tracing::debug!(to = %to, amount = %amount, "Release paid");
            Payout::Paid { to, amount }
        } else {
            tracing::warn!(to = %to, amount = %amount, "Release refused by ledger");
            Payout::Deferred { to, amount }
        }
    }
}
