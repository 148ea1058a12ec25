//! Deferred payouts.
//!
//! When a release transfer fails after its bookkeeping has been committed,
//! the amount is owed to the beneficiary rather than rolled back. Owed
//! amounts accumulate per beneficiary until collected.

use std::collections::HashMap;

use rfp_types::{Address, Amount, Result, RfpError};
use rust_decimal::Decimal;

/// Amounts owed out of custody, keyed by beneficiary.
#[derive(Debug, Default)]
pub struct PendingWithdrawals {
    owed: HashMap<Address, Amount>,
}

impl PendingWithdrawals {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `amount` to what `beneficiary` is owed.
    pub fn credit(&mut self, beneficiary: Address, amount: Amount) {
        // Everything owed came out of Σ locked, whose growth is checked.
        let owed = self.owed.entry(beneficiary).or_insert(Decimal::ZERO);
        *owed = owed.saturating_add(amount);
    }

    /// Remove and return everything owed to `beneficiary`.
    ///
    /// # Errors
    /// Returns [`RfpError::NothingToWithdraw`] if nothing is owed.
    pub fn take(&mut self, beneficiary: Address) -> Result<Amount> {
        match self.owed.remove(&beneficiary) {
            Some(amount) if amount > Decimal::ZERO => Ok(amount),
            _ => Err(RfpError::NothingToWithdraw),
        }
    }

    /// Amount currently owed to `beneficiary`.
    #[must_use]
    pub fn owed(&self, beneficiary: Address) -> Amount {
        self.owed.get(&beneficiary).copied().unwrap_or(Decimal::ZERO)
    }

    /// Sum owed across all beneficiaries.
    ///
    /// # Errors
    /// Returns [`RfpError::CustodyInvariantViolation`] if the sum overflows.
    pub fn total(&self) -> Result<Amount> {
        self.owed
            .values()
            .try_fold(Decimal::ZERO, |acc, owed| acc.checked_add(*owed))
            .ok_or_else(|| RfpError::CustodyInvariantViolation {
                reason: "pending withdrawals overflow".into(),
            })
    }

    /// Number of beneficiaries with an outstanding balance.
    #[must_use]
    pub fn len(&self) -> usize {
        self.owed.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.owed.is_empty()
    }
}
