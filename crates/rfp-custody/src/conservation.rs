//! Custody conservation invariant checker.
//!
//! Two invariants, checked whenever no lock or release transfer is in flight:
//! ```text
//! ledger.balance(custody) == Σ(locked) − Σ(released)
//! Σ(locked) − Σ(released) == Σ(open bounties) + Σ(pending withdrawals)
//! ```
//!
//! The first catches value leaking out of custody behind the engine's back;
//! the second catches bookkeeping that zeroed a bounty without either paying
//! it or recording the debt.

use rfp_types::{Amount, Result, RfpError};
use rust_decimal::Decimal;

/// Running totals of value that entered and left custody.
#[derive(Debug, Default)]
pub struct CustodyConservation {
    locked: Amount,
    released: Amount,
}

impl CustodyConservation {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an inbound lock, before or after its transfer.
    ///
    /// # Errors
    /// Returns [`RfpError::InvalidAmount`] if `Σ locked + amount` overflows;
    /// nothing is recorded.
    pub fn record_lock(&mut self, amount: Amount) -> Result<()> {
        self.locked = self
            .locked
            .checked_add(amount)
            .ok_or_else(|| RfpError::InvalidAmount {
                amount,
                reason: "custody total would overflow".into(),
            })?;
        Ok(())
    }

    /// Undo a [`CustodyConservation::record_lock`] whose transfer was refused.
    pub fn revert_lock(&mut self, amount: Amount) {
        self.locked -= amount;
    }

    /// Record a successful release transfer.
    pub fn record_release(&mut self, amount: Amount) {
        // Σ released never exceeds Σ locked.
        self.released = self.released.saturating_add(amount);
    }

    /// What custody should hold: locked − released.
    #[must_use]
    pub fn expected_custody(&self) -> Amount {
        self.locked - self.released
    }

    /// Compare against the ledger's view of the custody account.
    ///
    /// # Errors
    /// Returns [`RfpError::CustodyInvariantViolation`] if they differ.
    pub fn verify_balance(&self, actual_custody: Amount) -> Result<()> {
        let expected = self.expected_custody();
        if actual_custody != expected {
            return Err(RfpError::CustodyInvariantViolation {
                reason: format!(
                    "custody holds {actual_custody}, expected {expected} \
                     (locked={}, released={})",
                    self.locked, self.released
                ),
            });
        }
        Ok(())
    }

    /// Compare against the obligations recorded by the engine.
    ///
    /// # Errors
    /// Returns [`RfpError::CustodyInvariantViolation`] if they differ.
    pub fn verify_obligations(&self, open_bounties: Amount, pending: Amount) -> Result<()> {
        let expected = self.expected_custody();
        let obligations = open_bounties.checked_add(pending).ok_or_else(|| {
            RfpError::CustodyInvariantViolation {
                reason: format!("obligations overflow (bounties={open_bounties}, pending={pending})"),
            }
        })?;
        if obligations != expected {
            return Err(RfpError::CustodyInvariantViolation {
                reason: format!(
                    "obligations {obligations} (bounties={open_bounties}, pending={pending}) \
                     != custody {expected}"
                ),
            });
        }
        if expected < Decimal::ZERO {
            return Err(RfpError::CustodyInvariantViolation {
                reason: format!("negative custody {expected}"),
            });
        }
        Ok(())
    }
}
