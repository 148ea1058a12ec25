//! # rfp-custody
//!
//! **Escrow & Settlement**: the only part of the system that moves value.
//!
//! ## Architecture
//!
//! 1. **TokenLedger**: the external fungible-token ledger, seen only through `transfer`
//! 2. **Escrow**: pulls bounties into custody (`lock`) and pays them out (`release`)
//! 3. **PendingWithdrawals**: payouts whose release transfer failed, owed until collected
//! 4. **CustodyConservation**: `custody balance == Σ locked − Σ released`
//!
//! ## Release Discipline
//!
//! ```text
//! check preconditions → commit bookkeeping (bounty ← 0) → Escrow.release()
//!                                                          ├─ ok   → Payout::Paid
//!                                                          └─ fail → PendingWithdrawals.credit()
//! ```
//!
//! Bookkeeping is always committed before `release` calls into the ledger,
//! so a ledger that re-enters the engine sees the bounty already spent.

pub mod conservation;
pub mod escrow;
pub mod ledger;
pub mod pending;

pub use conservation::CustodyConservation;
pub use escrow::{Escrow, Payout};
pub use ledger::{InMemoryLedger, TokenLedger};
pub use pending::PendingWithdrawals;
