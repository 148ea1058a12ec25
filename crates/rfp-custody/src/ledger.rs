//! The external token ledger and an in-process implementation of it.
//!
//! The engine never inspects ledger internals: it calls
//! [`TokenLedger::transfer`] and treats `false` as failure. Implementations
//! are untrusted and may call back into the engine before returning.

use std::collections::HashMap;

use parking_lot::Mutex;
use rfp_types::{Address, Amount};
use rust_decimal::Decimal;

/// Fungible-token ledger that actually custodies value.
pub trait TokenLedger: Send + Sync {
    /// Move `amount` from `from` to `to`. Returns `false` on failure.
    fn transfer(&self, from: Address, to: Address, amount: Amount) -> bool;
}

/// Simple balance-map ledger.
///
/// Transfers fail on non-positive amounts and on insufficient balance;
/// a failed transfer changes nothing.
#[derive(Default)]
pub struct InMemoryLedger {
    balances: Mutex<HashMap<Address, Amount>>,
}

impl InMemoryLedger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Mint `amount` to `account`.
    pub fn deposit(&self, account: Address, amount: Amount) {
        *self.balances.lock().entry(account).or_default() += amount;
    }

    #[must_use]
    pub fn balance_of(&self, account: Address) -> Amount {
        self.balances
            .lock()
            .get(&account)
            .copied()
            .unwrap_or(Decimal::ZERO)
    }

    /// Sum of all balances.
    #[must_use]
    pub fn total_supply(&self) -> Amount {
        self.balances.lock().values().copied().sum()
    }
}

impl TokenLedger for InMemoryLedger {
    fn transfer(&self, from: Address, to: Address, amount: Amount) -> bool {
        if amount <= Decimal::ZERO {
            return false;
        }
        let mut balances = self.balances.lock();
        let available = balances.get(&from).copied().unwrap_or(Decimal::ZERO);
        if available < amount {
            tracing::debug!(
                from = %from,
                to = %to,
                amount = %amount,
                available = %available,
                "Ledger transfer refused: insufficient balance"
            );
            return false;
        }
        *balances.entry(from).or_default() -= amount;
        *balances.entry(to).or_default() += amount;
        true
    }
}
