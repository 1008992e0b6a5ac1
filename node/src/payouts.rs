//! Credits owed to participants after `claim_rewards`.

use knomee_types::{Address, ValueTransfer};
use std::collections::BTreeMap;
use std::sync::{Mutex, PoisonError};

/// The node's value transfer: payouts accumulate as per-address credits.
///
/// Moving credits into wallets is left to the operator's tooling; the ledger
/// is persisted with the engine snapshot so nothing owed is lost on restart.
#[derive(Debug, Default)]
pub struct PayoutLedger {
    credits: Mutex<BTreeMap<Address, u128>>,
}

impl PayoutLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_balances(credits: BTreeMap<Address, u128>) -> Self {
        Self {
            credits: Mutex::new(credits),
        }
    }

    pub fn balance(&self, address: &Address) -> u128 {
        self.lock().get(address).copied().unwrap_or(0)
    }

    pub fn balances(&self) -> BTreeMap<Address, u128> {
        self.lock().clone()
    }

    /// Sum of all outstanding credits.
    pub fn total(&self) -> u128 {
        self.lock().values().fold(0u128, |acc, v| acc.saturating_add(*v))
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<Address, u128>> {
        self.credits.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ValueTransfer for PayoutLedger {
    fn pay(&self, to: &Address, amount: u128) -> Result<(), String> {
        let mut credits = self.lock();
        let balance = credits.entry(*to).or_insert(0);
        *balance = balance
            .checked_add(amount)
            .ok_or_else(|| format!("credit overflow for {}", to.short()))?;
        tracing::debug!(recipient = %to.short(), amount = %amount, "payout credited");
        Ok(())
    }
}
