//! Nullable value transfer: records payouts instead of moving value.

use knomee_types::{Address, ValueTransfer};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

/// An in-memory payout recorder for testing.
///
/// Clones share the same ledger. Call [`fail_next`](Self::fail_next) or
/// [`set_failing`](Self::set_failing) to simulate a transfer that bounces.
#[derive(Clone, Debug, Default)]
pub struct NullTransfer {
    payouts: Arc<Mutex<Vec<(Address, u128)>>>,
    failing: Arc<AtomicBool>,
    fail_once: Arc<AtomicBool>,
}

impl NullTransfer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every successful payout, in order.
    pub fn payouts(&self) -> Vec<(Address, u128)> {
        self.payouts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Sum of successful payouts to `address`.
    pub fn total_paid(&self, address: &Address) -> u128 {
        self.payouts()
            .iter()
            .filter(|(to, _)| to == address)
            .map(|(_, amount)| amount)
            .sum()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Fail only the next transfer.
    pub fn fail_next(&self) {
        self.fail_once.store(true, Ordering::SeqCst);
    }
}

impl ValueTransfer for NullTransfer {
    fn pay(&self, to: &Address, amount: u128) -> Result<(), String> {
        if self.fail_once.swap(false, Ordering::SeqCst) || self.failing.load(Ordering::SeqCst) {
            return Err(format!("transfer of {amount} to {} refused", to.short()));
        }
        self.payouts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((*to, amount));
        Ok(())
    }
}
