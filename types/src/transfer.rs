//! The value-transfer capability.

use crate::address::Address;

/// Moves value out of the engine to a participant.
///
/// Implementations may fail; the caller decides how to roll back.
pub trait ValueTransfer: Send + Sync {
    fn pay(&self, to: &Address, amount: u128) -> Result<(), String>;
}
