//! Thread-safe front door to the engine.
//!
//! Serializes every call behind one lock and pays rewards through a
//! [`ValueTransfer`]. A transfer that calls back into the service on the same
//! thread gets [`ConsensusError::Reentrancy`] instead of a deadlock, and a
//! failed transfer rolls the withdrawal back.

use crate::claim::ClaimStatus;
use crate::engine::{EngineSnapshot, IdentityConsensus};
use crate::error::ConsensusError;
use crate::events::ConsensusEvent;
use knomee_types::{Address, ClaimId, Clock, ValueTransfer};
use std::ops::{Deref, DerefMut};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::thread::{self, ThreadId};

pub struct IdentityService<C: Clock, T: ValueTransfer> {
    engine: Mutex<IdentityConsensus<C>>,
    /// Thread currently inside an entry point.
    holder: Mutex<Option<ThreadId>>,
    transfer: T,
}

/// Exclusive access to the engine for the duration of one call.
struct CallGuard<'a, C: Clock> {
    engine: MutexGuard<'a, IdentityConsensus<C>>,
    holder: &'a Mutex<Option<ThreadId>>,
}

impl<C: Clock> Deref for CallGuard<'_, C> {
    type Target = IdentityConsensus<C>;

    fn deref(&self) -> &Self::Target {
        &self.engine
    }
}

impl<C: Clock> DerefMut for CallGuard<'_, C> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.engine
    }
}

impl<C: Clock> Drop for CallGuard<'_, C> {
    fn drop(&mut self) {
        // Runs before the engine guard is released.
        *self.holder.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

impl<C: Clock, T: ValueTransfer> IdentityService<C, T> {
    pub fn new(engine: IdentityConsensus<C>, transfer: T) -> Self {
        Self {
            engine: Mutex::new(engine),
            holder: Mutex::new(None),
            transfer,
        }
    }

    pub fn transfer(&self) -> &T {
        &self.transfer
    }

    fn enter(&self) -> Result<CallGuard<'_, C>, ConsensusError> {
        let me = thread::current().id();
        if *self.holder.lock().unwrap_or_else(PoisonError::into_inner) == Some(me) {
            tracing::warn!("re-entrant call rejected");
            return Err(ConsensusError::Reentrancy);
        }
        let engine = self.engine.lock().unwrap_or_else(PoisonError::into_inner);
        *self.holder.lock().unwrap_or_else(PoisonError::into_inner) = Some(me);
        Ok(CallGuard {
            engine,
            holder: &self.holder,
        })
    }

    /// Run a read-only query against the engine.
    pub fn read<R>(&self, f: impl FnOnce(&IdentityConsensus<C>) -> R) -> Result<R, ConsensusError> {
        let guard = self.enter()?;
        Ok(f(&guard))
    }

    /// Run a fallible engine call under the guard.
    pub fn with_engine<R>(
        &self,
        f: impl FnOnce(&mut IdentityConsensus<C>) -> Result<R, ConsensusError>,
    ) -> Result<R, ConsensusError> {
        let mut guard = self.enter()?;
        f(&mut guard)
    }

    pub fn request_primary_verification(
        &self,
        caller: &Address,
        justification: &str,
        stake: u128,
    ) -> Result<ClaimId, ConsensusError> {
        self.enter()?
            .request_primary_verification(caller, justification, stake)
    }

    pub fn request_link_to_primary(
        &self,
        caller: &Address,
        primary: &Address,
        platform: &str,
        justification: &str,
        stake: u128,
    ) -> Result<ClaimId, ConsensusError> {
        self.enter()?
            .request_link_to_primary(caller, primary, platform, justification, stake)
    }

    pub fn challenge_duplicate(
        &self,
        caller: &Address,
        suspected: &Address,
        evidence: &str,
        stake: u128,
    ) -> Result<ClaimId, ConsensusError> {
        self.enter()?
            .challenge_duplicate(caller, suspected, evidence, stake)
    }

    pub fn vouch_for(
        &self,
        caller: &Address,
        claim_id: ClaimId,
        stake: u128,
    ) -> Result<ClaimStatus, ConsensusError> {
        self.enter()?.vouch_for(caller, claim_id, stake)
    }

    pub fn vouch_against(
        &self,
        caller: &Address,
        claim_id: ClaimId,
        stake: u128,
    ) -> Result<ClaimStatus, ConsensusError> {
        self.enter()?.vouch_against(caller, claim_id, stake)
    }

    pub fn resolve_consensus(&self, claim_id: ClaimId) -> Result<ClaimStatus, ConsensusError> {
        self.enter()?.resolve_consensus(claim_id)
    }

    pub fn expire_claims(&self) -> Result<Vec<(ClaimId, ClaimStatus)>, ConsensusError> {
        Ok(self.enter()?.expire_claims())
    }

    /// Pay the caller's settlement on `claim_id` through the transfer.
    ///
    /// The withdrawal is marked before the transfer runs and rolled back if it
    /// fails, so the caller can retry.
    pub fn claim_rewards(&self, caller: &Address, claim_id: ClaimId) -> Result<u128, ConsensusError> {
        let mut engine = self.enter()?;
        let amount = engine.begin_withdrawal(caller, claim_id)?;
        match self.transfer.pay(caller, amount) {
            Ok(()) => {
                engine.complete_withdrawal(claim_id, *caller, amount);
                Ok(amount)
            }
            Err(reason) => {
                engine.abort_withdrawal(claim_id, caller);
                Err(ConsensusError::TransferFailed {
                    recipient: *caller,
                    amount,
                    reason,
                })
            }
        }
    }

    pub fn warp_time(&self, caller: &Address, delta_secs: u64) -> Result<u64, ConsensusError> {
        self.enter()?.warp_time(caller, delta_secs)
    }

    pub fn renounce_god_mode(&self, caller: &Address) -> Result<(), ConsensusError> {
        self.enter()?.renounce_god_mode(caller)
    }

    pub fn drain_events(&self) -> Result<Vec<ConsensusEvent>, ConsensusError> {
        Ok(self.enter()?.drain_events())
    }

    pub fn snapshot(&self) -> Result<EngineSnapshot, ConsensusError> {
        self.read(IdentityConsensus::snapshot)
    }

    /// Give back the engine.
    pub fn into_inner(self) -> IdentityConsensus<C> {
        self.engine
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
