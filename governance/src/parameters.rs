//! The governance parameter store.

use crate::error::GovernanceError;
use crate::params::{
    Cooldowns, DecayRates, GovernanceParams, Slashing, Staking, Thresholds, VotingWeights,
};
use knomee_types::{AccessPolicy, Address, ClaimType, IdentityTier, Role, Timestamp};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which section of the parameter set a setter touched.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParamSection {
    Thresholds,
    Staking,
    Slashing,
    VotingWeights,
    Cooldowns,
    DecayRates,
}

impl fmt::Display for ParamSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Thresholds => "thresholds",
            Self::Staking => "staking",
            Self::Slashing => "slashing",
            Self::VotingWeights => "voting_weights",
            Self::Cooldowns => "cooldowns",
            Self::DecayRates => "decay_rates",
        };
        f.write_str(name)
    }
}

/// Singleton parameter store for one deployment.
///
/// Holds the validated [`GovernanceParams`], the governor set, and the god-mode
/// state. The store never reads the clock itself: [`current_time`](Self::current_time)
/// layers the warp offset on top of whatever real time the caller supplies.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GovernanceParameters {
    params: GovernanceParams,
    policy: AccessPolicy,
    god_mode_active: bool,
    time_warp_secs: u64,
}

impl GovernanceParameters {
    /// Create the store with a single governor.
    ///
    /// With `god_mode_authority = None` the deployment starts with god mode
    /// already renounced.
    pub fn new(
        governor: Address,
        god_mode_authority: Option<Address>,
        params: GovernanceParams,
    ) -> Result<Self, GovernanceError> {
        params.validate()?;
        let mut policy = AccessPolicy::new().with(Role::Governor, governor);
        if let Some(god) = god_mode_authority {
            policy.grant(Role::GodMode, god);
        }
        Ok(Self {
            params,
            policy,
            god_mode_active: god_mode_authority.is_some(),
            time_warp_secs: 0,
        })
    }

    pub fn params(&self) -> &GovernanceParams {
        &self.params
    }

    // ── Governor set ────────────────────────────────────────────────────

    pub fn is_governor(&self, address: &Address) -> bool {
        self.policy.holds(address, Role::Governor)
    }

    pub fn governors(&self) -> Vec<Address> {
        self.policy.holders(Role::Governor).copied().collect()
    }

    /// Fail unless `caller` is a governor.
    pub fn require_governor(&self, caller: &Address) -> Result<(), GovernanceError> {
        Ok(self.policy.check(caller, Role::Governor)?)
    }

    /// Add a governor. Returns false if `new_governor` already was one.
    pub fn grant_governor(
        &mut self,
        caller: &Address,
        new_governor: Address,
    ) -> Result<bool, GovernanceError> {
        self.require_governor(caller)?;
        let added = self.policy.grant(Role::Governor, new_governor);
        if added {
            tracing::info!(governor = %new_governor.short(), "governor granted");
        }
        Ok(added)
    }

    /// Remove a governor. The last governor cannot be removed.
    pub fn revoke_governor(
        &mut self,
        caller: &Address,
        governor: &Address,
    ) -> Result<bool, GovernanceError> {
        self.require_governor(caller)?;
        if !self.policy.holds(governor, Role::Governor) {
            return Ok(false);
        }
        if self.policy.holder_count(Role::Governor) == 1 {
            return Err(GovernanceError::LastGovernor);
        }
        self.policy.revoke(Role::Governor, governor);
        tracing::info!(governor = %governor.short(), "governor revoked");
        Ok(true)
    }

    // ── Clock & god mode ────────────────────────────────────────────────

    pub fn god_mode_active(&self) -> bool {
        self.god_mode_active
    }

    pub fn time_warp_secs(&self) -> u64 {
        self.time_warp_secs
    }

    /// Protocol time: real time plus the warp offset (zero once god mode is renounced).
    pub fn current_time(&self, real: Timestamp) -> Timestamp {
        if self.god_mode_active {
            real.saturating_add(self.time_warp_secs)
        } else {
            real
        }
    }

    /// Move protocol time forward by `delta_secs`. Returns the total offset.
    pub fn warp_time(&mut self, caller: &Address, delta_secs: u64) -> Result<u64, GovernanceError> {
        self.policy.check(caller, Role::GodMode)?;
        if !self.god_mode_active {
            return Err(GovernanceError::GodModeNotActive);
        }
        self.time_warp_secs = self
            .time_warp_secs
            .checked_add(delta_secs)
            .ok_or(GovernanceError::WarpOverflow)?;
        tracing::debug!(delta_secs, total = self.time_warp_secs, "time warped");
        Ok(self.time_warp_secs)
    }

    /// Permanently disable god mode and clear the warp offset.
    pub fn renounce_god_mode(&mut self, caller: &Address) -> Result<(), GovernanceError> {
        self.policy.check(caller, Role::GodMode)?;
        if !self.god_mode_active {
            return Err(GovernanceError::GodModeAlreadyRenounced);
        }
        self.god_mode_active = false;
        self.time_warp_secs = 0;
        tracing::info!("god mode renounced, time warp disabled");
        Ok(())
    }

    // ── Setters ─────────────────────────────────────────────────────────

    pub fn set_thresholds(&mut self, caller: &Address, value: Thresholds) -> Result<(), GovernanceError> {
        self.require_governor(caller)?;
        value.validate()?;
        self.params.thresholds = value;
        self.log_update(ParamSection::Thresholds);
        Ok(())
    }

    pub fn set_staking(&mut self, caller: &Address, value: Staking) -> Result<(), GovernanceError> {
        self.require_governor(caller)?;
        value.validate()?;
        self.params.staking = value;
        self.log_update(ParamSection::Staking);
        Ok(())
    }

    pub fn set_slashing(&mut self, caller: &Address, value: Slashing) -> Result<(), GovernanceError> {
        self.require_governor(caller)?;
        value.validate()?;
        self.params.slashing = value;
        self.log_update(ParamSection::Slashing);
        Ok(())
    }

    pub fn set_voting_weights(
        &mut self,
        caller: &Address,
        value: VotingWeights,
    ) -> Result<(), GovernanceError> {
        self.require_governor(caller)?;
        value.validate()?;
        self.params.voting_weights = value;
        self.log_update(ParamSection::VotingWeights);
        Ok(())
    }

    pub fn set_cooldowns(&mut self, caller: &Address, value: Cooldowns) -> Result<(), GovernanceError> {
        self.require_governor(caller)?;
        value.validate()?;
        self.params.cooldowns = value;
        self.log_update(ParamSection::Cooldowns);
        Ok(())
    }

    pub fn set_decay_rates(&mut self, caller: &Address, value: DecayRates) -> Result<(), GovernanceError> {
        self.require_governor(caller)?;
        value.validate()?;
        self.params.decay = value;
        self.log_update(ParamSection::DecayRates);
        Ok(())
    }

    fn log_update(&self, section: ParamSection) {
        tracing::info!(%section, "governance parameters updated");
    }

    // ── Derived views ───────────────────────────────────────────────────

    pub fn required_stake(&self, claim_type: ClaimType) -> u128 {
        self.params.staking.required(claim_type)
    }

    pub fn min_stake(&self) -> u128 {
        self.params.staking.min_stake as u128
    }

    pub fn threshold(&self, claim_type: ClaimType) -> u32 {
        self.params.thresholds.for_claim(claim_type)
    }

    pub fn slash_rate(&self, claim_type: ClaimType) -> u32 {
        self.params.slashing.for_claim(claim_type)
    }

    /// Slash rate for the losing side once a claim is decided.
    ///
    /// A confirmed duplicate uses the Sybil rate.
    pub fn outcome_slash_rate(&self, claim_type: ClaimType, sybil_confirmed: bool) -> u32 {
        if sybil_confirmed && claim_type == ClaimType::DuplicateFlag {
            self.params.slashing.sybil_bps
        } else {
            self.slash_rate(claim_type)
        }
    }

    pub fn cooldown(&self, claim_type: ClaimType) -> u64 {
        self.params.cooldowns.for_claim(claim_type)
    }

    pub fn claim_expiry_secs(&self) -> u64 {
        self.params.cooldowns.claim_expiry_secs
    }

    /// Vote weight for a tier, or `None` if the tier has no voting rights.
    ///
    /// The decay rates are stored and validated but do not reduce the weight.
    pub fn vote_weight(&self, tier: IdentityTier) -> Option<u64> {
        let weights = self.params.voting_weights;
        match tier {
            IdentityTier::Oracle => Some(weights.oracle),
            IdentityTier::Primary => Some(weights.primary),
            IdentityTier::Unverified | IdentityTier::Linked => None,
        }
    }
}
