//! Governance parameter sections.
//!
//! Each section maps to one governance setter and validates its own invariants.
//! All rates are basis points (10000 = 100%); durations are seconds; stakes are
//! raw base units.

use crate::error::GovernanceError;
use knomee_types::{ClaimType, BASIS_POINTS, SECONDS_PER_DAY};
use serde::{Deserialize, Serialize};

/// Lowest accepted consensus threshold (51%).
pub const MIN_THRESHOLD_BPS: u32 = 5100;

pub const DEFAULT_LINK_THRESHOLD_BPS: u32 = 5100;
pub const DEFAULT_PRIMARY_THRESHOLD_BPS: u32 = 6700;
pub const DEFAULT_DUPLICATE_THRESHOLD_BPS: u32 = 8000;

/// 0.01 of a 9-decimal token.
pub const DEFAULT_MIN_STAKE: u64 = 10_000_000;
pub const DEFAULT_PRIMARY_STAKE_MULTIPLIER: u32 = 3;
pub const DEFAULT_DUPLICATE_STAKE_MULTIPLIER: u32 = 10;

pub const DEFAULT_LINK_SLASH_BPS: u32 = 1000;
pub const DEFAULT_PRIMARY_SLASH_BPS: u32 = 3000;
pub const DEFAULT_DUPLICATE_SLASH_BPS: u32 = 5000;
pub const DEFAULT_SYBIL_SLASH_BPS: u32 = 10_000;

pub const DEFAULT_PRIMARY_VOTE_WEIGHT: u64 = 1;
pub const DEFAULT_ORACLE_VOTE_WEIGHT: u64 = 100;

pub const DEFAULT_FAILED_CLAIM_COOLDOWN_SECS: u64 = 7 * SECONDS_PER_DAY;
pub const DEFAULT_DUPLICATE_FLAG_COOLDOWN_SECS: u64 = 30 * SECONDS_PER_DAY;
pub const DEFAULT_CLAIM_EXPIRY_SECS: u64 = 30 * SECONDS_PER_DAY;

pub const DEFAULT_ORACLE_DECAY_BPS_PER_DAY: u32 = 10;
pub const DEFAULT_ADMIN_DECAY_BPS_PER_DAY: u32 = 50;

/// Consensus thresholds per claim type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    pub link_bps: u32,
    pub primary_bps: u32,
    pub duplicate_bps: u32,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            link_bps: DEFAULT_LINK_THRESHOLD_BPS,
            primary_bps: DEFAULT_PRIMARY_THRESHOLD_BPS,
            duplicate_bps: DEFAULT_DUPLICATE_THRESHOLD_BPS,
        }
    }
}

impl Thresholds {
    pub fn validate(&self) -> Result<(), GovernanceError> {
        for (which, value) in [
            ("link", self.link_bps),
            ("primary", self.primary_bps),
            ("duplicate", self.duplicate_bps),
        ] {
            if !(MIN_THRESHOLD_BPS..=BASIS_POINTS).contains(&value) {
                return Err(GovernanceError::InvalidThreshold { which, value });
            }
        }
        Ok(())
    }

    pub fn for_claim(&self, claim_type: ClaimType) -> u32 {
        match claim_type {
            ClaimType::LinkToPrimary => self.link_bps,
            ClaimType::NewPrimary => self.primary_bps,
            ClaimType::DuplicateFlag => self.duplicate_bps,
        }
    }
}

/// Stake requirements. Link claims stake the minimum; the others a multiple of it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Staking {
    pub min_stake: u64,
    pub primary_multiplier: u32,
    pub duplicate_multiplier: u32,
}

impl Default for Staking {
    fn default() -> Self {
        Self {
            min_stake: DEFAULT_MIN_STAKE,
            primary_multiplier: DEFAULT_PRIMARY_STAKE_MULTIPLIER,
            duplicate_multiplier: DEFAULT_DUPLICATE_STAKE_MULTIPLIER,
        }
    }
}

impl Staking {
    pub fn validate(&self) -> Result<(), GovernanceError> {
        if self.min_stake == 0 {
            return Err(GovernanceError::InvalidMinStake);
        }
        if self.primary_multiplier < 1 || self.duplicate_multiplier < self.primary_multiplier {
            return Err(GovernanceError::InvalidStakeMultiplier {
                primary: self.primary_multiplier,
                duplicate: self.duplicate_multiplier,
            });
        }
        Ok(())
    }

    pub fn multiplier(&self, claim_type: ClaimType) -> u32 {
        match claim_type {
            ClaimType::LinkToPrimary => 1,
            ClaimType::NewPrimary => self.primary_multiplier,
            ClaimType::DuplicateFlag => self.duplicate_multiplier,
        }
    }

    pub fn required(&self, claim_type: ClaimType) -> u128 {
        self.min_stake as u128 * self.multiplier(claim_type) as u128
    }
}

/// Slash rates applied to the losing side of a resolved claim.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Slashing {
    pub link_bps: u32,
    pub primary_bps: u32,
    pub duplicate_bps: u32,
    /// Applied instead of `duplicate_bps` when a duplicate flag is confirmed.
    pub sybil_bps: u32,
}

impl Default for Slashing {
    fn default() -> Self {
        Self {
            link_bps: DEFAULT_LINK_SLASH_BPS,
            primary_bps: DEFAULT_PRIMARY_SLASH_BPS,
            duplicate_bps: DEFAULT_DUPLICATE_SLASH_BPS,
            sybil_bps: DEFAULT_SYBIL_SLASH_BPS,
        }
    }
}

impl Slashing {
    pub fn validate(&self) -> Result<(), GovernanceError> {
        for (which, value) in [
            ("link", self.link_bps),
            ("primary", self.primary_bps),
            ("duplicate", self.duplicate_bps),
            ("sybil", self.sybil_bps),
        ] {
            if value > BASIS_POINTS {
                return Err(GovernanceError::InvalidSlashRate { which, value });
            }
        }
        Ok(())
    }

    pub fn for_claim(&self, claim_type: ClaimType) -> u32 {
        match claim_type {
            ClaimType::LinkToPrimary => self.link_bps,
            ClaimType::NewPrimary => self.primary_bps,
            ClaimType::DuplicateFlag => self.duplicate_bps,
        }
    }
}

/// Vote weight per voting tier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VotingWeights {
    pub primary: u64,
    pub oracle: u64,
}

impl Default for VotingWeights {
    fn default() -> Self {
        Self {
            primary: DEFAULT_PRIMARY_VOTE_WEIGHT,
            oracle: DEFAULT_ORACLE_VOTE_WEIGHT,
        }
    }
}

impl VotingWeights {
    pub fn validate(&self) -> Result<(), GovernanceError> {
        if self.primary < 1 || self.oracle < self.primary {
            return Err(GovernanceError::InvalidVoteWeight {
                primary: self.primary,
                oracle: self.oracle,
            });
        }
        Ok(())
    }
}

/// Cooldowns and claim lifetime, in seconds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Cooldowns {
    pub failed_claim_secs: u64,
    pub duplicate_flag_secs: u64,
    pub claim_expiry_secs: u64,
}

impl Default for Cooldowns {
    fn default() -> Self {
        Self {
            failed_claim_secs: DEFAULT_FAILED_CLAIM_COOLDOWN_SECS,
            duplicate_flag_secs: DEFAULT_DUPLICATE_FLAG_COOLDOWN_SECS,
            claim_expiry_secs: DEFAULT_CLAIM_EXPIRY_SECS,
        }
    }
}

impl Cooldowns {
    pub fn validate(&self) -> Result<(), GovernanceError> {
        if self.claim_expiry_secs == 0 {
            return Err(GovernanceError::InvalidCooldown);
        }
        Ok(())
    }

    pub fn for_claim(&self, claim_type: ClaimType) -> u64 {
        match claim_type {
            ClaimType::LinkToPrimary | ClaimType::NewPrimary => self.failed_claim_secs,
            ClaimType::DuplicateFlag => self.duplicate_flag_secs,
        }
    }
}

/// Weight decay, basis points per day.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecayRates {
    pub oracle_bps_per_day: u32,
    pub admin_bps_per_day: u32,
}

impl Default for DecayRates {
    fn default() -> Self {
        Self {
            oracle_bps_per_day: DEFAULT_ORACLE_DECAY_BPS_PER_DAY,
            admin_bps_per_day: DEFAULT_ADMIN_DECAY_BPS_PER_DAY,
        }
    }
}

impl DecayRates {
    pub fn validate(&self) -> Result<(), GovernanceError> {
        for (which, value) in [
            ("oracle", self.oracle_bps_per_day),
            ("admin", self.admin_bps_per_day),
        ] {
            if value > BASIS_POINTS {
                return Err(GovernanceError::InvalidDecayRate { which, value });
            }
        }
        Ok(())
    }
}

/// The full parameter set.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GovernanceParams {
    pub thresholds: Thresholds,
    pub staking: Staking,
    pub slashing: Slashing,
    pub voting_weights: VotingWeights,
    pub cooldowns: Cooldowns,
    pub decay: DecayRates,
}

impl GovernanceParams {
    pub fn validate(&self) -> Result<(), GovernanceError> {
        self.thresholds.validate()?;
        self.staking.validate()?;
        self.slashing.validate()?;
        self.voting_weights.validate()?;
        self.cooldowns.validate()?;
        self.decay.validate()
    }
}
