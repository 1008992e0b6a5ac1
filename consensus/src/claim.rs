//! Claims and vouches.

use knomee_types::{ratio_bps, Address, ClaimId, ClaimType, Timestamp};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle of a claim. `Active` is the only non-terminal state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClaimStatus {
    Active,
    Approved,
    Rejected,
    Expired,
}

impl ClaimStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Active)
    }

    /// Rejected or expired: the outcomes that start a resubmission cooldown.
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Rejected | Self::Expired)
    }
}

impl fmt::Display for ClaimStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Active => "active",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Expired => "expired",
        };
        f.write_str(name)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityClaim {
    pub id: ClaimId,
    pub claimant: Address,
    pub claim_type: ClaimType,
    pub status: ClaimStatus,
    /// Link target for `LinkToPrimary`, the accused address for `DuplicateFlag`.
    pub target_address: Option<Address>,
    pub platform: Option<String>,
    /// Justification, or evidence for a duplicate flag.
    pub justification: String,
    pub stake_amount: u128,
    pub vouches_for: u64,
    pub vouches_against: u64,
    pub weighted_for: u64,
    pub weighted_against: u64,
    pub created_at: Timestamp,
    pub expires_at: Timestamp,
    pub resolved_at: Option<Timestamp>,
}

impl IdentityClaim {
    pub fn is_active(&self) -> bool {
        self.status == ClaimStatus::Active
    }

    /// The voting window is closed once `now` is past `expires_at`.
    pub fn is_expired_at(&self, now: Timestamp) -> bool {
        now > self.expires_at
    }

    /// The address a duplicate flag accuses, if this is one.
    pub fn accused(&self) -> Option<Address> {
        match self.claim_type {
            ClaimType::DuplicateFlag => self.target_address,
            ClaimType::LinkToPrimary | ClaimType::NewPrimary => None,
        }
    }

    pub fn total_weight(&self) -> u64 {
        self.weighted_for.saturating_add(self.weighted_against)
    }

    /// Supporting share of the weighted tally, truncated.
    pub fn for_bps(&self) -> u32 {
        ratio_bps(self.weighted_for as u128, self.total_weight() as u128)
    }

    /// Opposing share of the weighted tally, truncated.
    pub fn against_bps(&self) -> u32 {
        ratio_bps(self.weighted_against as u128, self.total_weight() as u128)
    }
}

/// A staked vote on a claim. Never changes once recorded.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vouch {
    pub claim_id: ClaimId,
    pub voucher: Address,
    pub support: bool,
    /// The voucher's tier weight when the vouch was cast.
    pub weight: u64,
    pub stake_amount: u128,
    pub vouched_at: Timestamp,
}
