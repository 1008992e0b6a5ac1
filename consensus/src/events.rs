//! Events the engine appends per call for subscribers to drain.

use crate::claim::ClaimStatus;
use knomee_governance::ParamSection;
use knomee_types::{Address, ClaimId, ClaimType, Timestamp};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConsensusEvent {
    ClaimCreated {
        claim_id: ClaimId,
        claimant: Address,
        claim_type: ClaimType,
        target: Option<Address>,
        stake: u128,
        expires_at: Timestamp,
    },
    VouchRecorded {
        claim_id: ClaimId,
        voucher: Address,
        support: bool,
        weight: u64,
        stake: u128,
    },
    ClaimResolved {
        claim_id: ClaimId,
        status: ClaimStatus,
        weighted_for: u64,
        weighted_against: u64,
        burned: u128,
    },
    /// A tier change that no longer applied when the claim resolved.
    TierChangeSkipped {
        claim_id: ClaimId,
        address: Address,
        reason: String,
    },
    RewardsPaid {
        claim_id: ClaimId,
        recipient: Address,
        amount: u128,
    },
    ParametersUpdated {
        section: ParamSection,
    },
    TimeWarped {
        delta_secs: u64,
        total_secs: u64,
    },
    GodModeRenounced,
    OraclePromoted {
        address: Address,
    },
}

impl ConsensusEvent {
    /// Short label for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::ClaimCreated { .. } => "claim_created",
            Self::VouchRecorded { .. } => "vouch_recorded",
            Self::ClaimResolved { .. } => "claim_resolved",
            Self::TierChangeSkipped { .. } => "tier_change_skipped",
            Self::RewardsPaid { .. } => "rewards_paid",
            Self::ParametersUpdated { .. } => "parameters_updated",
            Self::TimeWarped { .. } => "time_warped",
            Self::GodModeRenounced => "god_mode_renounced",
            Self::OraclePromoted { .. } => "oracle_promoted",
        }
    }

    /// The claim this event concerns, if any.
    pub fn claim_id(&self) -> Option<ClaimId> {
        match self {
            Self::ClaimCreated { claim_id, .. }
            | Self::VouchRecorded { claim_id, .. }
            | Self::ClaimResolved { claim_id, .. }
            | Self::TierChangeSkipped { claim_id, .. }
            | Self::RewardsPaid { claim_id, .. } => Some(*claim_id),
            _ => None,
        }
    }
}
