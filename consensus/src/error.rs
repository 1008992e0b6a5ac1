use crate::claim::ClaimStatus;
use knomee_governance::GovernanceError;
use knomee_registry::RegistryError;
use knomee_types::{AccessDenied, Address, ClaimId, ClaimType, ErrorKind, IdentityTier, Timestamp, TypeError};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConsensusError {
    // ── Validation ──────────────────────────────────────────────────────
    #[error("justification must not be empty")]
    EmptyJustification,

    #[error("justification too long: {len} bytes (max {max})")]
    JustificationTooLong { len: usize, max: usize },

    #[error("platform label must be 1..={max} bytes, got {len}")]
    InvalidPlatform { len: usize, max: usize },

    #[error("insufficient stake: needed {needed}, provided {provided}")]
    InsufficientStake { needed: u128, provided: u128 },

    #[error("an address cannot be linked to itself")]
    CannotLinkToSelf,

    #[error("an address cannot challenge itself")]
    CannotChallengeSelf,

    #[error("a claimant cannot vouch on their own claim")]
    CannotVouchOwnClaim,

    #[error("an accused address cannot vouch on the duplicate flag against it")]
    CannotVouchOnOwnChallenge,

    #[error("claim {0} not found")]
    ClaimNotFound(ClaimId),

    #[error(transparent)]
    Type(#[from] TypeError),

    // ── Authorization ───────────────────────────────────────────────────
    #[error("unauthorized: {0}")]
    Unauthorized(#[from] AccessDenied),

    #[error("tier {0} has no voting rights")]
    InsufficientVotingWeight(IdentityTier),

    // ── State ───────────────────────────────────────────────────────────
    #[error("claim {claim_id} is {status}, not active")]
    ClaimNotActive { claim_id: ClaimId, status: ClaimStatus },

    #[error("claim {0} has expired")]
    ClaimExpired(ClaimId),

    #[error("claim {0} is still within its voting period")]
    ClaimNotReadyToResolve(ClaimId),

    #[error("claim {0} is still active")]
    ClaimStillActive(ClaimId),

    #[error("{voucher} already vouched on claim {claim_id}")]
    AlreadyVoted { claim_id: ClaimId, voucher: Address },

    #[error("{claim_type} cooldown active until {until}")]
    CooldownActive { claim_type: ClaimType, until: Timestamp },

    #[error("{0} is under duplicate challenge")]
    AddressUnderChallenge(Address),

    #[error("{0} is already primary or above")]
    AlreadyPrimary(Address),

    #[error("{address} is already linked to {primary}")]
    AlreadyLinked { address: Address, primary: Address },

    #[error("{0} does not have primary tier")]
    NotAPrimaryId(Address),

    #[error("{0} is unverified and cannot be flagged as a duplicate")]
    TargetUnverified(Address),

    #[error("{caller} has nothing to collect on claim {claim_id}")]
    NoRewardsAvailable { claim_id: ClaimId, caller: Address },

    #[error("{caller} already collected rewards on claim {claim_id}")]
    RewardsAlreadyClaimed { claim_id: ClaimId, caller: Address },

    #[error("payout of {amount} to {recipient} failed: {reason}")]
    TransferFailed {
        recipient: Address,
        amount: u128,
        reason: String,
    },

    #[error("arithmetic overflow")]
    ArithmeticOverflow,

    // ── Reentrancy ──────────────────────────────────────────────────────
    #[error("re-entrant call into the consensus engine")]
    Reentrancy,

    // ── Wrapped ─────────────────────────────────────────────────────────
    #[error("governance: {0}")]
    Governance(#[from] GovernanceError),

    #[error("registry: {0}")]
    Registry(#[from] RegistryError),
}

impl ConsensusError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::EmptyJustification
            | Self::JustificationTooLong { .. }
            | Self::InvalidPlatform { .. }
            | Self::InsufficientStake { .. }
            | Self::CannotLinkToSelf
            | Self::CannotChallengeSelf
            | Self::CannotVouchOwnClaim
            | Self::CannotVouchOnOwnChallenge
            | Self::ClaimNotFound(_)
            | Self::Type(_) => ErrorKind::Validation,
            Self::Unauthorized(_) | Self::InsufficientVotingWeight(_) => ErrorKind::Authorization,
            Self::Reentrancy => ErrorKind::Reentrancy,
            Self::Governance(e) => e.kind(),
            Self::Registry(e) => e.kind(),
            _ => ErrorKind::State,
        }
    }
}
