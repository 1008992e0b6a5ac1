//! Pure tally steps: fold a vouch into a claim, then decide whether it resolves.
//!
//! Neither function touches engine state. The engine runs them back to back
//! on every vouch so approval settles in the same call that crosses the line.

use crate::claim::{ClaimStatus, IdentityClaim, Vouch};
use crate::error::ConsensusError;
use serde::{Deserialize, Serialize};

/// How an active claim ends.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Resolution {
    Approved,
    Rejected,
    Expired,
}

impl Resolution {
    pub fn status(self) -> ClaimStatus {
        match self {
            Self::Approved => ClaimStatus::Approved,
            Self::Rejected => ClaimStatus::Rejected,
            Self::Expired => ClaimStatus::Expired,
        }
    }
}

/// Return `claim` with `vouch` counted.
///
/// Checks only what the claim itself can tell: it is active, the voucher is
/// not the claimant, and the tallies do not overflow. Duplicate-voucher and
/// expiry checks need engine context and happen before this is called.
pub fn apply_vouch(claim: &IdentityClaim, vouch: &Vouch) -> Result<IdentityClaim, ConsensusError> {
    if !claim.is_active() {
        return Err(ConsensusError::ClaimNotActive {
            claim_id: claim.id,
            status: claim.status,
        });
    }
    if vouch.voucher == claim.claimant {
        return Err(ConsensusError::CannotVouchOwnClaim);
    }
    if claim.accused() == Some(vouch.voucher) {
        return Err(ConsensusError::CannotVouchOnOwnChallenge);
    }

    let mut next = claim.clone();
    let (count, weighted) = if vouch.support {
        (&mut next.vouches_for, &mut next.weighted_for)
    } else {
        (&mut next.vouches_against, &mut next.weighted_against)
    };
    *count = count.checked_add(1).ok_or(ConsensusError::ArithmeticOverflow)?;
    *weighted = weighted
        .checked_add(vouch.weight)
        .ok_or(ConsensusError::ArithmeticOverflow)?;
    next.weighted_for
        .checked_add(next.weighted_against)
        .ok_or(ConsensusError::ArithmeticOverflow)?;
    Ok(next)
}

/// Approve once the supporting share reaches `threshold_bps` (inclusive).
///
/// There is no opposing threshold while voting is open; rejection is decided
/// at expiry by [`evaluate_expiry`].
pub fn evaluate_threshold(claim: &IdentityClaim, threshold_bps: u32) -> Option<Resolution> {
    if claim.total_weight() > 0 && claim.for_bps() >= threshold_bps {
        Some(Resolution::Approved)
    } else {
        None
    }
}

/// Outcome of a claim whose voting window has closed.
///
/// No vouches: expired. Otherwise the supporting side still wins if it holds
/// the threshold, the opposing side wins if it holds the same threshold, and
/// anything in between expires with every stake refunded.
pub fn evaluate_expiry(claim: &IdentityClaim, threshold_bps: u32) -> Resolution {
    if claim.total_weight() == 0 {
        return Resolution::Expired;
    }
    if let Some(resolution) = evaluate_threshold(claim, threshold_bps) {
        return resolution;
    }
    if claim.against_bps() >= threshold_bps {
        Resolution::Rejected
    } else {
        Resolution::Expired
    }
}
