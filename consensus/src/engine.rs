//! The identity consensus engine.
//!
//! Ties claim submission, weighted vouching, resolution, settlement and the
//! registry's tier transitions into one state machine. Every public mutator
//! validates completely before it writes, so a failed call leaves no trace.

use crate::claim::{ClaimStatus, IdentityClaim, Vouch};
use crate::error::ConsensusError;
use crate::events::ConsensusEvent;
use crate::settlement::{compute_settlement, Settlement};
use crate::tally::{apply_vouch, evaluate_expiry, evaluate_threshold, Resolution};
use knomee_governance::{
    Cooldowns, DecayRates, GovernanceParameters, ParamSection, Slashing, Staking, Thresholds,
    VotingWeights,
};
use knomee_registry::{Identity, IdentityRegistry, RegistryError, MAX_PLATFORM_LEN};
use knomee_types::{Address, ClaimId, ClaimType, Clock, IdentityTier, Timestamp};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Maximum justification length for link and primary claims, in bytes.
pub const MAX_JUSTIFICATION_LEN: usize = 500;

/// Maximum evidence length for duplicate flags, in bytes.
pub const MAX_EVIDENCE_LEN: usize = 1000;

/// A claim with everything recorded against it.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ClaimRecord {
    pub claim: IdentityClaim,
    pub vouches: Vec<Vouch>,
    /// Set once, when the claim leaves `Active`.
    pub settlement: Option<Settlement>,
    /// Participants who already collected their payout.
    pub withdrawn: BTreeSet<Address>,
}

/// Serializable engine state for persistence across restarts.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EngineSnapshot {
    pub address: Address,
    pub governance: GovernanceParameters,
    pub registry: IdentityRegistry,
    pub claims: BTreeMap<ClaimId, ClaimRecord>,
    pub next_claim_id: ClaimId,
    pub last_failed: BTreeMap<(Address, ClaimType), Timestamp>,
    pub burned_total: u128,
}

struct NewClaim<'a> {
    claimant: Address,
    claim_type: ClaimType,
    target: Option<Address>,
    platform: Option<&'a str>,
    justification: &'a str,
    stake: u128,
}

pub struct IdentityConsensus<C: Clock> {
    /// The engine's own identity: the registry's only writer.
    address: Address,
    governance: GovernanceParameters,
    registry: IdentityRegistry,
    claims: BTreeMap<ClaimId, ClaimRecord>,
    next_claim_id: ClaimId,
    /// (claimant, claim type) → `created_at` of the latest failed claim.
    last_failed: BTreeMap<(Address, ClaimType), Timestamp>,
    burned_total: u128,
    pending_events: Vec<ConsensusEvent>,
    clock: C,
}

impl<C: Clock> IdentityConsensus<C> {
    pub fn new(address: Address, governance: GovernanceParameters, clock: C) -> Self {
        Self::with_registry(address, governance, IdentityRegistry::new(address), clock)
    }

    /// Start from a pre-seeded registry. `registry` must name `address` as its writer.
    pub fn with_registry(
        address: Address,
        governance: GovernanceParameters,
        registry: IdentityRegistry,
        clock: C,
    ) -> Self {
        Self {
            address,
            governance,
            registry,
            claims: BTreeMap::new(),
            next_claim_id: 0,
            last_failed: BTreeMap::new(),
            burned_total: 0,
            pending_events: Vec::new(),
            clock,
        }
    }

    /// Protocol time: the injected clock plus any god-mode warp.
    pub fn now(&self) -> Timestamp {
        self.governance.current_time(self.clock.now())
    }

    // ── Submission ──────────────────────────────────────────────────────

    pub fn request_primary_verification(
        &mut self,
        caller: &Address,
        justification: &str,
        stake: u128,
    ) -> Result<ClaimId, ConsensusError> {
        let now = self.now();
        self.check_submission(caller, ClaimType::NewPrimary, justification, stake, now)?;
        if self.registry.tier(caller).is_primary() {
            return Err(ConsensusError::AlreadyPrimary(*caller));
        }
        self.open_claim(
            NewClaim {
                claimant: *caller,
                claim_type: ClaimType::NewPrimary,
                target: None,
                platform: None,
                justification,
                stake,
            },
            now,
        )
    }

    pub fn request_link_to_primary(
        &mut self,
        caller: &Address,
        primary: &Address,
        platform: &str,
        justification: &str,
        stake: u128,
    ) -> Result<ClaimId, ConsensusError> {
        let now = self.now();
        if platform.is_empty() || platform.len() > MAX_PLATFORM_LEN {
            return Err(ConsensusError::InvalidPlatform {
                len: platform.len(),
                max: MAX_PLATFORM_LEN,
            });
        }
        if caller == primary {
            return Err(ConsensusError::CannotLinkToSelf);
        }
        self.check_submission(caller, ClaimType::LinkToPrimary, justification, stake, now)?;

        let subject = self.registry.get_identity(caller);
        if subject.tier.is_primary() {
            return Err(ConsensusError::AlreadyPrimary(*caller));
        }
        if let Some(existing) = subject.primary_account.filter(|p| p != primary) {
            return Err(ConsensusError::AlreadyLinked {
                address: *caller,
                primary: existing,
            });
        }
        if !self.registry.tier(primary).is_primary() {
            return Err(ConsensusError::NotAPrimaryId(*primary));
        }

        self.open_claim(
            NewClaim {
                claimant: *caller,
                claim_type: ClaimType::LinkToPrimary,
                target: Some(*primary),
                platform: Some(platform),
                justification,
                stake,
            },
            now,
        )
    }

    /// Flag `suspected` as a duplicate identity. `evidence` is the justification.
    pub fn challenge_duplicate(
        &mut self,
        caller: &Address,
        suspected: &Address,
        evidence: &str,
        stake: u128,
    ) -> Result<ClaimId, ConsensusError> {
        let now = self.now();
        if caller == suspected {
            return Err(ConsensusError::CannotChallengeSelf);
        }
        self.check_submission(caller, ClaimType::DuplicateFlag, evidence, stake, now)?;
        if self.registry.tier(suspected) == IdentityTier::Unverified {
            return Err(ConsensusError::TargetUnverified(*suspected));
        }
        if self.registry.is_under_challenge(suspected) {
            return Err(ConsensusError::AddressUnderChallenge(*suspected));
        }

        self.open_claim(
            NewClaim {
                claimant: *caller,
                claim_type: ClaimType::DuplicateFlag,
                target: Some(*suspected),
                platform: None,
                justification: evidence,
                stake,
            },
            now,
        )
    }

    /// Checks shared by every claim type.
    fn check_submission(
        &self,
        claimant: &Address,
        claim_type: ClaimType,
        justification: &str,
        stake: u128,
        now: Timestamp,
    ) -> Result<(), ConsensusError> {
        let max = match claim_type {
            ClaimType::DuplicateFlag => MAX_EVIDENCE_LEN,
            ClaimType::LinkToPrimary | ClaimType::NewPrimary => MAX_JUSTIFICATION_LEN,
        };
        if justification.trim().is_empty() {
            return Err(ConsensusError::EmptyJustification);
        }
        if justification.len() > max {
            return Err(ConsensusError::JustificationTooLong {
                len: justification.len(),
                max,
            });
        }

        let needed = self.governance.required_stake(claim_type);
        if stake < needed {
            return Err(ConsensusError::InsufficientStake {
                needed,
                provided: stake,
            });
        }

        if claim_type != ClaimType::DuplicateFlag && self.registry.is_under_challenge(claimant) {
            return Err(ConsensusError::AddressUnderChallenge(*claimant));
        }

        if let Some(failed_at) = self.last_failed.get(&(*claimant, claim_type)) {
            let cooldown = self.governance.cooldown(claim_type);
            if !failed_at.has_expired(cooldown, now) {
                return Err(ConsensusError::CooldownActive {
                    claim_type,
                    until: failed_at.saturating_add(cooldown),
                });
            }
        }
        Ok(())
    }

    fn open_claim(&mut self, new: NewClaim<'_>, now: Timestamp) -> Result<ClaimId, ConsensusError> {
        let claim_id = self.next_claim_id;
        let next_id = claim_id
            .checked_add(1)
            .ok_or(ConsensusError::ArithmeticOverflow)?;

        if let (ClaimType::DuplicateFlag, Some(target)) = (new.claim_type, new.target) {
            self.registry
                .mark_under_challenge(&self.address, target, claim_id)?;
        }

        let expires_at = now.saturating_add(self.governance.claim_expiry_secs());
        let claim = IdentityClaim {
            id: claim_id,
            claimant: new.claimant,
            claim_type: new.claim_type,
            status: ClaimStatus::Active,
            target_address: new.target,
            platform: new.platform.map(str::to_string),
            justification: new.justification.to_string(),
            stake_amount: new.stake,
            vouches_for: 0,
            vouches_against: 0,
            weighted_for: 0,
            weighted_against: 0,
            created_at: now,
            expires_at,
            resolved_at: None,
        };
        self.claims.insert(
            claim_id,
            ClaimRecord {
                claim,
                vouches: Vec::new(),
                settlement: None,
                withdrawn: BTreeSet::new(),
            },
        );
        self.next_claim_id = next_id;

        tracing::info!(
            claim_id,
            claimant = %new.claimant.short(),
            claim_type = %new.claim_type,
            stake = %new.stake,
            "claim created"
        );
        self.pending_events.push(ConsensusEvent::ClaimCreated {
            claim_id,
            claimant: new.claimant,
            claim_type: new.claim_type,
            target: new.target,
            stake: new.stake,
            expires_at,
        });
        Ok(claim_id)
    }

    // ── Voting ──────────────────────────────────────────────────────────

    /// Vouch in support. Returns the claim's status after the vouch.
    pub fn vouch_for(
        &mut self,
        caller: &Address,
        claim_id: ClaimId,
        stake: u128,
    ) -> Result<ClaimStatus, ConsensusError> {
        self.vouch(caller, claim_id, true, stake)
    }

    /// Vouch in opposition. Returns the claim's status after the vouch.
    pub fn vouch_against(
        &mut self,
        caller: &Address,
        claim_id: ClaimId,
        stake: u128,
    ) -> Result<ClaimStatus, ConsensusError> {
        self.vouch(caller, claim_id, false, stake)
    }

    fn vouch(
        &mut self,
        caller: &Address,
        claim_id: ClaimId,
        support: bool,
        stake: u128,
    ) -> Result<ClaimStatus, ConsensusError> {
        let now = self.now();
        let record = self
            .claims
            .get(&claim_id)
            .ok_or(ConsensusError::ClaimNotFound(claim_id))?;
        let claim = &record.claim;
        if !claim.is_active() {
            return Err(ConsensusError::ClaimNotActive {
                claim_id,
                status: claim.status,
            });
        }
        if claim.is_expired_at(now) {
            self.finalize_if_expired(claim_id, now);
            return Err(ConsensusError::ClaimExpired(claim_id));
        }
        if *caller == claim.claimant {
            return Err(ConsensusError::CannotVouchOwnClaim);
        }
        if claim.accused() == Some(*caller) {
            return Err(ConsensusError::CannotVouchOnOwnChallenge);
        }
        if record.vouches.iter().any(|v| v.voucher == *caller) {
            return Err(ConsensusError::AlreadyVoted {
                claim_id,
                voucher: *caller,
            });
        }
        let needed = self.governance.min_stake();
        if stake < needed {
            return Err(ConsensusError::InsufficientStake {
                needed,
                provided: stake,
            });
        }

        let voter = self.registry.get_identity(caller);
        let weight = self
            .governance
            .vote_weight(voter.tier)
            .ok_or(ConsensusError::InsufficientVotingWeight(voter.tier))?;

        let vouch = Vouch {
            claim_id,
            voucher: *caller,
            support,
            weight,
            stake_amount: stake,
            vouched_at: now,
        };
        let updated = apply_vouch(claim, &vouch)?;
        let resolution = evaluate_threshold(&updated, self.governance.threshold(updated.claim_type));

        self.registry
            .record_vouch(&self.address, *caller, updated.claimant, support)?;
        if let Some(record) = self.claims.get_mut(&claim_id) {
            record.claim = updated;
            record.vouches.push(vouch);
        }

        tracing::info!(
            claim_id,
            voucher = %caller.short(),
            support,
            weight,
            stake = %stake,
            "vouch recorded"
        );
        self.pending_events.push(ConsensusEvent::VouchRecorded {
            claim_id,
            voucher: *caller,
            support,
            weight,
            stake,
        });

        match resolution {
            Some(resolution) => {
                self.finalize(claim_id, resolution, now);
                Ok(resolution.status())
            }
            None => Ok(ClaimStatus::Active),
        }
    }

    // ── Resolution ──────────────────────────────────────────────────────

    /// Finalize an active claim whose voting window has closed.
    pub fn resolve_consensus(&mut self, claim_id: ClaimId) -> Result<ClaimStatus, ConsensusError> {
        let now = self.now();
        let claim = &self
            .claims
            .get(&claim_id)
            .ok_or(ConsensusError::ClaimNotFound(claim_id))?
            .claim;
        if !claim.is_active() {
            return Err(ConsensusError::ClaimNotActive {
                claim_id,
                status: claim.status,
            });
        }
        if !claim.is_expired_at(now) {
            return Err(ConsensusError::ClaimNotReadyToResolve(claim_id));
        }
        let resolution = evaluate_expiry(claim, self.governance.threshold(claim.claim_type));
        self.finalize(claim_id, resolution, now);
        Ok(resolution.status())
    }

    /// Finalize every active claim past its deadline.
    pub fn expire_claims(&mut self) -> Vec<(ClaimId, ClaimStatus)> {
        let now = self.now();
        let due: Vec<(ClaimId, Resolution)> = self
            .claims
            .values()
            .filter(|r| r.claim.is_active() && r.claim.is_expired_at(now))
            .map(|r| {
                let threshold = self.governance.threshold(r.claim.claim_type);
                (r.claim.id, evaluate_expiry(&r.claim, threshold))
            })
            .collect();

        for (claim_id, resolution) in &due {
            self.finalize(*claim_id, *resolution, now);
        }
        if !due.is_empty() {
            tracing::debug!(count = due.len(), "swept expired claims");
        }
        due.into_iter().map(|(id, r)| (id, r.status())).collect()
    }

    fn finalize_if_expired(&mut self, claim_id: ClaimId, now: Timestamp) {
        let Some(record) = self.claims.get(&claim_id) else {
            return;
        };
        if record.claim.is_active() && record.claim.is_expired_at(now) {
            let threshold = self.governance.threshold(record.claim.claim_type);
            let resolution = evaluate_expiry(&record.claim, threshold);
            self.finalize(claim_id, resolution, now);
        }
    }

    /// Close an active claim: freeze the settlement, then apply registry effects.
    ///
    /// Never fails. A tier change that no longer applies is skipped and reported.
    fn finalize(&mut self, claim_id: ClaimId, resolution: Resolution, now: Timestamp) {
        let Some(record) = self.claims.get_mut(&claim_id) else {
            return;
        };
        if !record.claim.is_active() {
            return;
        }

        let claim_type = record.claim.claim_type;
        let sybil_confirmed = resolution == Resolution::Approved;
        let slash_bps = self.governance.outcome_slash_rate(claim_type, sybil_confirmed);
        let settlement = compute_settlement(
            resolution,
            slash_bps,
            &record.claim.claimant,
            record.claim.stake_amount,
            &record.vouches,
        );
        record.claim.status = resolution.status();
        record.claim.resolved_at = Some(now);

        let claim = record.claim.clone();
        let winners: Vec<Address> = settlement.winners().copied().collect();
        let losers: Vec<Address> = settlement.losers().copied().collect();
        let burned = settlement.burned;
        record.settlement = Some(settlement);

        self.burned_total = self.burned_total.saturating_add(burned);
        if claim.status.is_failure() {
            self.last_failed
                .insert((claim.claimant, claim_type), claim.created_at);
        }

        if resolution == Resolution::Approved {
            self.apply_tier_change(&claim, now);
        }
        if let (ClaimType::DuplicateFlag, Some(target)) = (claim_type, claim.target_address) {
            if let Err(e) = self.registry.clear_challenge(&self.address, target) {
                tracing::warn!(claim_id, error = %e, "failed to clear challenge flag");
            }
        }
        for address in winners {
            self.adjust_reputation(address, 1);
        }
        for address in losers {
            self.adjust_reputation(address, -1);
        }

        tracing::info!(
            claim_id,
            status = %claim.status,
            weighted_for = claim.weighted_for,
            weighted_against = claim.weighted_against,
            burned = %burned,
            "claim resolved"
        );
        self.pending_events.push(ConsensusEvent::ClaimResolved {
            claim_id,
            status: claim.status,
            weighted_for: claim.weighted_for,
            weighted_against: claim.weighted_against,
            burned,
        });
    }

    fn apply_tier_change(&mut self, claim: &IdentityClaim, now: Timestamp) {
        let writer = self.address;
        let (subject, result): (Address, Result<(), RegistryError>) = match claim.claim_type {
            ClaimType::NewPrimary => (
                claim.claimant,
                self.registry
                    .upgrade_to_primary(&writer, claim.claimant, now),
            ),
            ClaimType::LinkToPrimary => {
                let (Some(primary), Some(platform)) =
                    (claim.target_address, claim.platform.as_deref())
                else {
                    return;
                };
                (
                    claim.claimant,
                    self.registry
                        .upgrade_to_linked(&writer, claim.claimant, primary, platform, now)
                        .map(drop),
                )
            }
            ClaimType::DuplicateFlag => {
                let Some(target) = claim.target_address else {
                    return;
                };
                (
                    target,
                    self.registry
                        .downgrade(&writer, target, IdentityTier::Unverified),
                )
            }
        };

        if let Err(e) = result {
            tracing::warn!(
                claim_id = claim.id,
                address = %subject.short(),
                error = %e,
                "tier change skipped"
            );
            self.pending_events.push(ConsensusEvent::TierChangeSkipped {
                claim_id: claim.id,
                address: subject,
                reason: e.to_string(),
            });
        }
    }

    fn adjust_reputation(&mut self, address: Address, delta: i64) {
        if let Err(e) = self
            .registry
            .adjust_reputation(&self.address, address, delta)
        {
            tracing::warn!(address = %address.short(), error = %e, "reputation update failed");
        }
    }

    // ── Rewards ─────────────────────────────────────────────────────────

    /// Mark the caller's payout on `claim_id` as withdrawn and return it.
    ///
    /// Finalizes the claim first if its window closed without anyone resolving
    /// it. Pair with [`complete_withdrawal`](Self::complete_withdrawal) once the
    /// value has moved, or [`abort_withdrawal`](Self::abort_withdrawal) if it did not.
    pub fn begin_withdrawal(
        &mut self,
        caller: &Address,
        claim_id: ClaimId,
    ) -> Result<u128, ConsensusError> {
        let now = self.now();
        self.finalize_if_expired(claim_id, now);

        let record = self
            .claims
            .get_mut(&claim_id)
            .ok_or(ConsensusError::ClaimNotFound(claim_id))?;
        let Some(settlement) = &record.settlement else {
            return Err(ConsensusError::ClaimStillActive(claim_id));
        };
        let no_rewards = ConsensusError::NoRewardsAvailable {
            claim_id,
            caller: *caller,
        };
        let entry = settlement.entry(caller).ok_or(no_rewards.clone())?;
        if record.withdrawn.contains(caller) {
            return Err(ConsensusError::RewardsAlreadyClaimed {
                claim_id,
                caller: *caller,
            });
        }
        if entry.payout == 0 {
            return Err(no_rewards);
        }
        let payout = entry.payout;
        record.withdrawn.insert(*caller);
        Ok(payout)
    }

    pub fn complete_withdrawal(&mut self, claim_id: ClaimId, recipient: Address, amount: u128) {
        tracing::info!(claim_id, recipient = %recipient.short(), amount = %amount, "rewards paid");
        self.pending_events.push(ConsensusEvent::RewardsPaid {
            claim_id,
            recipient,
            amount,
        });
    }

    /// Undo [`begin_withdrawal`](Self::begin_withdrawal) after a failed transfer.
    pub fn abort_withdrawal(&mut self, claim_id: ClaimId, recipient: &Address) {
        if let Some(record) = self.claims.get_mut(&claim_id) {
            record.withdrawn.remove(recipient);
        }
        tracing::warn!(claim_id, recipient = %recipient.short(), "withdrawal rolled back");
    }

    /// Withdraw and record the payout in one step, for callers that move value themselves.
    pub fn claim_rewards(&mut self, caller: &Address, claim_id: ClaimId) -> Result<u128, ConsensusError> {
        let amount = self.begin_withdrawal(caller, claim_id)?;
        self.complete_withdrawal(claim_id, *caller, amount);
        Ok(amount)
    }

    // ── Governance ──────────────────────────────────────────────────────

    pub fn set_thresholds(&mut self, caller: &Address, value: Thresholds) -> Result<(), ConsensusError> {
        self.governance.set_thresholds(caller, value)?;
        self.params_updated(ParamSection::Thresholds);
        Ok(())
    }

    pub fn set_staking(&mut self, caller: &Address, value: Staking) -> Result<(), ConsensusError> {
        self.governance.set_staking(caller, value)?;
        self.params_updated(ParamSection::Staking);
        Ok(())
    }

    pub fn set_slashing(&mut self, caller: &Address, value: Slashing) -> Result<(), ConsensusError> {
        self.governance.set_slashing(caller, value)?;
        self.params_updated(ParamSection::Slashing);
        Ok(())
    }

    pub fn set_voting_weights(
        &mut self,
        caller: &Address,
        value: VotingWeights,
    ) -> Result<(), ConsensusError> {
        self.governance.set_voting_weights(caller, value)?;
        self.params_updated(ParamSection::VotingWeights);
        Ok(())
    }

    pub fn set_cooldowns(&mut self, caller: &Address, value: Cooldowns) -> Result<(), ConsensusError> {
        self.governance.set_cooldowns(caller, value)?;
        self.params_updated(ParamSection::Cooldowns);
        Ok(())
    }

    pub fn set_decay_rates(&mut self, caller: &Address, value: DecayRates) -> Result<(), ConsensusError> {
        self.governance.set_decay_rates(caller, value)?;
        self.params_updated(ParamSection::DecayRates);
        Ok(())
    }

    fn params_updated(&mut self, section: ParamSection) {
        self.pending_events
            .push(ConsensusEvent::ParametersUpdated { section });
    }

    pub fn grant_governor(&mut self, caller: &Address, governor: Address) -> Result<bool, ConsensusError> {
        Ok(self.governance.grant_governor(caller, governor)?)
    }

    pub fn revoke_governor(&mut self, caller: &Address, governor: &Address) -> Result<bool, ConsensusError> {
        Ok(self.governance.revoke_governor(caller, governor)?)
    }

    /// Advance protocol time. Returns the total warp offset.
    pub fn warp_time(&mut self, caller: &Address, delta_secs: u64) -> Result<u64, ConsensusError> {
        let total_secs = self.governance.warp_time(caller, delta_secs)?;
        self.pending_events.push(ConsensusEvent::TimeWarped {
            delta_secs,
            total_secs,
        });
        Ok(total_secs)
    }

    pub fn renounce_god_mode(&mut self, caller: &Address) -> Result<(), ConsensusError> {
        self.governance.renounce_god_mode(caller)?;
        self.pending_events.push(ConsensusEvent::GodModeRenounced);
        Ok(())
    }

    /// Governor-only promotion of a primary to oracle.
    pub fn promote_to_oracle(&mut self, caller: &Address, address: &Address) -> Result<(), ConsensusError> {
        self.governance.require_governor(caller)?;
        let now = self.now();
        self.registry
            .upgrade_to_oracle(&self.address, *address, now)?;
        self.pending_events
            .push(ConsensusEvent::OraclePromoted { address: *address });
        Ok(())
    }

    // ── Views ───────────────────────────────────────────────────────────

    pub fn address(&self) -> &Address {
        &self.address
    }

    pub fn governance(&self) -> &GovernanceParameters {
        &self.governance
    }

    pub fn registry(&self) -> &IdentityRegistry {
        &self.registry
    }

    pub fn get_identity(&self, address: &Address) -> Identity {
        self.registry.get_identity(address)
    }

    pub fn get_tier(&self, address: &Address) -> IdentityTier {
        self.registry.tier(address)
    }

    pub fn get_claim(&self, claim_id: ClaimId) -> Option<&IdentityClaim> {
        self.claims.get(&claim_id).map(|r| &r.claim)
    }

    pub fn get_vouches(&self, claim_id: ClaimId) -> &[Vouch] {
        self.claims
            .get(&claim_id)
            .map_or(&[][..], |r| r.vouches.as_slice())
    }

    pub fn get_vouch(&self, claim_id: ClaimId, voucher: &Address) -> Option<&Vouch> {
        self.get_vouches(claim_id)
            .iter()
            .find(|v| v.voucher == *voucher)
    }

    pub fn get_settlement(&self, claim_id: ClaimId) -> Option<&Settlement> {
        self.claims.get(&claim_id)?.settlement.as_ref()
    }

    /// What `claim_rewards` would pay `address` right now, if anything.
    pub fn pending_reward(&self, claim_id: ClaimId, address: &Address) -> Option<u128> {
        let record = self.claims.get(&claim_id)?;
        if record.withdrawn.contains(address) {
            return None;
        }
        let payout = record.settlement.as_ref()?.entry(address)?.payout;
        (payout > 0).then_some(payout)
    }

    pub fn required_stake(&self, claim_type: ClaimType) -> u128 {
        self.governance.required_stake(claim_type)
    }

    pub fn threshold(&self, claim_type: ClaimType) -> u32 {
        self.governance.threshold(claim_type)
    }

    pub fn slash_rate(&self, claim_type: ClaimType) -> u32 {
        self.governance.slash_rate(claim_type)
    }

    pub fn claim_count(&self) -> usize {
        self.claims.len()
    }

    pub fn active_claim_count(&self) -> usize {
        self.claims.values().filter(|r| r.claim.is_active()).count()
    }

    pub fn claims(&self) -> impl Iterator<Item = &IdentityClaim> {
        self.claims.values().map(|r| &r.claim)
    }

    /// Total slashed value burned across all settled claims.
    pub fn burned_total(&self) -> u128 {
        self.burned_total
    }

    /// Drain pending events for subscribers.
    pub fn drain_events(&mut self) -> Vec<ConsensusEvent> {
        std::mem::take(&mut self.pending_events)
    }

    // ── Persistence ─────────────────────────────────────────────────────

    pub fn snapshot(&self) -> EngineSnapshot {
        EngineSnapshot {
            address: self.address,
            governance: self.governance.clone(),
            registry: self.registry.clone(),
            claims: self.claims.clone(),
            next_claim_id: self.next_claim_id,
            last_failed: self.last_failed.clone(),
            burned_total: self.burned_total,
        }
    }

    /// Rebuild the engine from a snapshot. Undrained events are not persisted.
    pub fn restore(snapshot: EngineSnapshot, clock: C) -> Self {
        Self {
            address: snapshot.address,
            governance: snapshot.governance,
            registry: snapshot.registry,
            claims: snapshot.claims,
            next_claim_id: snapshot.next_claim_id,
            last_failed: snapshot.last_failed,
            burned_total: snapshot.burned_total,
            pending_events: Vec::new(),
            clock,
        }
    }
}
