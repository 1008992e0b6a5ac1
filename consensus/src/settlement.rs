//! Settlement: who gets what back once a claim is decided.
//!
//! Computed once at resolution and frozen with the claim:
//! - Approved: the claimant and supporters win; opposers are slashed.
//! - Rejected: opposers win; the claimant and supporters are slashed.
//! - Expired: every stake is refunded in full.
//!
//! Each loser forfeits `slash_bps` of their stake. The forfeited pool is split
//! among the winners pro rata by stake. Truncation dust is burned, as is the
//! whole pool if nobody staked on the winning side.
//!
//! Conservation: `committed() == paid_out() + burned`.

use crate::claim::Vouch;
use crate::tally::Resolution;
use knomee_types::{apply_bps, pro_rata, Address};
use serde::{Deserialize, Serialize};

/// A participant's role on a claim.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Participant {
    Claimant,
    Supporter,
    Opposer,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementEntry {
    pub address: Address,
    pub role: Participant,
    pub staked: u128,
    /// Forfeited portion of the stake (losers only).
    pub slashed: u128,
    /// Share of the forfeited pool (winners only).
    pub reward: u128,
    /// `staked - slashed + reward`: what `claim_rewards` pays out.
    pub payout: u128,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settlement {
    pub resolution: Resolution,
    pub slash_bps: u32,
    pub entries: Vec<SettlementEntry>,
    pub burned: u128,
}

impl Settlement {
    pub fn entry(&self, address: &Address) -> Option<&SettlementEntry> {
        self.entries.iter().find(|e| e.address == *address)
    }

    /// Total stake locked by the claim and its vouches.
    pub fn committed(&self) -> u128 {
        self.entries.iter().map(|e| e.staked).sum()
    }

    pub fn paid_out(&self) -> u128 {
        self.entries.iter().map(|e| e.payout).sum()
    }

    pub fn slashed(&self) -> u128 {
        self.entries.iter().map(|e| e.slashed).sum()
    }

    /// Addresses on the winning side. Empty for an expired claim.
    pub fn winners(&self) -> impl Iterator<Item = &Address> {
        self.entries
            .iter()
            .filter(|e| self.is_winner(e.role))
            .map(|e| &e.address)
    }

    /// Addresses on the losing side. Empty for an expired claim.
    pub fn losers(&self) -> impl Iterator<Item = &Address> {
        self.entries
            .iter()
            .filter(|e| self.is_loser(e.role))
            .map(|e| &e.address)
    }

    fn is_winner(&self, role: Participant) -> bool {
        match self.resolution {
            Resolution::Approved => role != Participant::Opposer,
            Resolution::Rejected => role == Participant::Opposer,
            Resolution::Expired => false,
        }
    }

    fn is_loser(&self, role: Participant) -> bool {
        self.resolution != Resolution::Expired && !self.is_winner(role)
    }
}

/// Compute the frozen settlement for a decided claim.
///
/// `slash_bps` is ignored for an expired claim.
pub fn compute_settlement(
    resolution: Resolution,
    slash_bps: u32,
    claimant: &Address,
    claimant_stake: u128,
    vouches: &[Vouch],
) -> Settlement {
    let participants = std::iter::once((*claimant, Participant::Claimant, claimant_stake)).chain(
        vouches.iter().map(|v| {
            let role = if v.support {
                Participant::Supporter
            } else {
                Participant::Opposer
            };
            (v.voucher, role, v.stake_amount)
        }),
    );

    let mut settlement = Settlement {
        resolution,
        slash_bps: if resolution == Resolution::Expired { 0 } else { slash_bps },
        entries: participants
            .map(|(address, role, staked)| SettlementEntry {
                address,
                role,
                staked,
                slashed: 0,
                reward: 0,
                payout: staked,
            })
            .collect(),
        burned: 0,
    };
    if resolution == Resolution::Expired {
        return settlement;
    }

    let rate = settlement.slash_bps;
    let losers: Vec<bool> = settlement
        .entries
        .iter()
        .map(|e| settlement.is_loser(e.role))
        .collect();

    let mut pool: u128 = 0;
    let mut winning_stake: u128 = 0;
    for (entry, lost) in settlement.entries.iter_mut().zip(&losers) {
        if *lost {
            entry.slashed = apply_bps(entry.staked, rate);
            entry.payout = entry.staked - entry.slashed;
            pool = pool.saturating_add(entry.slashed);
        } else {
            winning_stake = winning_stake.saturating_add(entry.staked);
        }
    }

    let mut distributed: u128 = 0;
    for (entry, lost) in settlement.entries.iter_mut().zip(&losers) {
        if !*lost {
            entry.reward = pro_rata(pool, entry.staked, winning_stake);
            entry.payout = entry.staked + entry.reward;
            distributed += entry.reward;
        }
    }
    settlement.burned = pool - distributed;
    settlement
}

#[cfg(test)]
mod tests {
    use super::*;
    use knomee_types::Timestamp;

    fn addr(n: u8) -> Address {
        Address::from_bytes([n; 32])
    }

    fn vouch(voucher: u8, support: bool, stake: u128) -> Vouch {
        Vouch {
            claim_id: 0,
            voucher: addr(voucher),
            support,
            weight: 1,
            stake_amount: stake,
            vouched_at: Timestamp::new(0),
        }
    }

    fn assert_conserved(s: &Settlement) {
        assert_eq!(s.committed(), s.paid_out() + s.burned);
    }

    #[test]
    fn approved_slashes_opposers_and_rewards_supporters() {
        let vouches = [vouch(2, true, 100), vouch(3, false, 200)];
        let s = compute_settlement(Resolution::Approved, 3000, &addr(1), 300, &vouches);

        let opposer = s.entry(&addr(3)).unwrap();
        assert_eq!(opposer.slashed, 60);
        assert_eq!(opposer.payout, 140);

        // Pool of 60 split 300:100 between claimant and supporter.
        assert_eq!(s.entry(&addr(1)).unwrap().reward, 45);
        assert_eq!(s.entry(&addr(2)).unwrap().reward, 15);
        assert_eq!(s.burned, 0);
        assert_conserved(&s);
    }

    #[test]
    fn rejected_slashes_claimant_and_supporters() {
        let vouches = [vouch(2, true, 100), vouch(3, false, 100)];
        let s = compute_settlement(Resolution::Rejected, 1000, &addr(1), 100, &vouches);

        assert_eq!(s.entry(&addr(1)).unwrap().payout, 90);
        assert_eq!(s.entry(&addr(2)).unwrap().payout, 90);
        assert_eq!(s.entry(&addr(3)).unwrap().payout, 120);
        assert_eq!(s.winners().copied().collect::<Vec<_>>(), vec![addr(3)]);
        assert_eq!(s.losers().count(), 2);
        assert_conserved(&s);
    }

    #[test]
    fn expired_refunds_everyone() {
        let vouches = [vouch(2, true, 100), vouch(3, false, 50)];
        let s = compute_settlement(Resolution::Expired, 5000, &addr(1), 30, &vouches);
        assert_eq!(s.slash_bps, 0);
        for e in &s.entries {
            assert_eq!(e.payout, e.staked);
        }
        assert_eq!(s.winners().count(), 0);
        assert_eq!(s.losers().count(), 0);
        assert_conserved(&s);
    }

    #[test]
    fn truncation_dust_is_burned() {
        let vouches = [vouch(2, true, 1), vouch(3, true, 1), vouch(4, false, 100)];
        let s = compute_settlement(Resolution::Approved, 1000, &addr(1), 1, &vouches);
        // Pool of 10 over three equal winners: 3 each, 1 burned.
        assert_eq!(s.slashed(), 10);
        assert_eq!(s.burned, 1);
        assert_conserved(&s);
    }

    #[test]
    fn full_slash_at_sybil_rate() {
        let vouches = [vouch(2, false, 50)];
        let s = compute_settlement(Resolution::Approved, 10_000, &addr(1), 100, &vouches);
        assert_eq!(s.entry(&addr(2)).unwrap().payout, 0);
        assert_eq!(s.entry(&addr(1)).unwrap().payout, 150);
        assert_conserved(&s);
    }

    #[test]
    fn pool_burned_without_winning_stake() {
        let s = compute_settlement(Resolution::Rejected, 5000, &addr(1), 100, &[]);
        assert_eq!(s.entry(&addr(1)).unwrap().payout, 50);
        assert_eq!(s.burned, 50);
        assert_conserved(&s);
    }
}
