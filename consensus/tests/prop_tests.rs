use proptest::prelude::*;

use knomee_consensus::{
    apply_vouch, compute_settlement, evaluate_threshold, ClaimStatus, IdentityClaim, Resolution,
    Vouch,
};
use knomee_types::{Address, ClaimType, Timestamp};

fn addr(n: u8) -> Address {
    Address::from_bytes([n; 32])
}

fn claim() -> IdentityClaim {
    IdentityClaim {
        id: 0,
        claimant: addr(0),
        claim_type: ClaimType::NewPrimary,
        status: ClaimStatus::Active,
        target_address: None,
        platform: None,
        justification: "unique human".into(),
        stake_amount: 0,
        vouches_for: 0,
        vouches_against: 0,
        weighted_for: 0,
        weighted_against: 0,
        created_at: Timestamp::new(0),
        expires_at: Timestamp::new(1),
        resolved_at: None,
    }
}

fn vouches(raw: &[(bool, u64, u128)]) -> Vec<Vouch> {
    raw.iter()
        .enumerate()
        .map(|(i, &(support, weight, stake))| Vouch {
            claim_id: 0,
            voucher: addr(i as u8 + 1),
            support,
            weight,
            stake_amount: stake,
            vouched_at: Timestamp::new(0),
        })
        .collect()
}

fn resolution() -> impl Strategy<Value = Resolution> {
    prop_oneof![
        Just(Resolution::Approved),
        Just(Resolution::Rejected),
        Just(Resolution::Expired),
    ]
}

proptest! {
    /// Nothing is created or lost in settlement: every committed unit is paid or burned.
    #[test]
    fn settlement_conserves_value(
        outcome in resolution(),
        slash_bps in 0u32..=10_000,
        claimant_stake in 0u128..1_000_000_000_000,
        raw in prop::collection::vec((any::<bool>(), 1u64..200, 0u128..1_000_000_000_000), 0..40),
    ) {
        let s = compute_settlement(outcome, slash_bps, &addr(0), claimant_stake, &vouches(&raw));
        prop_assert_eq!(s.committed(), s.paid_out() + s.burned);
        prop_assert_eq!(s.slashed(), s.entries.iter().map(|e| e.reward).sum::<u128>() + s.burned);
        for e in &s.entries {
            prop_assert!(e.slashed <= e.staked);
        }
    }

    /// Winners never receive less than they staked; losers never more.
    #[test]
    fn winners_gain_losers_lose(
        outcome in resolution(),
        slash_bps in 0u32..=10_000,
        claimant_stake in 1u128..1_000_000_000,
        raw in prop::collection::vec((any::<bool>(), 1u64..200, 1u128..1_000_000_000), 1..20),
    ) {
        let s = compute_settlement(outcome, slash_bps, &addr(0), claimant_stake, &vouches(&raw));
        for winner in s.winners() {
            let e = s.entry(winner).unwrap();
            prop_assert!(e.payout >= e.staked);
        }
        for loser in s.losers() {
            let e = s.entry(loser).unwrap();
            prop_assert!(e.payout <= e.staked);
        }
    }

    /// Weighted tallies only grow as vouches arrive.
    #[test]
    fn tallies_never_decrease(
        raw in prop::collection::vec((any::<bool>(), 1u64..1_000, 1u128..100), 1..50),
    ) {
        let mut current = claim();
        for vouch in vouches(&raw) {
            let next = apply_vouch(&current, &vouch).unwrap();
            prop_assert!(next.weighted_for >= current.weighted_for);
            prop_assert!(next.weighted_against >= current.weighted_against);
            prop_assert_eq!(next.total_weight(), current.total_weight() + vouch.weight);
            current = next;
        }
        prop_assert_eq!(current.vouches_for + current.vouches_against, raw.len() as u64);
    }

    /// Raising the threshold can only turn an approval into no decision.
    #[test]
    fn threshold_is_monotonic(
        weighted_for in 0u64..10_000,
        weighted_against in 0u64..10_000,
        low in 5_100u32..=10_000,
        bump in 0u32..5_000,
    ) {
        let mut c = claim();
        c.weighted_for = weighted_for;
        c.weighted_against = weighted_against;
        let high = (low + bump).min(10_000);
        if evaluate_threshold(&c, high).is_some() {
            prop_assert_eq!(evaluate_threshold(&c, low), Some(Resolution::Approved));
        }
    }
}
