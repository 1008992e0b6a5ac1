//! Integration tests exercising the full node:
//! config → genesis seeding → claims and vouches through the guarded service →
//! settlement and payouts → snapshot persistence → restart.
//!
//! These wire together every crate in the workspace, verifying the engine's
//! guarantees hold end-to-end and survive a restart.

use knomee_consensus::{ClaimStatus, ConsensusError, ConsensusEvent};
use knomee_governance::GovernanceParams;
use knomee_node::{KnomeeNode, NodeConfig, NodeError, SNAPSHOT_FILE};
use knomee_nullables::NullClock;
use knomee_types::{Address, ErrorKind, IdentityTier, SECONDS_PER_DAY};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

const START: u64 = 1_700_000_000;
const MIN: u128 = 10_000_000;

const GOVERNOR: Address = Address::from_bytes([0x60; 32]);
const GOD: Address = Address::from_bytes([0x6D; 32]);
const CLAIMANT: Address = Address::from_bytes([1; 32]);
const ACCUSER: Address = Address::from_bytes([2; 32]);
const P1: Address = Address::from_bytes([10; 32]);
const P2: Address = Address::from_bytes([11; 32]);
const ORACLE: Address = Address::from_bytes([20; 32]);

fn config(dir: &tempfile::TempDir) -> NodeConfig {
    NodeConfig {
        data_dir: dir.path().to_path_buf(),
        governors: vec![GOVERNOR],
        god_mode: true,
        god_mode_authority: Some(GOD),
        genesis_primaries: vec![P1, P2, ORACLE],
        genesis_oracles: vec![ORACLE],
        ..NodeConfig::default()
    }
}

fn open(dir: &tempfile::TempDir) -> (KnomeeNode<NullClock>, NullClock) {
    let clock = NullClock::new(START);
    let node = KnomeeNode::open(config(dir), clock.clone()).expect("open node");
    (node, clock)
}

fn submit_primary(node: &KnomeeNode<NullClock>) -> u64 {
    node.service()
        .request_primary_verification(&CLAIMANT, "I am a unique human", 3 * MIN)
        .expect("submit claim")
}

// ---------------------------------------------------------------------------
// Genesis and persistence
// ---------------------------------------------------------------------------

#[test]
fn genesis_seeds_voters_and_writes_snapshot() {
    let dir = tempfile::tempdir().expect("temp dir");
    let (node, _) = open(&dir);

    assert!(dir.path().join(SNAPSHOT_FILE).exists());
    let status = node.status().unwrap();
    assert_eq!(status.primaries, 3);
    assert_eq!(status.oracles, 1);
    assert!(status.god_mode_active);
    assert_eq!(status.now.as_secs(), START);
    assert_eq!(
        node.service().read(|e| e.get_tier(&ORACLE)).unwrap(),
        IdentityTier::Oracle
    );

    let json = serde_json::to_value(&status).unwrap();
    assert_eq!(json["primaries"], 3);
    assert_eq!(json["god_mode_active"], true);
}

#[test]
fn invalid_config_is_rejected_before_touching_disk() {
    let dir = tempfile::tempdir().expect("temp dir");
    let cfg = NodeConfig {
        governors: Vec::new(),
        ..config(&dir)
    };
    let err = KnomeeNode::open(cfg, NullClock::new(START)).err().unwrap();
    assert!(matches!(err, NodeError::Config(_)));
    assert!(!dir.path().join(SNAPSHOT_FILE).exists());
}

#[test]
fn state_survives_restart() {
    let dir = tempfile::tempdir().expect("temp dir");
    let id = {
        let (node, _) = open(&dir);
        let id = submit_primary(&node);
        node.service().vouch_against(&P1, id, MIN).unwrap();
        node.persist().unwrap();
        id
    };

    let (node, _) = open(&dir);
    let claim = node.service().read(|e| e.get_claim(id).cloned()).unwrap().unwrap();
    assert_eq!(claim.weighted_against, 1);
    assert_eq!(claim.status, ClaimStatus::Active);
    assert_eq!(
        node.service().vouch_for(&P1, id, MIN),
        Err(ConsensusError::AlreadyVoted { claim_id: id, voucher: P1 })
    );

    // The restored engine keeps counting ids where it left off.
    let next = node
        .service()
        .request_link_to_primary(&ACCUSER, &P2, "github", "my alt", MIN)
        .unwrap();
    assert_eq!(next, id + 1);
}

#[test]
fn snapshot_from_another_engine_is_refused() {
    let dir = tempfile::tempdir().expect("temp dir");
    open(&dir);
    let cfg = NodeConfig {
        engine_address: Address::from_bytes([0xAB; 32]),
        ..config(&dir)
    };
    assert!(matches!(
        KnomeeNode::open(cfg, NullClock::new(START)),
        Err(NodeError::Config(_))
    ));
}

#[test]
fn corrupt_snapshot_is_a_snapshot_error() {
    let dir = tempfile::tempdir().expect("temp dir");
    std::fs::write(dir.path().join(SNAPSHOT_FILE), b"not a snapshot").unwrap();
    assert!(matches!(
        KnomeeNode::open(config(&dir), NullClock::new(START)),
        Err(NodeError::Snapshot(_))
    ));
}

// ---------------------------------------------------------------------------
// Voting scenarios
// ---------------------------------------------------------------------------

#[test]
fn two_primaries_for_one_oracle_against_stays_active() {
    let dir = tempfile::tempdir().expect("temp dir");
    let (node, _) = open(&dir);
    let id = submit_primary(&node);
    let service = node.service();

    // Opposition first: a lone supporting vouch would already be 100%.
    service.vouch_against(&ORACLE, id, MIN).unwrap();
    assert_eq!(service.vouch_for(&P1, id, MIN), Ok(ClaimStatus::Active));
    assert_eq!(service.vouch_for(&P2, id, MIN), Ok(ClaimStatus::Active));

    let claim = service.read(|e| e.get_claim(id).cloned()).unwrap().unwrap();
    assert_eq!((claim.weighted_for, claim.weighted_against), (2, 100));
    assert_eq!(claim.for_bps(), 196);
}

#[test]
fn oracle_vouch_approves_and_upgrades_tier() {
    let dir = tempfile::tempdir().expect("temp dir");
    let (node, _) = open(&dir);
    let id = submit_primary(&node);

    assert_eq!(node.service().vouch_for(&ORACLE, id, MIN), Ok(ClaimStatus::Approved));
    let (status, tier) = node
        .service()
        .read(|e| (e.get_claim(id).map(|c| c.status), e.get_tier(&CLAIMANT)))
        .unwrap();
    assert_eq!(status, Some(ClaimStatus::Approved));
    assert_eq!(tier, IdentityTier::Primary);

    // The new primary can vote straight away.
    let link = node
        .service()
        .request_link_to_primary(&ACCUSER, &CLAIMANT, "discord", "my alt", MIN)
        .unwrap();
    assert_eq!(node.service().vouch_for(&CLAIMANT, link, MIN), Ok(ClaimStatus::Approved));
}

#[test]
fn threshold_crossing_exactly_is_inclusive() {
    let dir = tempfile::tempdir().expect("temp dir");
    let mut params = GovernanceParams::default();
    params.thresholds.primary_bps = 7500;
    params.voting_weights.oracle = 3;
    let cfg = NodeConfig {
        params,
        ..config(&dir)
    };
    let node = KnomeeNode::open(cfg, NullClock::new(START)).unwrap();
    let id = submit_primary(&node);

    node.service().vouch_against(&P1, id, MIN).unwrap();
    // 3 of 4 is exactly 7500 bps.
    assert_eq!(node.service().vouch_for(&ORACLE, id, MIN), Ok(ClaimStatus::Approved));
}

#[test]
fn unvouched_claim_expires_on_next_interaction_with_full_refund() {
    let dir = tempfile::tempdir().expect("temp dir");
    let (node, clock) = open(&dir);
    let id = submit_primary(&node);
    clock.advance(31 * SECONDS_PER_DAY);

    assert_eq!(node.service().claim_rewards(&CLAIMANT, id), Ok(3 * MIN));
    assert_eq!(node.payouts().balance(&CLAIMANT), 3 * MIN);
    let status = node.service().read(|e| e.get_claim(id).map(|c| c.status)).unwrap();
    assert_eq!(status, Some(ClaimStatus::Expired));
}

#[test]
fn duplicate_flag_challenge_lifecycle() {
    let dir = tempfile::tempdir().expect("temp dir");
    let (node, clock) = open(&dir);
    let service = node.service();

    let id = service
        .challenge_duplicate(&ACCUSER, &P1, "P1 and P2 are the same person", 10 * MIN)
        .unwrap();
    assert!(service.read(|e| e.get_identity(&P1).under_challenge).unwrap());

    clock.advance(31 * SECONDS_PER_DAY);
    let report = node.tick().unwrap();
    assert_eq!(report.expired, vec![(id, ClaimStatus::Expired)]);
    assert!(!service.read(|e| e.get_identity(&P1).under_challenge).unwrap());
    assert_eq!(service.read(|e| e.get_tier(&P1)).unwrap(), IdentityTier::Primary);
}

// ---------------------------------------------------------------------------
// Settlement and payouts
// ---------------------------------------------------------------------------

#[test]
fn all_committed_stake_is_paid_or_burned() {
    let dir = tempfile::tempdir().expect("temp dir");
    let (node, clock) = open(&dir);
    let service = node.service();

    let id = submit_primary(&node);
    service.vouch_against(&ORACLE, id, 5 * MIN).unwrap();
    service.vouch_for(&P1, id, 2 * MIN).unwrap();
    service.vouch_for(&P2, id, 7 * MIN).unwrap();
    clock.advance(31 * SECONDS_PER_DAY);
    assert_eq!(service.resolve_consensus(id), Ok(ClaimStatus::Rejected));

    for participant in [CLAIMANT, P1, P2, ORACLE] {
        service.claim_rewards(&participant, id).unwrap();
    }
    let committed = 3 * MIN + 2 * MIN + 7 * MIN + 5 * MIN;
    let burned = service.read(|e| e.burned_total()).unwrap();
    assert_eq!(node.payouts().total() + burned, committed);
    assert!(node.payouts().balance(&ORACLE) > 5 * MIN);
    assert!(node.payouts().balance(&CLAIMANT) < 3 * MIN);
}

#[test]
fn second_claim_rewards_fails_with_state_error() {
    let dir = tempfile::tempdir().expect("temp dir");
    let (node, _) = open(&dir);
    let id = submit_primary(&node);
    node.service().vouch_for(&ORACLE, id, MIN).unwrap();

    node.service().claim_rewards(&ORACLE, id).unwrap();
    let err = node.service().claim_rewards(&ORACLE, id).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::State);
    assert_eq!(node.payouts().balance(&ORACLE), MIN);
}

#[test]
fn withdrawals_and_credits_survive_restart() {
    let dir = tempfile::tempdir().expect("temp dir");
    let id = {
        let (node, _) = open(&dir);
        let id = submit_primary(&node);
        node.service().vouch_for(&ORACLE, id, MIN).unwrap();
        node.service().claim_rewards(&CLAIMANT, id).unwrap();
        node.persist().unwrap();
        id
    };

    let (node, _) = open(&dir);
    assert_eq!(node.payouts().balance(&CLAIMANT), 3 * MIN);
    assert!(matches!(
        node.service().claim_rewards(&CLAIMANT, id),
        Err(ConsensusError::RewardsAlreadyClaimed { .. })
    ));
}

// ---------------------------------------------------------------------------
// God mode and the tick loop
// ---------------------------------------------------------------------------

#[test]
fn warp_then_renounce() {
    let dir = tempfile::tempdir().expect("temp dir");
    let (node, _) = open(&dir);
    let id = submit_primary(&node);

    node.service().warp_time(&GOD, 31 * SECONDS_PER_DAY).unwrap();
    assert_eq!(node.tick().unwrap().expired, vec![(id, ClaimStatus::Expired)]);

    node.service().renounce_god_mode(&GOD).unwrap();
    let status = node.status().unwrap();
    assert!(!status.god_mode_active);
    assert_eq!(status.time_warp_secs, 0);
    assert_eq!(
        node.service().renounce_god_mode(&GOD).unwrap_err().kind(),
        ErrorKind::State
    );
}

#[test]
fn tick_reports_drained_events() {
    let dir = tempfile::tempdir().expect("temp dir");
    let (node, _) = open(&dir);
    let id = submit_primary(&node);
    node.service().vouch_for(&ORACLE, id, MIN).unwrap();

    let report = node.tick().unwrap();
    let names: Vec<&str> = report.events.iter().map(ConsensusEvent::name).collect();
    assert_eq!(names, vec!["claim_created", "vouch_recorded", "claim_resolved"]);
    assert!(node.tick().unwrap().events.is_empty());
}

#[tokio::test]
async fn run_loop_stops_on_shutdown_and_persists() {
    let dir = tempfile::tempdir().expect("temp dir");
    let (node, clock) = open(&dir);
    let id = submit_primary(&node);
    clock.advance(31 * SECONDS_PER_DAY);

    let (stop, stopped) = tokio::sync::oneshot::channel::<()>();
    let (result, _) = tokio::join!(
        node.run(async {
            let _ = stopped.await;
        }),
        async {
            tokio::time::sleep(std::time::Duration::from_millis(50)).await;
            let _ = stop.send(());
        }
    );
    result.unwrap();

    // The first interval tick fires immediately and sweeps the claim.
    let (restarted, _) = open(&dir);
    let status = restarted
        .service()
        .read(|e| e.get_claim(id).map(|c| c.status))
        .unwrap();
    assert_eq!(status, Some(ClaimStatus::Expired));
}
