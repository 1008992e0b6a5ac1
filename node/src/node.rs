//! The Knomee node: wires governance, registry and consensus together, seeds
//! genesis identities, persists snapshots and drives the expiry sweep.

use std::collections::BTreeMap;
use std::fs;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::MissedTickBehavior;

use knomee_consensus::{
    ClaimStatus, ConsensusEvent, EngineSnapshot, IdentityConsensus, IdentityService,
};
use knomee_governance::GovernanceParameters;
use knomee_registry::IdentityRegistry;
use knomee_types::{Address, ClaimId, Clock, IdentityTier, SystemClock, Timestamp};

use crate::config::NodeConfig;
use crate::error::NodeError;
use crate::payouts::PayoutLedger;

/// Snapshot file name inside the data directory.
pub const SNAPSHOT_FILE: &str = "engine.snapshot";

/// Everything persisted between runs.
#[derive(Serialize, Deserialize)]
struct NodeState {
    engine: EngineSnapshot,
    payouts: BTreeMap<Address, u128>,
}

/// Outcome of one expiry sweep.
#[derive(Clone, Debug, Default)]
pub struct TickReport {
    pub expired: Vec<(ClaimId, ClaimStatus)>,
    pub events: Vec<ConsensusEvent>,
}

/// Point-in-time summary for operators.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeStatus {
    pub now: Timestamp,
    pub god_mode_active: bool,
    pub time_warp_secs: u64,
    pub claims: usize,
    pub active_claims: usize,
    pub identities: usize,
    pub linked: usize,
    pub primaries: usize,
    pub oracles: usize,
    pub burned_total: u128,
    pub credits_outstanding: u128,
}

/// A running Knomee node.
pub struct KnomeeNode<C: Clock = SystemClock> {
    config: NodeConfig,
    service: IdentityService<C, PayoutLedger>,
}

impl<C: Clock> KnomeeNode<C> {
    /// Restore from the data directory, or seed a fresh engine from `config`.
    pub fn open(config: NodeConfig, clock: C) -> Result<Self, NodeError> {
        config.validate()?;
        fs::create_dir_all(&config.data_dir)?;

        let path = snapshot_path(&config.data_dir);
        let (engine, payouts) = if path.exists() {
            let state = load_state(&path)?;
            if state.engine.address != config.engine_address {
                return Err(NodeError::Config(format!(
                    "snapshot belongs to engine {}, config names {}",
                    state.engine.address, config.engine_address
                )));
            }
            tracing::info!(
                path = %path.display(),
                claims = state.engine.claims.len(),
                identities = state.engine.registry.len(),
                "restored engine snapshot"
            );
            (
                IdentityConsensus::restore(state.engine, clock),
                PayoutLedger::from_balances(state.payouts),
            )
        } else {
            (genesis(&config, clock)?, PayoutLedger::new())
        };

        let node = Self {
            config,
            service: IdentityService::new(engine, payouts),
        };
        if !path.exists() {
            node.persist()?;
        }
        Ok(node)
    }

    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    /// The guarded engine boundary every entry point goes through.
    pub fn service(&self) -> &IdentityService<C, PayoutLedger> {
        &self.service
    }

    pub fn payouts(&self) -> &PayoutLedger {
        self.service.transfer()
    }

    pub fn snapshot_path(&self) -> PathBuf {
        snapshot_path(&self.config.data_dir)
    }

    /// Write the snapshot atomically: temp file, then rename over the old one.
    pub fn persist(&self) -> Result<(), NodeError> {
        let state = NodeState {
            engine: self.service.snapshot()?,
            payouts: self.payouts().balances(),
        };
        let bytes = bincode::serialize(&state).map_err(|e| NodeError::Snapshot(e.to_string()))?;

        let path = self.snapshot_path();
        let tmp = path.with_extension("tmp");
        fs::write(&tmp, &bytes)?;
        fs::rename(&tmp, &path)?;
        tracing::debug!(path = %path.display(), bytes = bytes.len(), "snapshot written");
        Ok(())
    }

    /// Finalize overdue claims, log every pending event, then persist.
    pub fn tick(&self) -> Result<TickReport, NodeError> {
        let expired = self.service.expire_claims()?;
        let events = self.service.drain_events()?;
        for event in &events {
            tracing::info!(event = event.name(), claim_id = ?event.claim_id(), "engine event");
        }
        self.persist()?;
        Ok(TickReport { expired, events })
    }

    pub fn status(&self) -> Result<NodeStatus, NodeError> {
        let credits_outstanding = self.payouts().total();
        Ok(self.service.read(|engine| {
            let registry = engine.registry();
            let governance = engine.governance();
            NodeStatus {
                now: engine.now(),
                god_mode_active: governance.god_mode_active(),
                time_warp_secs: governance.time_warp_secs(),
                claims: engine.claim_count(),
                active_claims: engine.active_claim_count(),
                identities: registry.len(),
                linked: registry
                    .iter()
                    .filter(|(_, id)| id.tier == IdentityTier::Linked)
                    .count(),
                primaries: registry.count_at_least(IdentityTier::Primary),
                oracles: registry.count_at_least(IdentityTier::Oracle),
                burned_total: engine.burned_total(),
                credits_outstanding,
            }
        })?)
    }

    /// Tick every `tick_interval_secs` until `shutdown` resolves, then persist.
    ///
    /// A failed tick is logged and the loop carries on.
    pub async fn run(&self, shutdown: impl Future<Output = ()>) -> Result<(), NodeError> {
        let period = Duration::from_secs(self.config.tick_interval_secs);
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tracing::info!(interval_secs = self.config.tick_interval_secs, "expiry loop started");
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    match self.tick() {
                        Ok(report) if !report.expired.is_empty() => {
                            tracing::info!(expired = report.expired.len(), "claims expired");
                        }
                        Ok(_) => {}
                        Err(e) => tracing::warn!(error = %e, "tick failed"),
                    }
                }
                () = &mut shutdown => break,
            }
        }

        self.persist()?;
        tracing::info!("expiry loop stopped");
        Ok(())
    }
}

fn snapshot_path(data_dir: &Path) -> PathBuf {
    data_dir.join(SNAPSHOT_FILE)
}

fn load_state(path: &Path) -> Result<NodeState, NodeError> {
    let bytes = fs::read(path)?;
    bincode::deserialize(&bytes)
        .map_err(|e| NodeError::Snapshot(format!("{}: {e}", path.display())))
}

/// Build a fresh engine: governors, god mode and the seeded genesis registry.
fn genesis<C: Clock>(config: &NodeConfig, clock: C) -> Result<IdentityConsensus<C>, NodeError> {
    let (first, rest) = config
        .governors
        .split_first()
        .ok_or_else(|| NodeError::Config("at least one governor is required".into()))?;
    let god_mode_authority = config.god_mode_authority.filter(|_| config.god_mode);
    let mut governance = GovernanceParameters::new(*first, god_mode_authority, config.params)?;
    for governor in rest {
        governance.grant_governor(first, *governor)?;
    }

    let writer = config.engine_address;
    let now = governance.current_time(clock.now());
    let mut registry = IdentityRegistry::new(writer);
    for primary in &config.genesis_primaries {
        registry.upgrade_to_primary(&writer, *primary, now)?;
    }
    for oracle in &config.genesis_oracles {
        registry.upgrade_to_oracle(&writer, *oracle, now)?;
    }

    tracing::info!(
        governors = config.governors.len(),
        primaries = config.genesis_primaries.len(),
        oracles = config.genesis_oracles.len(),
        god_mode = governance.god_mode_active(),
        "initialised engine from genesis config"
    );
    Ok(IdentityConsensus::with_registry(writer, governance, registry, clock))
}
