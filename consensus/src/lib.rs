//! Consensus: identity claims resolved by stake-weighted vouching.
//!
//! An address files a claim (link to a primary, become a primary, or flag a
//! duplicate) and locks a stake. Primaries and oracles vouch for or against it,
//! each locking their own stake and contributing their tier weight:
//! - A claim is approved as soon as the supporting share of weight reaches the
//!   claim type's threshold.
//! - Once the voting window closes, a claim that did not get there is rejected
//!   if the opposing share holds the threshold, and expires otherwise.
//! - Resolution freezes a settlement: losers are slashed and the forfeited pool
//!   is split among winners pro rata by stake. Expired claims refund everyone.
//!
//! ## Module overview
//!
//! - [`claim`]: Claims, vouches and the claim lifecycle.
//! - [`tally`]: Pure vouch application and threshold evaluation.
//! - [`settlement`]: Slashing and reward distribution.
//! - [`engine`]: The consensus state machine over governance and the registry.
//! - [`service`]: Thread-safe wrapper with reentrancy protection and payouts.
//! - [`events`]: Events emitted for subscribers.
//! - [`error`]: Consensus error types.

pub mod claim;
pub mod engine;
pub mod error;
pub mod events;
pub mod service;
pub mod settlement;
pub mod tally;

pub use claim::{ClaimStatus, IdentityClaim, Vouch};
pub use engine::{
    ClaimRecord, EngineSnapshot, IdentityConsensus, MAX_EVIDENCE_LEN, MAX_JUSTIFICATION_LEN,
};
pub use error::ConsensusError;
pub use events::ConsensusEvent;
pub use service::IdentityService;
pub use settlement::{compute_settlement, Participant, Settlement, SettlementEntry};
pub use tally::{apply_vouch, evaluate_expiry, evaluate_threshold, Resolution};
