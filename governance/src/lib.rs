//! Governance parameters for the Knomee identity protocol.
//!
//! A single store per deployment holding every tunable constant the consensus
//! engine reads: per-claim-type thresholds, stake requirements and slash rates,
//! tier vote weights, cooldowns and decay rates. Setters are restricted to the
//! governor set and validate their own section before anything is written.
//!
//! The store also carries the testing-only god mode: while active, the god-mode
//! authority may warp the protocol clock forward. Renouncing god mode clears the
//! warp and is permanent.

pub mod error;
pub mod parameters;
pub mod params;

pub use error::GovernanceError;
pub use parameters::{GovernanceParameters, ParamSection};
pub use params::{Cooldowns, DecayRates, GovernanceParams, Slashing, Staking, Thresholds, VotingWeights};
