//! Knomee node: hosts the identity consensus engine.
//!
//! The node is the coordinator that:
//! - Loads configuration and validates governance parameters
//! - Seeds genesis primaries and oracles on first start
//! - Restores and persists engine snapshots in the data directory
//! - Credits reward payouts to a persisted ledger
//! - Sweeps expired claims on a fixed interval until shutdown

pub mod config;
pub mod error;
pub mod logging;
pub mod node;
pub mod payouts;
pub mod shutdown;

pub use config::{NodeConfig, DEFAULT_ENGINE_ADDRESS};
pub use error::NodeError;
pub use logging::{init_logging, LogFormat};
pub use node::{KnomeeNode, NodeStatus, TickReport, SNAPSHOT_FILE};
pub use payouts::PayoutLedger;
pub use shutdown::shutdown_signal;
