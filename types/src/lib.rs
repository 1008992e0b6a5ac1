//! Fundamental types for the Knomee identity protocol.
//!
//! This crate defines the core types shared across every other crate in the workspace:
//! addresses, timestamps with the clock and value-transfer capabilities, identity tiers, claim types,
//! basis-point arithmetic, the error taxonomy, and the access policy.

pub mod address;
pub mod bps;
pub mod claim;
pub mod error;
pub mod policy;
pub mod state;
pub mod time;
pub mod transfer;

pub use address::Address;
pub use bps::{apply_bps, pro_rata, ratio_bps, BASIS_POINTS};
pub use claim::{ClaimId, ClaimType};
pub use error::{ErrorKind, TypeError};
pub use policy::{AccessDenied, AccessPolicy, Role};
pub use state::IdentityTier;
pub use time::{Clock, SystemClock, Timestamp, SECONDS_PER_DAY};
pub use transfer::ValueTransfer;
