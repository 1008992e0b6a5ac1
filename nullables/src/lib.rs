//! Nullable infrastructure for deterministic testing.
//!
//! The engine reaches the outside world through two capabilities: a clock and
//! a value transfer. This crate provides test-friendly implementations that:
//! - Return deterministic values
//! - Can be controlled programmatically
//! - Record what they were asked to do
//!
//! Usage: swap real implementations for nullables in tests.

pub mod clock;
pub mod transfer;

pub use clock::NullClock;
pub use transfer::NullTransfer;
