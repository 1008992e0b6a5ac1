//! Error taxonomy shared across crates.

use thiserror::Error;

/// How a failed call should be treated by the caller.
///
/// Every failure aborts the whole call with no state change; the kind only
/// tells the caller what went wrong. Nothing is retried internally.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed or insufficient input (bad justification, low stake, unknown claim type).
    Validation,
    /// The caller lacks the required role or tier.
    Authorization,
    /// The target is in the wrong state (claim closed, already vouched, cooldown, expired).
    State,
    /// A call re-entered the engine while another call was executing.
    Reentrancy,
}

/// Decoding errors for the types in this crate.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("unknown claim type: {0}")]
    UnknownClaimType(String),

    #[error("unknown identity tier: {0}")]
    UnknownTier(String),
}

impl TypeError {
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::Validation
    }
}
