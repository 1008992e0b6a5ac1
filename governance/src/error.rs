use knomee_types::{AccessDenied, ErrorKind};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GovernanceError {
    #[error("invalid {which} threshold {value} (must be between 5100 and 10000 basis points)")]
    InvalidThreshold { which: &'static str, value: u32 },

    #[error("invalid stake multipliers: primary {primary}, duplicate {duplicate} (need duplicate >= primary >= 1)")]
    InvalidStakeMultiplier { primary: u32, duplicate: u32 },

    #[error("minimum stake must be greater than zero")]
    InvalidMinStake,

    #[error("invalid {which} slash rate {value} (must be at most 10000 basis points)")]
    InvalidSlashRate { which: &'static str, value: u32 },

    #[error("invalid vote weights: primary {primary}, oracle {oracle} (need oracle >= primary >= 1)")]
    InvalidVoteWeight { primary: u64, oracle: u64 },

    #[error("claim expiry duration must be greater than zero")]
    InvalidCooldown,

    #[error("invalid {which} decay rate {value} (must be at most 10000 basis points per day)")]
    InvalidDecayRate { which: &'static str, value: u32 },

    #[error("unauthorized: {0}")]
    Unauthorized(#[from] AccessDenied),

    #[error("cannot revoke the last governor")]
    LastGovernor,

    #[error("god mode is not active")]
    GodModeNotActive,

    #[error("god mode has already been renounced")]
    GodModeAlreadyRenounced,

    #[error("time warp overflow")]
    WarpOverflow,
}

impl GovernanceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Unauthorized(_) => ErrorKind::Authorization,
            Self::LastGovernor | Self::GodModeNotActive | Self::GodModeAlreadyRenounced => {
                ErrorKind::State
            }
            _ => ErrorKind::Validation,
        }
    }
}
