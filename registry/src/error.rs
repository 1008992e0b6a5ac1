use knomee_types::{AccessDenied, Address, ErrorKind, IdentityTier};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("unauthorized: {0}")]
    Unauthorized(#[from] AccessDenied),

    #[error("platform label must be 1..={max} bytes, got {len}")]
    InvalidPlatform { len: usize, max: usize },

    #[error("an address cannot be linked to itself")]
    CannotLinkToSelf,

    #[error("{0} does not have primary tier")]
    NotAPrimaryId(Address),

    #[error("{0} is already primary or above")]
    AlreadyPrimary(Address),

    #[error("{address} is already linked to {primary}")]
    AlreadyLinked { address: Address, primary: Address },

    #[error("{0} has reached the maximum number of linked accounts")]
    MaxLinkedIdentitiesReached(Address),

    #[error("only primary identities can be upgraded to oracle")]
    MustBePrimaryToUpgrade,

    #[error("{0} is already an oracle")]
    AlreadyOracle(Address),

    #[error("cannot downgrade from {from} to {to}")]
    CannotDowngradeTier { from: IdentityTier, to: IdentityTier },

    #[error("{0} is already under challenge")]
    AlreadyUnderChallenge(Address),
}

impl RegistryError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Unauthorized(_) => ErrorKind::Authorization,
            Self::InvalidPlatform { .. } | Self::CannotLinkToSelf => ErrorKind::Validation,
            _ => ErrorKind::State,
        }
    }
}
