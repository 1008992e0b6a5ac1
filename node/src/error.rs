use knomee_types::ErrorKind;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NodeError {
    #[error("consensus error: {0}")]
    Consensus(#[from] knomee_consensus::ConsensusError),

    #[error("governance error: {0}")]
    Governance(#[from] knomee_governance::GovernanceError),

    #[error("registry error: {0}")]
    Registry(#[from] knomee_registry::RegistryError),

    #[error("config error: {0}")]
    Config(String),

    #[error("snapshot error: {0}")]
    Snapshot(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl NodeError {
    /// Taxonomy of engine errors; node-local failures count as state errors.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Consensus(e) => e.kind(),
            Self::Governance(e) => e.kind(),
            Self::Registry(e) => e.kind(),
            Self::Config(_) => ErrorKind::Validation,
            Self::Snapshot(_) | Self::Io(_) => ErrorKind::State,
        }
    }
}
