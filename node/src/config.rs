//! Node configuration with TOML file support.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use knomee_governance::GovernanceParams;
use knomee_types::Address;

use crate::logging::LogFormat;
use crate::NodeError;

/// Registry-writer identity of the local engine when none is configured.
pub const DEFAULT_ENGINE_ADDRESS: Address = Address::from_bytes([0xEE; 32]);

/// Configuration for a Knomee node.
///
/// Can be loaded from a TOML file via [`NodeConfig::from_toml_file`] or
/// built programmatically (e.g. for tests).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Directory holding the engine snapshot.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// The engine's own address: the only caller allowed to write the registry.
    #[serde(default = "default_engine_address")]
    pub engine_address: Address,

    /// Initial governor set. The first entry creates the store.
    #[serde(default)]
    pub governors: Vec<Address>,

    /// Holder of the testing-only god-mode role.
    #[serde(default)]
    pub god_mode_authority: Option<Address>,

    /// Start with god mode active. Ignored once a snapshot exists.
    #[serde(default)]
    pub god_mode: bool,

    /// Addresses seeded as Primary on first start.
    #[serde(default)]
    pub genesis_primaries: Vec<Address>,

    /// Genesis primaries additionally promoted to Oracle on first start.
    #[serde(default)]
    pub genesis_oracles: Vec<Address>,

    /// Log format: "human" or "json".
    #[serde(default = "default_log_format")]
    pub log_format: String,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Seconds between expiry sweeps in `run` mode.
    #[serde(default = "default_tick_interval_secs")]
    pub tick_interval_secs: u64,

    /// Initial governance parameters. Ignored once a snapshot exists.
    #[serde(default)]
    pub params: GovernanceParams,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_data_dir() -> PathBuf {
    PathBuf::from("./knomee_data")
}

fn default_engine_address() -> Address {
    DEFAULT_ENGINE_ADDRESS
}

fn default_log_format() -> String {
    "human".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_tick_interval_secs() -> u64 {
    60
}

// ── Impl ───────────────────────────────────────────────────────────────

impl NodeConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, NodeError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| NodeError::Config(format!("{}: {e}", path.as_ref().display())))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, NodeError> {
        toml::from_str(s).map_err(|e| NodeError::Config(e.to_string()))
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> Result<String, NodeError> {
        toml::to_string_pretty(self).map_err(|e| NodeError::Config(e.to_string()))
    }

    pub fn log_format(&self) -> Result<LogFormat, NodeError> {
        self.log_format.parse()
    }

    /// Check everything the node needs before it touches the data directory.
    pub fn validate(&self) -> Result<(), NodeError> {
        if self.governors.is_empty() {
            return Err(NodeError::Config("at least one governor is required".into()));
        }
        let named = std::iter::once(("engine_address", &self.engine_address))
            .chain(self.governors.iter().map(|a| ("governors", a)))
            .chain(self.god_mode_authority.iter().map(|a| ("god_mode_authority", a)))
            .chain(self.genesis_primaries.iter().map(|a| ("genesis_primaries", a)));
        for (field, address) in named {
            if address.is_zero() {
                return Err(NodeError::Config(format!("{field}: the zero address is not allowed")));
            }
        }
        if self.god_mode && self.god_mode_authority.is_none() {
            return Err(NodeError::Config("god_mode requires god_mode_authority".into()));
        }
        if let Some(oracle) = self
            .genesis_oracles
            .iter()
            .find(|o| !self.genesis_primaries.contains(*o))
        {
            return Err(NodeError::Config(format!(
                "genesis oracle {oracle} must also be a genesis primary"
            )));
        }
        if self.tick_interval_secs == 0 {
            return Err(NodeError::Config("tick_interval_secs must be positive".into()));
        }
        self.log_format()?;
        self.params.validate()?;
        Ok(())
    }
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            engine_address: default_engine_address(),
            governors: Vec::new(),
            god_mode_authority: None,
            god_mode: false,
            genesis_primaries: Vec::new(),
            genesis_oracles: Vec::new(),
            log_format: default_log_format(),
            log_level: default_log_level(),
            tick_interval_secs: default_tick_interval_secs(),
            params: GovernanceParams::default(),
        }
    }
}
