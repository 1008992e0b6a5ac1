//! Knomee daemon: operator entry point for a Knomee node.

use anyhow::Context;
use clap::Parser;
use serde::Serialize;
use std::path::PathBuf;

use knomee_consensus::{IdentityClaim, Settlement, Vouch};
use knomee_node::{init_logging, shutdown_signal, KnomeeNode, NodeConfig};
use knomee_types::{Address, ClaimId, SystemClock};

#[derive(Parser)]
#[command(name = "knomee-daemon", about = "Knomee identity consensus node")]
struct Cli {
    /// Path to a TOML configuration file. If provided, file settings
    /// are used as the base; CLI flags and env vars override them.
    #[arg(long, env = "KNOMEE_CONFIG")]
    config: Option<PathBuf>,

    /// Data directory holding the engine snapshot.
    #[arg(long, env = "KNOMEE_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "KNOMEE_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log format: "human" or "json".
    #[arg(long, env = "KNOMEE_LOG_FORMAT")]
    log_format: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Sweep expired claims on an interval until Ctrl-C.
    Run,
    /// Run one expiry sweep and exit.
    Tick,
    /// Print node status as JSON.
    Status,
    /// Print the effective governance parameters as TOML.
    Params,
    /// Print a claim with its vouches and settlement as JSON.
    Claim { id: ClaimId },
    /// Print an identity record as JSON.
    Identity { address: Address },
    /// Advance protocol time (god mode only).
    Warp {
        #[arg(long)]
        caller: Address,
        #[arg(long)]
        secs: u64,
    },
    /// Permanently disable god mode.
    RenounceGodMode {
        #[arg(long)]
        caller: Address,
    },
}

#[derive(Serialize)]
struct ClaimView<'a> {
    claim: &'a IdentityClaim,
    vouches: &'a [Vouch],
    settlement: Option<&'a Settlement>,
}

fn load_config(cli: &Cli) -> anyhow::Result<NodeConfig> {
    let mut config = match &cli.config {
        Some(path) => NodeConfig::from_toml_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => NodeConfig::default(),
    };
    if let Some(dir) = &cli.data_dir {
        config.data_dir = dir.clone();
    }
    if let Some(level) = &cli.log_level {
        config.log_level = level.clone();
    }
    if let Some(format) = &cli.log_format {
        config.log_format = format.clone();
    }
    Ok(config)
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;
    init_logging(config.log_format()?, &config.log_level)?;

    let node = KnomeeNode::open(config, SystemClock).context("opening node")?;
    let service = node.service();

    match cli.command {
        Command::Run => {
            node.run(shutdown_signal()).await?;
            tracing::info!("Knomee daemon exited cleanly");
        }
        Command::Tick => {
            let report = node.tick()?;
            tracing::info!(
                expired = report.expired.len(),
                events = report.events.len(),
                "tick complete"
            );
            print_json(&report.expired)?;
        }
        Command::Status => print_json(&node.status()?)?,
        Command::Params => {
            let params = service.read(|e| *e.governance().params())?;
            print!("{}", toml::to_string_pretty(&params)?);
        }
        Command::Claim { id } => {
            let json = service.read(|e| {
                e.get_claim(id).map(|claim| {
                    serde_json::to_string_pretty(&ClaimView {
                        claim,
                        vouches: e.get_vouches(id),
                        settlement: e.get_settlement(id),
                    })
                })
            })?;
            match json {
                Some(json) => println!("{}", json?),
                None => anyhow::bail!("claim {id} not found"),
            }
        }
        Command::Identity { address } => {
            print_json(&service.read(|e| e.get_identity(&address))?)?;
        }
        Command::Warp { caller, secs } => {
            let total = service.warp_time(&caller, secs)?;
            node.persist()?;
            println!("time warp offset is now {total}s");
        }
        Command::RenounceGodMode { caller } => {
            service.renounce_god_mode(&caller)?;
            node.persist()?;
            println!("god mode renounced");
        }
    }

    Ok(())
}
