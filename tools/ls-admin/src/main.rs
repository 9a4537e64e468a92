//! LS-Admin: Library-Share Ledger operator CLI
//!
//! Lists reconciliation incidents, runs a sweep against the configured
//! JSON-RPC endpoint and mirror database, and prints metrics.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use ls_01_chain_gateway::{ContractGateway, JsonRpcProvider};
use ls_02_reconciliation::{
    IncidentJournal, ReconciliationCoordinator, ReconciliationIncident, ReconciliationSweeper,
    ServiceConfig, SqliteMirrorStore,
};
use ls_telemetry::{encode_metrics, init_telemetry, TelemetryConfig};
use ls_types::{address_hex, hash_hex};

/// LS-Admin: Library-Share Ledger operator CLI
#[derive(Parser, Debug)]
#[command(name = "ls-admin")]
#[command(about = "Inspect and repair on-chain/off-chain reconciliation incidents")]
struct Args {
    /// TOML configuration file (LS_* environment variables still override it)
    #[arg(short, long, env = "LS_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List pending reconciliation incidents
    Incidents {
        /// Maximum incidents to show
        #[arg(short, long, default_value = "50")]
        limit: usize,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Run one reconciliation sweep
    Sweep {
        /// Print the Prometheus exposition after the sweep
        #[arg(long)]
        metrics: bool,
    },
    /// Print the Prometheus exposition
    Metrics,
}

fn load_config(path: Option<&PathBuf>) -> Result<ServiceConfig> {
    let mut config = match path {
        Some(path) => ServiceConfig::load(path)?,
        None => ServiceConfig::default(),
    };
    config.apply_env()?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let _telemetry = init_telemetry(TelemetryConfig::for_component("admin"))?;
    let config = load_config(args.config.as_ref()).context("loading configuration")?;

    match args.command {
        Command::Incidents { limit, json } => list_incidents(&config, limit, json).await,
        Command::Sweep { metrics } => {
            sweep(&config).await?;
            if metrics {
                print!("{}", encode_metrics()?);
            }
            Ok(())
        }
        Command::Metrics => {
            print!("{}", encode_metrics()?);
            Ok(())
        }
    }
}

fn open_store(config: &ServiceConfig) -> Result<Arc<SqliteMirrorStore>> {
    let store = SqliteMirrorStore::open(&config.store_path)
        .with_context(|| format!("opening mirror store at {}", config.store_path))?;
    Ok(Arc::new(store))
}

async fn list_incidents(config: &ServiceConfig, limit: usize, json: bool) -> Result<()> {
    let store = open_store(config)?;
    let incidents = store.pending(limit).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&incidents)?);
        return Ok(());
    }
    if incidents.is_empty() {
        println!("No pending incidents");
        return Ok(());
    }

    println!(
        "{:<36}  {:<22}  {:<24}  {:<66}  {:>8}  LAST ERROR",
        "ID", "KIND", "OPERATION", "TX HASH", "ATTEMPTS"
    );
    for incident in &incidents {
        println!("{}", row(incident));
    }
    Ok(())
}

fn row(incident: &ReconciliationIncident) -> String {
    format!(
        "{:<36}  {:<22}  {:<24}  {:<66}  {:>8}  {} (actor {})",
        incident.id,
        incident.kind.as_str(),
        incident.operation.kind().as_str(),
        hash_hex(&incident.tx_hash),
        incident.attempts,
        incident.last_error.as_deref().unwrap_or("-"),
        address_hex(&incident.actor),
    )
}

async fn sweep(config: &ServiceConfig) -> Result<()> {
    config.validate()?;

    let provider = JsonRpcProvider::from_config(config.rpc_url.clone(), &config.gateway)
        .map_err(|e| anyhow!("connecting to {}: {}", config.rpc_url, e))?;
    let gateway = Arc::new(ContractGateway::new(
        Arc::new(provider),
        config.gateway.clone(),
    ));
    let store = open_store(config)?;
    let coordinator = ReconciliationCoordinator::new(gateway, store.clone(), store);
    let sweeper = ReconciliationSweeper::new(Arc::new(coordinator), config.reconciliation.clone());

    info!(rpc_url = %config.rpc_url, store = %config.store_path, "Starting sweep");
    let report = sweeper.sweep().await?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
