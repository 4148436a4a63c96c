//! # Clockchain Node
//!
//! Binary entry point: parse flags, install logging, run until Ctrl+C.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use node_runtime::container::NodeConfig;
use node_runtime::telemetry::init_tracing;
use node_runtime::NodeRuntime;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "node-runtime")]
#[command(author, version, about = "Clockchain peer-to-peer node", long_about = None)]
struct Args {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// First port to try for the HTTP server (overrides config and CC_PORT)
    #[arg(short, long)]
    port: Option<u16>,

    /// Default log level when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    log_level: String,
}

/// Load configuration from file, environment and flags.
fn load_config(args: &Args) -> Result<NodeConfig> {
    let mut config = NodeConfig::load(args.config.as_deref())?;
    config.apply_env()?;
    if let Some(port) = args.port {
        config.port = port;
    }
    config.validate()?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(&args.log_level)?;

    let config = load_config(&args).context("Invalid configuration")?;

    let runtime = NodeRuntime::new(config)?;
    runtime.start().await?;

    // Keep the node running
    info!("Node is running. Press Ctrl+C to stop.");
    tokio::signal::ctrl_c().await?;

    runtime.shutdown().await;
    Ok(())
}
