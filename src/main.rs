//! Bifrost dev gateway.
//!
//! # Architecture Overview
//!
//! ```text
//!                      ┌──────────────────────────────────────────────┐
//!                      │                 DEV GATEWAY                  │
//!                      │                                              │
//!   Browser  GET /     │  ┌──────────┐    ┌───────────────────────┐   │
//!   ───────────────────┼─▶│  http    │───▶│ shell (MountedApp)    │───┼──┐
//!                      │  │ server   │    │  BubbleViewer         │   │  │ GET /collection
//!                      │  │          │    └───────────────────────┘   │  │
//!   Browser  /query…   │  │          │    ┌───────────────────────┐   │  ▼
//!   ───────────────────┼─▶│          │───▶│ routing (RouteTable)  │───┼─────▶ Backend
//!                      │  └──────────┘    └───────────────────────┘   │      (collections,
//!                      │                                              │       query, mqtt)
//!                      │  config · lifecycle · observability          │
//!                      └──────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use bifrost_gateway::config::{load_config, GatewayConfig};
use bifrost_gateway::lifecycle::startup;
use bifrost_gateway::observability::logging;
use clap::Parser;

#[derive(Parser)]
#[command(name = "bifrost-gateway")]
#[command(about = "Dev server and forwarding proxy for the Bifrost client", long_about = None)]
struct Args {
    /// TOML configuration file; built-in defaults when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => GatewayConfig::default(),
    };

    logging::init(&config.observability.log_level);
    tracing::info!("bifrost-gateway v{} starting", env!("CARGO_PKG_VERSION"));

    startup::run(config).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
