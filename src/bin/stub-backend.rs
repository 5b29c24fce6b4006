use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

use bifrost_gateway::lifecycle::{signals, Shutdown};
use bifrost_gateway::observability::logging;
use bifrost_gateway::StubBackend;
use clap::Parser;
use tokio::net::TcpListener;

#[derive(Parser)]
#[command(name = "stub-backend")]
#[command(about = "In-memory backend serving the Bifrost gateway contract", long_about = None)]
struct Args {
    #[arg(short, long, default_value = "127.0.0.1:5001")]
    bind: String,

    /// Detection frames to ingest at startup, one JSON frame per line.
    #[arg(long)]
    seed: Option<PathBuf>,

    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    logging::init(&args.log_level);

    let stub = StubBackend::new();
    if let Some(path) = &args.seed {
        let added = stub.seed(BufReader::new(File::open(path)?))?;
        tracing::info!(path = %path.display(), items = added, "Seeded detections");
    }

    let listener = TcpListener::bind(&args.bind).await?;
    let shutdown = Shutdown::new();
    signals::spawn_signal_handler(shutdown.clone());

    stub.serve(listener, shutdown.subscribe()).await?;
    Ok(())
}
