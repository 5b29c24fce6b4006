use std::process::ExitCode;

use bifrost_gateway::gateway::types::CollectionQuery;
use bifrost_gateway::{GatewayClient, GatewayError};
use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::Value;

#[derive(Parser)]
#[command(name = "gateway-cli")]
#[command(about = "Command-line client for the Bifrost backend contract", long_about = None)]
struct Cli {
    /// Gateway or backend base URL.
    #[arg(short, long, default_value = "http://127.0.0.1:5173")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List detections grouped by label
    Detections,
    /// List collections with item counts
    Collections,
    /// Show one collection and its items
    Collection { name: String },
    /// Create an empty collection
    Create { name: String },
    /// Delete a collection
    Delete { name: String },
    /// Per-label statistics
    Stats { label: String },
    /// Ask a free-text question
    Query { question: String },
    /// Filter a collection by metadata
    QueryCollection {
        name: String,
        /// Metadata filter as key=value, repeatable
        #[arg(short, long, value_parser = parse_filter)]
        filter: Vec<(String, String)>,
    },
    /// Control the MQTT ingestion session
    Mqtt {
        #[command(subcommand)]
        action: MqttAction,
    },
}

#[derive(Subcommand)]
enum MqttAction {
    Start,
    Stop,
    Status,
}

fn parse_filter(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected key=value, got '{raw}'")),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let client = match GatewayClient::new(&cli.url) {
        Ok(client) => client,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::from(2);
        }
    };

    match run(&client, cli.command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            if e.is_network() {
                ExitCode::from(2)
            } else {
                ExitCode::from(1)
            }
        }
    }
}

async fn run(client: &GatewayClient, command: Commands) -> Result<(), GatewayError> {
    match command {
        Commands::Detections => print_json(&client.list_detections().await?),
        Commands::Collections => print_json(&client.list_collections().await?),
        Commands::Collection { name } => print_json(&client.fetch_collection(&name).await?),
        Commands::Create { name } => print_json(&client.create_collection(&name).await?),
        Commands::Delete { name } => {
            client.delete_collection(&name).await?;
            println!("deleted {name}");
            Ok(())
        }
        Commands::Stats { label } => print_json(&client.label_stats(&label).await?),
        Commands::Query { question } => {
            let answer = client.query(&question).await?;
            println!("{}", answer.answer);
            Ok(())
        }
        Commands::QueryCollection { name, filter } => {
            let query = CollectionQuery {
                collection: name,
                filter: filter
                    .into_iter()
                    .map(|(k, v)| (k, Value::String(v)))
                    .collect(),
            };
            print_json(&client.query_collection(&query).await?)
        }
        Commands::Mqtt { action } => {
            let session = client.session();
            match action {
                MqttAction::Start => print_json(&session.start().await?),
                MqttAction::Stop => print_json(&session.stop().await?),
                MqttAction::Status => print_json(&session.status().await?),
            }
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<(), GatewayError> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| GatewayError::Decode(e.to_string()))?;
    println!("{text}");
    Ok(())
}
