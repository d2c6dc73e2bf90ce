//! GRISERA - Main Server
//!
//! Signal-series REST API over the Graph API.

use anyhow::Result;
use clap::{Parser, Subcommand};
use grisera::Config;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "grisera")]
#[command(about = "GRISERA signal-series server")]
struct Cli {
    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the REST server
    Serve {
        /// Port to listen on (overrides config.yaml and SERVER_PORT)
        #[arg(short, long)]
        port: Option<u16>,

        /// Path to the YAML config file
        #[arg(short, long, env = "GRISERA_CONFIG")]
        config: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,grisera=debug,tower_http=debug".into());
    let registry = tracing_subscriber::registry().with(filter);
    if cli.json_logs {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    match cli.command {
        Commands::Serve { port, config } => {
            let mut config = Config::from_yaml_and_env(config.as_deref())?;
            if let Some(port) = port {
                config.server_port = port;
            }
            grisera::start_server(config).await
        }
    }
}
