//! Schema Server
//!
//! Serves the registry to the database viewer over HTTP.

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;
use viewer_schemas::{server, SchemaConfig, SchemaRegistry};

#[derive(Parser)]
#[command(name = "schema-server")]
#[command(about = "Serve viewer record schemas at GET /schema")]
struct Cli {
    /// Config file (defaults to schemas.toml lookup)
    #[arg(short, long)]
    config: Option<String>,

    /// Override the configured bind host
    #[arg(long)]
    host: Option<String>,

    /// Override the configured port
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = SchemaConfig::load_from(cli.config.as_deref())
        .context("loading configuration")?;
    if let Some(host) = cli.host {
        config.server.host = host;
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }

    let registry = SchemaRegistry::from_config(&config.registry)?;
    server::serve(registry, &config.server)
        .await
        .with_context(|| format!("serving on {}", config.server.socket_addr()))
}
