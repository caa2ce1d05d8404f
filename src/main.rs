//! Chirpy - Main Application

use anyhow::Context;
use chirpy::{config::AppConfig, server::start_server};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Chirpy - HTTP server with a hit counter and chirp validation
#[derive(Parser)]
#[command(name = "chirpy")]
#[command(about = "Serves static files, counts hits, and validates chirps")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Configuration file path
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Server host
    #[arg(long, env = "CHIRPY_HOST")]
    host: Option<String>,

    /// Server port
    #[arg(short, long, env = "CHIRPY_PORT")]
    port: Option<u16>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    json_logs: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve,
    /// Show current configuration
    Config,
    /// Show the resolved route table
    Routes,
}

#[tokio::main]
async fn main() -> chirpy::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        "chirpy=debug,tower_http=debug"
    } else {
        "chirpy=info"
    };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| filter.into());
    let registry = tracing_subscriber::registry().with(env_filter);
    if cli.json_logs {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    let mut config = AppConfig::load(&cli.config)
        .with_context(|| format!("Failed to load configuration from {}", cli.config))?;

    // Override with CLI args
    if let Some(host) = cli.host {
        config.server.host = host;
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }

    match cli.command {
        Some(Commands::Serve) | None => {
            tracing::info!(
                host = %config.server.host,
                port = %config.server.port,
                root = %config.files.root,
                "Starting chirpy"
            );
            start_server(config).await?;
        }
        Some(Commands::Config) => {
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
        Some(Commands::Routes) => {
            for (method, path, counted) in config.route_summary() {
                let note = if counted { "  (counted)" } else { "" };
                println!("{:<8} {}{}", method, path, note);
            }
        }
    }

    Ok(())
}
