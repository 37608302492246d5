//! Sitara CLI — the main entry point.
//!
//! Commands:
//! - `onboard` — Initialize the config file
//! - `run`     — Start a live session (or `--dry` to inspect the payload)
//! - `enqueue` — Append a contextual update to the update queue

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use sitara_config::AppConfig;

mod commands;

#[derive(Parser)]
#[command(
    name = "sitara",
    about = "Sitara — live session runner for a conversational astrology assistant",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to config.toml (defaults to ~/.sitara/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the configuration file
    Onboard,

    /// Start a live session with the remote agent
    Run {
        /// Print the resolved initiation payload and exit without connecting
        #[arg(long)]
        dry: bool,
    },

    /// Append a contextual update to the update queue and exit
    Enqueue {
        /// Update text to forward into the active session
        text: String,

        /// Only deliver to this session id
        #[arg(long)]
        conversation_id: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    let config = match &cli.config {
        Some(path) => AppConfig::load_with_env(path)?,
        None => AppConfig::load()?,
    };

    match cli.command {
        Commands::Onboard => commands::onboard::run(&cli.config).await?,
        Commands::Run { dry } => commands::run::run(config, dry).await?,
        Commands::Enqueue {
            text,
            conversation_id,
        } => commands::enqueue::run(&config, &text, conversation_id.as_deref()).await?,
    }

    Ok(())
}
