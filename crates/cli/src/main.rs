//! aulabot CLI, the main entry point.
//!
//! Commands:
//! - `chat`    Ask an agent, once or interactively
//! - `models`  List models of configured providers
//! - `agents`  List available agents
//! - `doctor`  Check configuration and credentials

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "aulabot",
    about = "Research and Aula school-portal agents",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file (default: ~/.aulabot/config.toml)
    #[arg(short, long, global = true, env = "AULABOT_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Chat with an agent
    Chat {
        /// Agent type (research_agent, aula_agent)
        #[arg(short, long)]
        agent: Option<String>,

        /// Model identifier, e.g. gpt-4o or anthropic:claude-3-5-sonnet-20241022
        #[arg(long)]
        model: Option<String>,

        /// Send a single message instead of entering interactive mode
        #[arg(short, long)]
        message: Option<String>,
    },

    /// List available models
    Models {
        /// Print JSON
        #[arg(long)]
        json: bool,
    },

    /// List available agents
    Agents {
        /// Print JSON
        #[arg(long)]
        json: bool,
    },

    /// Diagnose configuration and credentials
    Doctor,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config_path = cli.config.as_deref();
    match cli.command {
        Commands::Chat {
            agent,
            model,
            message,
        } => commands::chat::run(config_path, agent, model, message).await?,
        Commands::Models { json } => commands::models::run(config_path, json)?,
        Commands::Agents { json } => commands::agents::run(config_path, json)?,
        Commands::Doctor => commands::doctor::run(config_path).await?,
    }

    Ok(())
}
