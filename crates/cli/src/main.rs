//! textloop CLI — the main entry point.
//!
//! Commands:
//! - `agent`   — Interactive chat or single-message mode
//! - `tools`   — List the built-in tools
//! - `prompt`  — Print the system prompt the model receives
//! - `config`  — Show, locate, create or validate the config file
//! - `doctor`  — Check the config and whether the provider is reachable

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "textloop",
    about = "textloop — a ReAct agent that thinks, acts and observes in plain text",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Chat with the agent
    Agent {
        /// Send a single message instead of entering interactive mode
        #[arg(short, long)]
        message: Option<String>,
    },

    /// List available tools
    Tools {
        /// Print full definitions, including parameter schemas, as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the system prompt
    Prompt,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Diagnose configuration and provider reachability
    Doctor,
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration (keys redacted)
    Show,
    /// Print the config file path
    Path,
    /// Write a default config file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Check the config file for errors
    Validate,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Logs go to stderr so answers on stdout stay pipeable
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    match cli.command {
        Commands::Agent { message } => commands::agent::run(message).await?,
        Commands::Tools { json } => commands::tools::run(json).await?,
        Commands::Prompt => commands::prompt::run().await?,
        Commands::Doctor => commands::doctor::run().await?,
        Commands::Config { action } => match action {
            ConfigAction::Show => commands::config_cmd::show().await?,
            ConfigAction::Path => commands::config_cmd::path().await?,
            ConfigAction::Init { force } => commands::config_cmd::init(force).await?,
            ConfigAction::Validate => commands::config_cmd::validate().await?,
        },
    }

    Ok(())
}
