//! ClinicDesk CLI - Command-line interface for the access core
//!
//! Usage:
//!   clinic                              - Start interactive mode
//!   clinic screens [--config <file>]    - List screens and their requirements
//!   clinic check --role <role>          - Evaluate every screen for a role
//!   clinic roles [--all]                - List roles from the seed

use clap::{Parser, Subcommand};
use cli::commands::{load_config, load_seed, CheckCommand, RolesCommand, ScreensCommand};
use cli::interactive::InteractiveCli;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "clinic")]
#[command(about = "ClinicDesk - Back-office access control")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Access configuration for interactive mode (JSON or YAML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Seed file for interactive mode (YAML); built-in demo when omitted
    #[arg(short, long)]
    seed: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// List screens and their requirements
    Screens(ScreensCommand),
    /// Evaluate every screen for a role
    Check(CheckCommand),
    /// List roles
    Roles(RolesCommand),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Screens(cmd)) => cmd.run(),
        Some(Commands::Check(cmd)) => cmd.run(),
        Some(Commands::Roles(cmd)) => cmd.run(),
        None => {
            // No subcommand - start interactive mode
            let config = load_config(cli.config.as_deref())?;
            let seed = load_seed(cli.seed.as_deref())?;
            tracing::debug!(accounts = seed.accounts.len(), "Starting interactive mode");
            let mut interactive = InteractiveCli::new(&config, seed)?;
            interactive.run().await
        }
    }
}
