//! Helmsman CLI — the main entry point.
//!
//! Commands:
//! - `turn`       — Process a single input through the pipeline
//! - `repl`       — Interactive session with online strategy learning
//! - `init-model` — Write a fresh preference-model snapshot
//! - `stats`      — Show per-strategy statistics from a snapshot

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(
    name = "helmsman",
    about = "Helmsman — per-turn decision core for automated assistants",
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
    /// Process one input and print the resulting turn decision
    Turn {
        /// The user input to process
        input: String,

        /// Session id (defaults to a fresh random id)
        #[arg(short, long)]
        session: Option<String>,

        /// Print the full session context as JSON
        #[arg(long)]
        json: bool,
    },

    /// Interactive session with bandit-driven strategy selection
    Repl {
        /// Session id (defaults to a fresh random id)
        #[arg(short, long)]
        session: Option<String>,

        /// Preference-model snapshot to load on start and save on exit
        #[arg(short, long)]
        model: Option<PathBuf>,
    },

    /// Write a fresh preference-model snapshot to a file
    InitModel {
        /// Where to write the snapshot
        output: PathBuf,
    },

    /// Show per-strategy statistics from a model snapshot
    Stats {
        /// The snapshot file to inspect
        model: PathBuf,
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

    match cli.command {
        Commands::Turn { input, session, json } => commands::turn::run(&input, session, json).await?,
        Commands::Repl { session, model } => commands::repl::run(session, model).await?,
        Commands::InitModel { output } => commands::model::init(&output)?,
        Commands::Stats { model } => commands::model::stats(&model)?,
    }

    Ok(())
}
