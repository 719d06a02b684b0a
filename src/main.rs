//! boardgraph CLI - Entry point
//!
//! Usage: boardgraph <command> [options]

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use boardgraph::cli::{Cli, Commands};

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    // Parse CLI arguments
    let cli = Cli::parse();

    match cli.command {
        Commands::Init(args) => boardgraph::cli::init::run(args),
        Commands::Boards(args) => boardgraph::cli::boards::execute(args),
        Commands::Stats(args) => boardgraph::cli::stats::execute(args),
    }
}
