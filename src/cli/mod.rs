//! CLI module - Command definitions and handlers

use clap::{Parser, Subcommand};

pub mod boards;
pub mod init;
pub mod stats;

/// boardgraph - board graph persistence for a desktop knowledge board
#[derive(Parser, Debug)]
#[command(name = "boardgraph")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Config file path
    #[arg(short, long, global = true, env = "BOARDGRAPH_CONFIG")]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize (or migrate) a board store
    Init(init::InitArgs),

    /// List boards for an owner
    Boards(boards::BoardsArgs),

    /// Show store statistics
    Stats(stats::StatsArgs),
}
