//! `boardgraph init` command
//!
//! Creates the store file (or migrates an existing one to the current
//! schema version) and writes a default config.
//!
//! # Usage
//! ```bash
//! boardgraph init                    # Initialize in current directory
//! boardgraph init /path/to/project   # Initialize in specific path
//! boardgraph init --global           # Initialize global ~/.boardgraph
//! ```

use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::Args;

use crate::config::Config;
use crate::core::schema::{SchemaManager, SCHEMA_VERSION};

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Path to initialize (default: current directory)
    pub path: Option<PathBuf>,

    /// Initialize global config (~/.boardgraph)
    #[arg(long)]
    pub global: bool,

    /// Force re-initialization of the config file
    #[arg(short, long)]
    pub force: bool,
}

pub fn run(args: InitArgs) -> Result<()> {
    // --global targets the home directory (config lives at ~/.boardgraph)
    let base_path = if args.global {
        Config::global_config_path()
            .and_then(|p| p.parent().and_then(|d| d.parent()).map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from("."))
    } else {
        args.path.unwrap_or_else(|| PathBuf::from("."))
    };

    let store_dir = base_path.join(".boardgraph");
    let config_path = store_dir.join("config.toml");

    if config_path.exists() && !args.force {
        bail!(
            "{} already holds a board store. Use --force to rewrite the config.",
            base_path.display()
        );
    }

    println!("🚀 Initializing board store in: {}", base_path.display());

    fs::create_dir_all(&store_dir)?;

    let config = Config::default();
    config.save_to(&config_path)?;

    // Opening brings the schema to the current version
    let db_path = store_dir.join("boards.db");
    let conn = SchemaManager::open_or_initialize(&db_path, config.encryption_key().as_deref())?;
    drop(conn);

    println!("\n✅ Initialized board store (schema v{})", SCHEMA_VERSION);
    println!("   Config: {}", config_path.display());
    println!("   Database: {}", db_path.display());
    Ok(())
}
