//! Boards command - list boards for an owner

use anyhow::Result;
use clap::Args;
use colored::Colorize;

use crate::config::Config;
use crate::core::events::EventBus;
use crate::core::store::GraphStore;

/// Boards command arguments
#[derive(Args, Debug)]
pub struct BoardsArgs {
    /// Owner whose boards to list
    #[arg(short, long)]
    pub owner: String,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Execute boards command
pub fn execute(args: BoardsArgs) -> Result<()> {
    let config = Config::load()?;
    let store = GraphStore::open(
        &config.db_path(),
        config.encryption_key().as_deref(),
        EventBus::new(config.events.channel_capacity),
    )?;

    let boards = store.get_user_boards(&args.owner)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&boards)?);
        return Ok(());
    }

    if boards.is_empty() {
        println!("No boards for owner {}", args.owner.bold());
        return Ok(());
    }

    println!("📋 Boards for {}\n", args.owner.bold());
    for board in &boards {
        let aggregate = store.get_board(board.id)?;
        let (nodes, relations) = aggregate
            .map(|a| (a.nodes.len(), a.all_relations().len()))
            .unwrap_or((0, 0));

        println!(
            "  {} {} ({}, {} nodes, {} relations)",
            board.id.to_string().dimmed(),
            board.name.bold(),
            board.visibility,
            nodes,
            relations
        );
    }

    Ok(())
}
