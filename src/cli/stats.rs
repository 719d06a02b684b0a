//! Stats command - Show store statistics

use anyhow::Result;
use clap::Args;

use crate::config::Config;
use crate::core::events::EventBus;
use crate::core::schema::SCHEMA_VERSION;
use crate::core::store::GraphStore;

/// Stats command arguments
#[derive(Args, Debug)]
pub struct StatsArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Execute stats command
pub fn execute(args: StatsArgs) -> Result<()> {
    let config = Config::load()?;
    let db_path = config.db_path();
    let store = GraphStore::open(
        &db_path,
        config.encryption_key().as_deref(),
        EventBus::new(config.events.channel_capacity),
    )?;

    let stats = store.stats()?;

    if args.json {
        let json = serde_json::json!({
            "schema_version": SCHEMA_VERSION,
            "boards": stats.boards,
            "nodes": stats.nodes,
            "relations": stats.relations,
        });
        println!("{}", serde_json::to_string_pretty(&json)?);
    } else {
        println!("📊 Board Store Statistics\n");
        println!("  Schema version: {}", SCHEMA_VERSION);
        println!("  Boards:         {}", stats.boards);
        println!("  Nodes:          {}", stats.nodes);
        println!("  Relations:      {}", stats.relations);
        println!("\n📁 Database: {}", db_path.display());
    }

    Ok(())
}
