//! Remove an installed multiplexer.

use std::path::PathBuf;

use clap::Args;
use paramux_config::{load_graph, load_table, save_documents};

/// Remove an installed multiplexer.
#[derive(Args)]
pub struct UninstallArgs {
    /// Parameter table (TOML), rewritten in place
    #[arg(short, long)]
    pub params: PathBuf,

    /// Controller graph (JSON), rewritten in place
    #[arg(short, long)]
    pub graph: PathBuf,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,
}

/// Run the uninstall command.
pub fn run(args: UninstallArgs) -> anyhow::Result<()> {
    let mut table = load_table(&args.params)?;
    let mut graph = load_graph(&args.graph)?;

    let report = paramux_core::uninstall(&mut table, &mut graph)?;
    save_documents(&table, &args.params, &graph, &args.graph)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }
    println!("Removed {}", report.batch);
    println!("  Layers:        {}", report.removed_layers.len());
    println!("  Channels:      {}", report.removed_channels.len());
    println!("  Table entries: {}", report.removed_entries.len());
    println!("Restored sync:   {}", report.restored.join(", "));
    Ok(())
}
