//! Show generated artifacts in a graph.

use std::path::PathBuf;

use clap::Args;
use paramux_config::{load_graph, load_table};
use paramux_core::is_installed;

/// Show what a graph has installed.
#[derive(Args)]
pub struct StatusArgs {
    /// Controller graph (JSON)
    #[arg(short, long)]
    pub graph: PathBuf,

    /// Parameter table (TOML), to report budget use
    #[arg(short, long)]
    pub params: Option<PathBuf>,
}

/// Run the status command.
pub fn run(args: StatusArgs) -> anyhow::Result<()> {
    let graph = load_graph(&args.graph)?;

    if is_installed(&graph) {
        println!("Installed");
    } else {
        println!("Not installed");
    }

    let layers: Vec<_> = graph
        .layers()
        .filter_map(|l| l.marker.map(|m| (l, m)))
        .collect();
    if !layers.is_empty() {
        println!();
        println!("Layers");
        for (layer, marker) in layers {
            println!("  {:<24} {:?} ({})", layer.name, marker.category, marker.batch);
        }
    }

    let channels: Vec<_> = graph
        .channels()
        .filter_map(|c| c.marker.map(|m| (c, m)))
        .collect();
    if !channels.is_empty() {
        println!();
        println!("Channels");
        for (channel, marker) in channels {
            println!(
                "  {:<24} {:<6} {:?}",
                channel.name,
                channel.kind.to_string(),
                marker.category
            );
        }
    }

    if let Some(path) = &args.params {
        let table = load_table(path)?;
        println!();
        println!(
            "Budget: {} / {} bits ({} generated entries)",
            table.used_bits(),
            table.budget_bits,
            table.generated().count()
        );
    }
    Ok(())
}
