//! Print the bucket layout a request would produce.

use std::path::PathBuf;

use clap::Args;
use paramux_config::{load_graph, load_table};
use paramux_core::{InstallContext, InstallPlan};

use super::common::{graph_from_table, load_request, print_report};

/// Plan an install without touching any file.
#[derive(Args)]
pub struct PlanArgs {
    /// Request file path or saved request name
    #[arg(short, long)]
    pub request: String,

    /// Parameter table (TOML)
    #[arg(short, long)]
    pub params: PathBuf,

    /// Controller graph (JSON); one channel per table entry when omitted
    #[arg(short, long)]
    pub graph: Option<PathBuf>,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,
}

/// Run the plan command.
pub fn run(args: PlanArgs) -> anyhow::Result<()> {
    let table = load_table(&args.params)?;
    let graph = match &args.graph {
        Some(path) => load_graph(path)?,
        None => graph_from_table(&table),
    };
    let request = load_request(&args.request, &table)?;

    let ctx = InstallContext::capture(&request, &table, &graph)?;
    let plan = InstallPlan::build(&ctx)?;
    print_report(plan.report(), args.json)
}
