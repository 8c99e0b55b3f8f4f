//! Install a multiplexer into graph and table documents.

use std::path::PathBuf;

use clap::Args;
use paramux_config::{load_graph, load_table, save_documents};
use paramux_core::{InstallContext, InstallError, InstallPlan, is_installed};

use super::common::{load_request, print_report};

/// Install a multiplexer.
#[derive(Args)]
pub struct InstallArgs {
    /// Request file path or saved request name
    #[arg(short, long)]
    pub request: String,

    /// Parameter table (TOML), rewritten in place
    #[arg(short, long)]
    pub params: PathBuf,

    /// Controller graph (JSON), rewritten in place
    #[arg(short, long)]
    pub graph: PathBuf,

    /// Build and print the install without writing any file
    #[arg(long)]
    pub dry_run: bool,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,
}

/// Run the install command.
pub fn run(args: InstallArgs) -> anyhow::Result<()> {
    let mut table = load_table(&args.params)?;
    let mut graph = load_graph(&args.graph)?;
    let request = load_request(&args.request, &table)?;

    if is_installed(&graph) {
        return Err(InstallError::AlreadyInstalled.into());
    }
    let ctx = InstallContext::capture(&request, &table, &graph)?;
    let plan = InstallPlan::build(&ctx)?;

    if args.dry_run {
        tracing::info!("dry run: no files written");
        return print_report(plan.report(), args.json);
    }

    let report = plan.commit(&mut table, &mut graph);
    save_documents(&table, &args.params, &graph, &args.graph)?;
    print_report(&report, args.json)
}
