//! Paramux CLI - install and remove parameter multiplexers in controller graphs.

mod commands;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "paramux")]
#[command(author, version, about = "Parameter multiplexing graph synthesizer", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Install a multiplexer into a graph and its parameter table
    Install(commands::install::InstallArgs),

    /// Remove an installed multiplexer
    Uninstall(commands::uninstall::UninstallArgs),

    /// Show what a graph has installed
    Status(commands::status::StatusArgs),

    /// Print the bucket layout of a request without touching any file
    Plan(commands::plan::PlanArgs),
}

fn main() -> anyhow::Result<()> {
    // Logs go to stderr so --json output stays parseable
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();
    tracing_log::LogTracer::init().ok();

    let cli = Cli::parse();

    match cli.command {
        Commands::Install(args) => commands::install::run(args),
        Commands::Uninstall(args) => commands::uninstall::run(args),
        Commands::Status(args) => commands::status::run(args),
        Commands::Plan(args) => commands::plan::run(args),
    }
}
