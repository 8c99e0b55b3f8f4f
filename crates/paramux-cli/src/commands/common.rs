//! Shared helpers for CLI commands.

use paramux_config::{InstallRequestFile, validate_request};
use paramux_core::{
    Channel, ChannelKind, ControllerGraph, InstallReport, InstallRequest, ParamTable,
};

/// Loads a request by path or saved name and validates it against `table`.
pub fn load_request(name: &str, table: &ParamTable) -> anyhow::Result<InstallRequest> {
    let request = InstallRequestFile::find(name)?.to_request();
    validate_request(&request, table)?;
    Ok(request)
}

/// A graph holding one channel per table entry, for planning without a graph.
pub fn graph_from_table(table: &ParamTable) -> ControllerGraph {
    let mut graph = ControllerGraph::new();
    for entry in table.entries() {
        let kind = ChannelKind::from(entry.kind);
        graph.add_channel_if_absent(Channel::new(entry.name.clone(), kind));
    }
    graph
}

fn list(names: &[String]) -> String {
    if names.is_empty() {
        "-".to_string()
    } else {
        names.join(", ")
    }
}

/// Prints an install report as text or JSON.
pub fn print_report(report: &InstallReport, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }

    println!("Batch:            {}", report.batch);
    println!("Steps:            {}", report.steps);
    println!("Address channels: {}", list(&report.address_channels));
    println!("Data channels:    {}", list(&report.data_channels));
    println!(
        "Retain defaults:  {}",
        if report.retain_defaults { "yes" } else { "no" }
    );
    println!("Nodes:            {}", report.node_count);
    println!(
        "Budget:           {} / {} bits",
        report.required_bits, report.budget_bits
    );
    println!();
    println!("Buckets");
    for (step, bucket) in report.buckets.iter().enumerate() {
        println!("  {step:>3}: {}", list(bucket));
    }
    if !report.accelerated.is_empty() {
        println!("Change detection: {}", list(&report.accelerated));
    }
    if !report.skipped.is_empty() {
        println!("Skipped:          {}", list(&report.skipped));
    }
    if !report.unassigned.is_empty() {
        println!("Unassigned:       {}", list(&report.unassigned));
    }
    Ok(())
}
