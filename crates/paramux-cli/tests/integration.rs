//! Integration tests for paramux-cli.
//!
//! Each test writes a parameter table, graph, and request into a temp
//! directory and drives the `paramux` binary against them.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use paramux_config::{load_graph, load_table, save_graph, save_table};
use paramux_core::{Channel, ChannelKind, ControllerGraph, ParamKind, ParamTable, TableEntry};
use tempfile::TempDir;

/// Helper to get the path to the `paramux` binary built by cargo.
fn paramux_bin() -> Command {
    Command::new(env!("CARGO_BIN_EXE_paramux"))
}

struct Fixture {
    dir: TempDir,
}

impl Fixture {
    fn new(request: &str) -> Self {
        let dir = TempDir::new().unwrap();
        let mut table = ParamTable::default();
        let mut graph = ControllerGraph::new();
        for (name, kind) in [
            ("Hat", ParamKind::Bool),
            ("Coat", ParamKind::Bool),
            ("Scarf", ParamKind::Bool),
            ("Hue", ParamKind::Float),
        ] {
            table.add_if_absent(TableEntry::new(name, kind));
            graph.add_channel_if_absent(Channel::new(name, ChannelKind::from(kind)));
        }
        save_table(&table, dir.path().join("params.toml")).unwrap();
        save_graph(&graph, dir.path().join("graph.json")).unwrap();
        std::fs::write(dir.path().join("request.toml"), request).unwrap();
        Self { dir }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    fn run(&self, args: &[&str]) -> Output {
        let mut cmd = paramux_bin();
        for arg in args {
            match *arg {
                "@request" => cmd.arg(self.path("request.toml")),
                "@params" => cmd.arg(self.path("params.toml")),
                "@graph" => cmd.arg(self.path("graph.json")),
                other => cmd.arg(other),
            };
        }
        cmd.output().expect("failed to run paramux")
    }
}

const REQUEST: &str = r#"
parameters = ["Hat", "Coat", "Scarf", "Hue"]
steps = 2
change_detection = true
"#;

const INSTALL: &[&str] = &[
    "install", "--request", "@request", "--params", "@params", "--graph", "@graph",
];

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

fn file(path: &Path) -> String {
    std::fs::read_to_string(path).unwrap()
}

// ---------------------------------------------------------------------------
// plan
// ---------------------------------------------------------------------------

#[test]
fn plan_prints_bucket_layout() {
    let fx = Fixture::new(REQUEST);
    let output = fx.run(&["plan", "--request", "@request", "--params", "@params"]);
    assert!(output.status.success(), "plan failed: {}", stderr(&output));

    let out = stdout(&output);
    assert!(out.contains("Steps:            2"), "got: {out}");
    assert!(out.contains("Buckets"));
    assert!(out.contains("Hat, Coat"), "got: {out}");
}

#[test]
fn plan_json_is_parseable() {
    let fx = Fixture::new(REQUEST);
    let output = fx.run(&[
        "plan", "--request", "@request", "--params", "@params", "--graph", "@graph", "--json",
    ]);
    assert!(output.status.success(), "plan failed: {}", stderr(&output));

    let report: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(report["steps"], 2);
    assert_eq!(report["address_channels"].as_array().unwrap().len(), 1);
    assert_eq!(report["buckets"].as_array().unwrap().len(), 2);
}

// ---------------------------------------------------------------------------
// install / status / uninstall
// ---------------------------------------------------------------------------

#[test]
fn dry_run_writes_nothing() {
    let fx = Fixture::new(REQUEST);
    let before = (file(&fx.path("params.toml")), file(&fx.path("graph.json")));

    let output = fx.run(&[
        "install", "--request", "@request", "--params", "@params", "--graph", "@graph",
        "--dry-run",
    ]);
    assert!(output.status.success(), "install failed: {}", stderr(&output));
    assert_eq!(
        (file(&fx.path("params.toml")), file(&fx.path("graph.json"))),
        before
    );
}

#[test]
fn install_status_uninstall_cycle() {
    let fx = Fixture::new(REQUEST);

    let output = fx.run(INSTALL);
    assert!(output.status.success(), "install failed: {}", stderr(&output));
    let table = load_table(fx.path("params.toml")).unwrap();
    assert!(!table.get("Hat").unwrap().synced);

    let output = fx.run(&["status", "--graph", "@graph", "--params", "@params"]);
    assert!(output.status.success());
    let out = stdout(&output);
    assert!(out.starts_with("Installed"), "got: {out}");
    assert!(out.contains("SyncLayer"));
    assert!(out.contains("Budget:"));

    let output = fx.run(INSTALL);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("already installed"));

    let output = fx.run(&["uninstall", "--params", "@params", "--graph", "@graph"]);
    assert!(output.status.success(), "uninstall failed: {}", stderr(&output));
    assert!(stdout(&output).contains("Restored sync:   Hat, Coat, Hue, Scarf"));

    let table = load_table(fx.path("params.toml")).unwrap();
    assert!(table.entries().all(|e| e.synced && e.marker.is_none()));
    let graph = load_graph(fx.path("graph.json")).unwrap();
    assert_eq!(graph.layers().count(), 0);
}

#[test]
fn uninstall_on_clean_graph_fails() {
    let fx = Fixture::new(REQUEST);
    let output = fx.run(&["uninstall", "--params", "@params", "--graph", "@graph"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("syncing layers found"));
}

#[test]
fn invalid_request_lists_every_problem() {
    let fx = Fixture::new(
        r#"
        parameters = ["Hat", "Cape"]
        bipolar = ["Hat"]
        steps = 2
        "#,
    );
    let before = file(&fx.path("graph.json"));
    let output = fx.run(INSTALL);

    assert!(!output.status.success());
    let err = stderr(&output);
    assert!(err.contains("'Cape' is not in the parameter table"), "got: {err}");
    assert!(err.contains("'Hat' is marked bipolar"), "got: {err}");
    assert_eq!(file(&fx.path("graph.json")), before);
}

#[test]
fn status_on_clean_graph() {
    let fx = Fixture::new(REQUEST);
    let output = fx.run(&["status", "--graph", "@graph"]);
    assert!(output.status.success());
    assert_eq!(stdout(&output).trim(), "Not installed");
}
