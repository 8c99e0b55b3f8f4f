//! Default-value retention.
//!
//! Every synthesized node gets the same retain-default-values flag. The caller
//! either forces it or lets it follow whatever convention the host's own
//! state-machine layers already use.

use serde::{Deserialize, Serialize};

use crate::graph::ControllerGraph;

/// Caller's choice for the retention flag.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RetentionOption {
    /// Follow the host graph's convention.
    #[default]
    Auto,
    /// Never retain default values.
    ForceOff,
    /// Always retain default values.
    ForceOn,
}

/// Scans the host-authored state-machine layers.
///
/// Returns `Some(flag)` when every host node agrees, `None` when nodes
/// disagree or there are none.
pub fn detect_convention(graph: &ControllerGraph) -> Option<bool> {
    let mut flags = graph
        .host_layers()
        .filter_map(|layer| layer.as_state_machine())
        .flat_map(|sm| sm.nodes())
        .map(|node| node.retain_defaults);
    let first = flags.next()?;
    flags.all(|flag| flag == first).then_some(first)
}

/// Resolves the flag applied to every synthesized node.
///
/// `Auto` with an undetermined convention retains defaults.
pub fn resolve(option: RetentionOption, detected: Option<bool>) -> bool {
    let retain = match option {
        RetentionOption::Auto => detected.unwrap_or(true),
        RetentionOption::ForceOff => false,
        RetentionOption::ForceOn => true,
    };
    tracing::debug!("conformance: {option:?} with {detected:?} -> retain={retain}");
    retain
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Layer, MachineId, Position, StateMachine};
    use crate::marker::{ArtifactCategory, BatchId, Marker};

    fn host_layer(retain: bool, nodes: usize) -> Layer {
        let mut sm = StateMachine::new("Base");
        for i in 0..nodes {
            sm.add_node(MachineId::ROOT, format!("n{i}"), Position::default(), "idle")
                .unwrap();
        }
        sm.set_retain_defaults(retain);
        Layer::state_machine("Base", sm)
    }

    #[test]
    fn empty_graph_is_undetermined() {
        assert_eq!(detect_convention(&ControllerGraph::new()), None);
        assert!(resolve(RetentionOption::Auto, None));
    }

    #[test]
    fn agreeing_layers_are_detected() {
        let graph = ControllerGraph::new()
            .with_layer(host_layer(false, 2))
            .with_layer(host_layer(false, 1));
        assert_eq!(detect_convention(&graph), Some(false));
        assert!(!resolve(RetentionOption::Auto, Some(false)));
    }

    #[test]
    fn mixed_layers_are_undetermined() {
        let graph = ControllerGraph::new()
            .with_layer(host_layer(true, 1))
            .with_layer(host_layer(false, 1));
        assert_eq!(detect_convention(&graph), None);
    }

    #[test]
    fn generated_layers_are_ignored() {
        let mut generated = host_layer(true, 1);
        generated.marker = Some(Marker::new(ArtifactCategory::SyncLayer, BatchId(1)));
        let graph = ControllerGraph::new()
            .with_layer(host_layer(false, 1))
            .with_layer(generated);
        assert_eq!(detect_convention(&graph), Some(false));
    }

    #[test]
    fn forced_options_ignore_detection() {
        assert!(!resolve(RetentionOption::ForceOff, Some(true)));
        assert!(resolve(RetentionOption::ForceOn, Some(false)));
    }
}
