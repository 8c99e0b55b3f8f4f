//! Display names for generated artifacts.
//!
//! Names are for humans reading the emitted graph. Artifact identity lives in
//! [`Marker`](crate::Marker)s, so nothing here is ever pattern-matched.

/// Reserved prefix carried by every generated channel and table entry.
pub const PREFIX: &str = "Mux_";

/// Name of the state-machine sync layer.
pub const SYNC_LAYER: &str = "Mux_Syncing Layer";
/// Name of the change-detection expression layer.
pub const EXPRESSION_LAYER: &str = "Mux_Change Detection";
/// Shared smoothing-amount channel (0 = track instantly, 1 = hold).
pub const SMOOTHING_AMOUNT: &str = "Mux_ParamSmoothing";
/// Engine-provided flag that selects the local context.
pub const IS_LOCAL: &str = "IsLocal";

/// One-tick timing anchor.
pub const ONE_TICK_MOTION: &str = "Mux_OneTickBuffer";
/// One-second timing anchor.
pub const ONE_SECOND_MOTION: &str = "Mux_OneSecBuffer";
/// Subdirectory of the storage path that holds generated assets.
pub const GENERATED_ASSETS_DIR: &str = "GeneratedAssets";

/// Root split node.
pub const SPLIT_NODE: &str = "Local/Remote split";
/// Local sub-graph.
pub const LOCAL_MACHINE: &str = "Local";
/// Remote sub-graph.
pub const REMOTE_MACHINE: &str = "Remote";
/// Local entry node.
pub const ENTRY_NODE: &str = "Entry";
/// Shared change-detected node.
pub const VALUE_CHANGED_NODE: &str = "Value Changed";
/// Remote busy-wait node.
pub const WAIT_NODE: &str = "Wait For Address";

/// Address channel for indexer bit `bit` (1-indexed from the LSB).
pub fn address_channel(bit: usize) -> String {
    format!("{PREFIX}Indexer {bit}")
}

/// Boolean data channel at bucket position `position`.
pub fn bool_data_channel(position: usize) -> String {
    format!("{PREFIX}BoolSyncer {position}")
}

/// Int/float data channel at bucket position `position`.
pub fn numeric_data_channel(position: usize) -> String {
    format!("{PREFIX}IntNFloatSyncer {position}")
}

/// Working copy of a bool or int parameter.
pub fn working_copy(param: &str) -> String {
    format!("{PREFIX}{param}_Copy")
}

/// Smoothed tracking copy of `source`.
pub fn smoothed(source: &str) -> String {
    format!("{PREFIX}{source}_S")
}

/// Differential signal of `source`.
pub fn differential(source: &str) -> String {
    format!("{PREFIX}{source}_Delta")
}

/// Local set node for step `step` (0-indexed, displayed 1-indexed).
pub fn set_value_node(step: usize) -> String {
    format!("Set Value {}", step + 1)
}

/// Local reset node for step `step`.
pub fn reset_node(step: usize) -> String {
    format!("Reset Change Check {}", step + 1)
}

/// Remote set node for step `step`.
pub fn remote_set_node(step: usize) -> String {
    format!("Set values for index {}", step + 1)
}

/// Storage path of a generated timing anchor.
pub fn motion_asset_path(storage: &str, motion: &str) -> String {
    let storage = storage.trim_end_matches('/');
    if storage.is_empty() {
        format!("{GENERATED_ASSETS_DIR}/{motion}.anim")
    } else {
        format!("{storage}/{GENERATED_ASSETS_DIR}/{motion}.anim")
    }
}
