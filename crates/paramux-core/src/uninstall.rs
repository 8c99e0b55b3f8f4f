//! Uninstall.
//!
//! Locates the installed batch through the marker on its single sync layer,
//! checks that the generated artifacts look like a complete install, and only
//! then removes them. Timing anchors are left in place for the next install.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::error::UninstallError;
use crate::graph::{ControllerGraph, Layer};
use crate::marker::{ArtifactCategory, BatchId};
use crate::table::ParamTable;

/// What an uninstall removed and restored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UninstallReport {
    /// Batch that was removed.
    pub batch: BatchId,
    /// Removed layer names.
    pub removed_layers: Vec<String>,
    /// Removed graph channel names.
    pub removed_channels: Vec<String>,
    /// Removed table entry names.
    pub removed_entries: Vec<String>,
    /// Parameters whose sync flag was restored.
    pub restored: Vec<String>,
}

/// Parameters the sync layer copies into data channels of `batch`.
///
/// Read from the side effects of the layer's nodes, in first-seen order.
pub fn optimized_parameters(graph: &ControllerGraph, layer: &Layer, batch: BatchId) -> Vec<String> {
    let data_channels: BTreeSet<&str> = graph
        .channels()
        .filter(|c| {
            c.marker
                .is_some_and(|m| m.in_batch(batch) && m.category == ArtifactCategory::DataChannel)
        })
        .map(|c| c.name.as_str())
        .collect();
    let Some(sm) = layer.as_state_machine() else {
        return Vec::new();
    };

    let mut seen = BTreeSet::new();
    let mut params = Vec::new();
    for effect in sm.nodes().flat_map(|n| n.effects.iter()) {
        let Some(source) = effect.source() else {
            continue;
        };
        if data_channels.contains(effect.destination()) && seen.insert(source) {
            params.push(source.to_owned());
        }
    }
    params
}

/// Removes the installed multiplexer and restores the sync flags of the
/// parameters it absorbed.
///
/// Nothing is mutated unless every check passes.
pub fn uninstall(
    table: &mut ParamTable,
    graph: &mut ControllerGraph,
) -> Result<UninstallReport, UninstallError> {
    let expression_layers = graph.layers_marked(ArtifactCategory::ExpressionLayer).count();
    if expression_layers > 1 {
        return Err(UninstallError::AmbiguousExpressionLayers(expression_layers));
    }
    let sync_layers: Vec<&Layer> = graph.layers_marked(ArtifactCategory::SyncLayer).collect();
    let [sync_layer] = sync_layers.as_slice() else {
        return Err(UninstallError::AmbiguousSyncLayers(sync_layers.len()));
    };
    let Some(batch) = sync_layer.marker.map(|m| m.batch) else {
        return Err(UninstallError::AmbiguousSyncLayers(0));
    };

    let entries = table
        .generated()
        .filter(|e| e.marker.is_some_and(|m| m.in_batch(batch)))
        .count();
    if entries == 0 {
        return Err(UninstallError::TooFewGeneratedTableEntries(entries));
    }
    let channels = graph
        .channels()
        .filter(|c| c.marker.is_some_and(|m| m.in_batch(batch)))
        .count();
    if channels == 0 {
        return Err(UninstallError::TooFewGeneratedChannels(channels));
    }
    let optimized = optimized_parameters(graph, sync_layer, batch);
    if optimized.is_empty() {
        return Err(UninstallError::TooFewOptimizedParameters(0));
    }

    let removed_layers = graph.remove_layers_in_batch(batch);
    for name in &removed_layers {
        tracing::info!("removing layer '{name}'");
    }
    let removed_channels = graph.remove_channels_in_batch(batch);
    for name in &removed_channels {
        tracing::info!("removing channel '{name}'");
    }
    let removed_entries = table.remove_batch(batch);
    for name in &removed_entries {
        tracing::info!("removing table entry '{name}'");
    }
    let mut restored = Vec::with_capacity(optimized.len());
    for name in optimized {
        if table.set_synced(&name, true) {
            tracing::info!("optimized parameter '{name}' set to sync");
            restored.push(name);
        } else {
            tracing::warn!("optimized parameter '{name}' is no longer in the table");
        }
    }

    tracing::info!(
        "uninstalled {batch}: {} layers, {} channels, {} table entries removed",
        removed_layers.len(),
        removed_channels.len(),
        removed_entries.len()
    );
    Ok(UninstallReport {
        batch,
        removed_layers,
        removed_channels,
        removed_entries,
        restored,
    })
}
