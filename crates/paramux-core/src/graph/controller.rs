//! The engine-facing graph asset.
//!
//! [`ControllerGraph`] is the mutable object the external evaluation engine
//! consumes: typed channels, an ordered list of layers, and the timing-anchor
//! motions nodes refer to. Generated artifacts carry a [`Marker`]; everything
//! else belongs to the host and is never touched by an install or uninstall.

use serde::{Deserialize, Serialize};

use super::channel::Channel;
use super::expression::Expression;
use super::machine::StateMachine;
use crate::marker::{ArtifactCategory, BatchId, Marker};

/// A fixed-duration motion used as a timing anchor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Motion {
    /// Motion name.
    pub name: String,
    /// Playback duration in seconds.
    pub duration_secs: f32,
    /// Where the motion asset is stored.
    pub asset_path: String,
    /// Set on motions created by an install.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub marker: Option<Marker>,
}

/// Content of a layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "body", rename_all = "snake_case")]
pub enum LayerBody {
    /// A hierarchical state machine.
    StateMachine(StateMachine),
    /// Per-tick expressions, evaluated in order.
    Expressions(Vec<Expression>),
}

/// One layer of the graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layer {
    /// Display name.
    pub name: String,
    /// Blend weight.
    #[serde(default = "default_weight")]
    pub weight: f32,
    /// Set on layers created by an install.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub marker: Option<Marker>,
    /// Layer content.
    pub body: LayerBody,
}

fn default_weight() -> f32 {
    1.0
}

impl Layer {
    /// Creates an unmarked state-machine layer with full weight.
    pub fn state_machine(name: impl Into<String>, machine: StateMachine) -> Self {
        Self {
            name: name.into(),
            weight: 1.0,
            marker: None,
            body: LayerBody::StateMachine(machine),
        }
    }

    /// Creates an unmarked expression layer with full weight.
    pub fn expressions(name: impl Into<String>, expressions: Vec<Expression>) -> Self {
        Self {
            name: name.into(),
            weight: 1.0,
            marker: None,
            body: LayerBody::Expressions(expressions),
        }
    }

    /// Attaches a marker.
    pub fn marked(mut self, marker: Marker) -> Self {
        self.marker = Some(marker);
        self
    }

    /// Returns the state machine if this is a state-machine layer.
    pub fn as_state_machine(&self) -> Option<&StateMachine> {
        match &self.body {
            LayerBody::StateMachine(sm) => Some(sm),
            LayerBody::Expressions(_) => None,
        }
    }

    /// Returns `true` if the layer's marker has the given category.
    pub fn is(&self, category: ArtifactCategory) -> bool {
        self.marker.is_some_and(|m| m.category == category)
    }
}

/// Channels, layers, and motions of a host graph.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ControllerGraph {
    #[serde(default)]
    channels: Vec<Channel>,
    #[serde(default)]
    layers: Vec<Layer>,
    #[serde(default)]
    motions: Vec<Motion>,
}

impl ControllerGraph {
    /// Creates an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    // --- Channels ---

    /// Looks up a channel by name.
    pub fn channel(&self, name: &str) -> Option<&Channel> {
        self.channels.iter().find(|c| c.name == name)
    }

    /// Iterates over all channels.
    pub fn channels(&self) -> impl Iterator<Item = &Channel> {
        self.channels.iter()
    }

    /// Adds `channel` unless one with the same name exists.
    ///
    /// Returns `true` if the channel was added.
    pub fn add_channel_if_absent(&mut self, channel: Channel) -> bool {
        if self.channel(&channel.name).is_some() {
            return false;
        }
        tracing::debug!("graph_add: channel '{}' ({})", channel.name, channel.kind);
        self.channels.push(channel);
        true
    }

    /// Adds a channel (builder form).
    pub fn with_channel(mut self, channel: Channel) -> Self {
        self.add_channel_if_absent(channel);
        self
    }

    /// Removes every channel marked with `batch`, returning their names.
    pub fn remove_channels_in_batch(&mut self, batch: BatchId) -> Vec<String> {
        let mut removed = Vec::new();
        self.channels.retain(|c| match c.marker {
            Some(marker) if marker.in_batch(batch) => {
                removed.push(c.name.clone());
                false
            }
            _ => true,
        });
        removed
    }

    // --- Layers ---

    /// Iterates over all layers in evaluation order.
    pub fn layers(&self) -> impl Iterator<Item = &Layer> {
        self.layers.iter()
    }

    /// Appends a layer.
    pub fn add_layer(&mut self, layer: Layer) {
        tracing::debug!("graph_add: layer '{}'", layer.name);
        self.layers.push(layer);
    }

    /// Adds a layer (builder form).
    pub fn with_layer(mut self, layer: Layer) -> Self {
        self.add_layer(layer);
        self
    }

    /// Layers whose marker has the given category.
    pub fn layers_marked(&self, category: ArtifactCategory) -> impl Iterator<Item = &Layer> {
        self.layers.iter().filter(move |l| l.is(category))
    }

    /// Layers that carry no marker (host-authored).
    pub fn host_layers(&self) -> impl Iterator<Item = &Layer> {
        self.layers.iter().filter(|l| l.marker.is_none())
    }

    /// Removes every layer marked with `batch`, returning their names.
    pub fn remove_layers_in_batch(&mut self, batch: BatchId) -> Vec<String> {
        let mut removed = Vec::new();
        self.layers.retain(|l| match l.marker {
            Some(marker) if marker.in_batch(batch) => {
                removed.push(l.name.clone());
                false
            }
            _ => true,
        });
        removed
    }

    // --- Motions ---

    /// Looks up a motion by name.
    pub fn motion(&self, name: &str) -> Option<&Motion> {
        self.motions.iter().find(|m| m.name == name)
    }

    /// Iterates over all motions.
    pub fn motions(&self) -> impl Iterator<Item = &Motion> {
        self.motions.iter()
    }

    /// Adds `motion` unless one with the same name exists.
    pub fn add_motion_if_absent(&mut self, motion: Motion) -> bool {
        if self.motion(&motion.name).is_some() {
            return false;
        }
        self.motions.push(motion);
        true
    }

    // --- Markers ---

    fn markers(&self) -> impl Iterator<Item = Marker> + '_ {
        let channels = self.channels.iter().filter_map(|c| c.marker);
        let layers = self.layers.iter().filter_map(|l| l.marker);
        let motions = self.motions.iter().filter_map(|m| m.marker);
        channels.chain(layers).chain(motions)
    }

    /// The first batch number not used by any artifact in the graph.
    pub fn next_batch(&self) -> BatchId {
        self.markers()
            .map(|m| m.batch.next())
            .max()
            .unwrap_or(BatchId(1))
    }
}
