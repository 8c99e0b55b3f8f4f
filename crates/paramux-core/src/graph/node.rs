//! Graph node types.
//!
//! Each node is a state with a timing-anchor motion, an ordered list of
//! outgoing [`Transition`]s, and an ordered [`SideEffectList`] executed on
//! entry. Nodes live in a flat arena owned by their
//! [`StateMachine`](super::StateMachine) and belong to exactly one sub-graph.

use serde::{Deserialize, Serialize};

use super::effect::SideEffectList;
use super::transition::Transition;

/// Identifier of a node within one state machine.
///
/// Assigned sequentially and never reused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub(crate) u32);

impl core::fmt::Display for NodeId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "NodeId({})", self.0)
    }
}

/// Identifier of a sub-graph within one state machine. `MachineId(0)` is the root.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MachineId(pub(crate) u32);

impl MachineId {
    /// The root sub-graph.
    pub const ROOT: Self = Self(0);
}

impl core::fmt::Display for MachineId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "MachineId({})", self.0)
    }
}

/// 2-D layout hint for editors.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// Horizontal coordinate.
    pub x: f32,
    /// Vertical coordinate.
    pub y: f32,
}

impl Position {
    /// Creates a position.
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Point at `angle` radians and `radius` around `center`.
    pub fn on_ring(angle: f32, radius: f32, center: Self) -> Self {
        Self {
            x: center.x + radius * angle.cos(),
            y: center.y + radius * angle.sin(),
        }
    }
}

/// A state in the emitted graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Node identifier.
    pub id: NodeId,
    /// Display name.
    pub name: String,
    /// Owning sub-graph.
    pub machine: MachineId,
    /// Layout hint.
    pub position: Position,
    /// Name of the timing-anchor motion played while in this node.
    pub motion: String,
    /// Whether the engine restores default values for unanimated channels.
    pub retain_defaults: bool,
    /// Outgoing transitions in evaluation order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub transitions: Vec<Transition>,
    /// Side effects executed once on entry, in order.
    #[serde(default, skip_serializing_if = "SideEffectList::is_empty")]
    pub effects: SideEffectList,
}

/// A sub-graph (child state machine).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubMachine {
    /// Sub-graph identifier.
    pub id: MachineId,
    /// Display name.
    pub name: String,
    /// Parent sub-graph (`None` for the root).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<MachineId>,
    /// Node entered when the sub-graph is entered.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entry: Option<NodeId>,
    /// Layout hint.
    pub position: Position,
}
