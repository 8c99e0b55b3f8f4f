//! Hierarchical state machine — mutation API for one layer.
//!
//! [`StateMachine`] owns a flat arena of [`Node`]s and a flat arena of
//! [`SubMachine`]s. Sub-graph nesting is recorded through parent links, and
//! every node records the sub-graph it belongs to. `MachineId::ROOT` always
//! exists.

use serde::{Deserialize, Serialize};

use super::effect::{EffectHandle, SideEffect, SideEffectList};
use super::node::{MachineId, Node, NodeId, Position, SubMachine};
use super::transition::{Target, Transition};

/// Errors that can occur while building a state machine.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GraphError {
    /// The specified node was not found.
    #[error("node {0} not found")]
    NodeNotFound(NodeId),
    /// The specified sub-graph was not found.
    #[error("sub-graph {0} not found")]
    MachineNotFound(MachineId),
    /// A side-effect list is already attached to this node.
    #[error("node {0} already has side effects attached")]
    EffectsAlreadyAttached(NodeId),
}

/// A layer's state machine: sub-graphs, nodes, and their transitions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateMachine {
    machines: Vec<SubMachine>,
    nodes: Vec<Node>,
}

impl StateMachine {
    /// Creates a state machine with an empty root sub-graph.
    pub fn new(root_name: impl Into<String>) -> Self {
        Self {
            machines: vec![SubMachine {
                id: MachineId::ROOT,
                name: root_name.into(),
                parent: None,
                entry: None,
                position: Position::default(),
            }],
            nodes: Vec::new(),
        }
    }

    // --- Mutations ---

    /// Adds a child sub-graph under `parent`.
    pub fn add_machine(
        &mut self,
        parent: MachineId,
        name: impl Into<String>,
        position: Position,
    ) -> Result<MachineId, GraphError> {
        self.machine(parent)
            .ok_or(GraphError::MachineNotFound(parent))?;
        let id = MachineId(self.machines.len() as u32);
        self.machines.push(SubMachine {
            id,
            name: name.into(),
            parent: Some(parent),
            entry: None,
            position,
        });
        Ok(id)
    }

    /// Adds a node to `machine`.
    ///
    /// The first node added to a sub-graph becomes its entry node.
    pub fn add_node(
        &mut self,
        machine: MachineId,
        name: impl Into<String>,
        position: Position,
        motion: impl Into<String>,
    ) -> Result<NodeId, GraphError> {
        let idx = machine.0 as usize;
        if idx >= self.machines.len() {
            return Err(GraphError::MachineNotFound(machine));
        }
        let id = NodeId(self.nodes.len() as u32);
        let name = name.into();
        tracing::debug!("graph_add: node {id} '{name}' in {machine}");
        self.nodes.push(Node {
            id,
            name,
            machine,
            position,
            motion: motion.into(),
            retain_defaults: false,
            transitions: Vec::new(),
            effects: SideEffectList::new(),
        });
        let sub = &mut self.machines[idx];
        if sub.entry.is_none() {
            sub.entry = Some(id);
        }
        Ok(id)
    }

    /// Appends an outgoing transition to `from`.
    ///
    /// Transitions are evaluated in the order they are added.
    pub fn add_transition(
        &mut self,
        from: NodeId,
        transition: Transition,
    ) -> Result<(), GraphError> {
        match transition.target {
            Target::Node(to) => {
                self.node(to).ok_or(GraphError::NodeNotFound(to))?;
            }
            Target::Machine(to) => {
                self.machine(to).ok_or(GraphError::MachineNotFound(to))?;
            }
        }
        let node = self
            .nodes
            .get_mut(from.0 as usize)
            .ok_or(GraphError::NodeNotFound(from))?;
        tracing::debug!("graph_connect: {from} → {:?}", transition.target);
        node.transitions.push(transition);
        Ok(())
    }

    /// Attaches a side-effect list to `node`, returning the handle later
    /// stages use to append to it.
    pub fn attach_effects(
        &mut self,
        node: NodeId,
        effects: SideEffectList,
    ) -> Result<EffectHandle, GraphError> {
        let target = self
            .nodes
            .get_mut(node.0 as usize)
            .ok_or(GraphError::NodeNotFound(node))?;
        if !target.effects.is_empty() {
            return Err(GraphError::EffectsAlreadyAttached(node));
        }
        target.effects = effects;
        Ok(EffectHandle { node })
    }

    /// Appends side effects to a previously attached list.
    pub fn extend_effects(
        &mut self,
        handle: EffectHandle,
        effects: impl IntoIterator<Item = SideEffect>,
    ) -> Result<(), GraphError> {
        let target = self
            .nodes
            .get_mut(handle.node.0 as usize)
            .ok_or(GraphError::NodeNotFound(handle.node))?;
        target.effects.extend(effects);
        Ok(())
    }

    /// Sets the default-value retention flag on every node.
    pub fn set_retain_defaults(&mut self, retain: bool) {
        for node in &mut self.nodes {
            node.retain_defaults = retain;
        }
    }

    // --- Queries ---

    /// Returns a node by ID.
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0 as usize)
    }

    /// Returns a sub-graph by ID.
    pub fn machine(&self, id: MachineId) -> Option<&SubMachine> {
        self.machines.get(id.0 as usize)
    }

    /// Iterates over all nodes.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter()
    }

    /// Nodes directly inside `machine`.
    pub fn nodes_in(&self, machine: MachineId) -> impl Iterator<Item = &Node> {
        self.nodes.iter().filter(move |n| n.machine == machine)
    }

    /// Finds a sub-graph by name.
    pub fn find_machine(&self, name: &str) -> Option<&SubMachine> {
        self.machines.iter().find(|m| m.name == name)
    }

    /// Finds a node by name within `machine`.
    pub fn find_node(&self, machine: MachineId, name: &str) -> Option<&Node> {
        self.nodes_in(machine).find(|n| n.name == name)
    }

    /// Number of nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of transitions across all nodes.
    pub fn transition_count(&self) -> usize {
        self.nodes.iter().map(|n| n.transitions.len()).sum()
    }

    /// Resolves a transition target to the node that is actually entered.
    ///
    /// Entering a sub-graph enters its entry node, recursively.
    pub fn resolve(&self, target: Target) -> Option<NodeId> {
        match target {
            Target::Node(id) => self.node(id).map(|n| n.id),
            Target::Machine(id) => {
                let entry = self.machine(id)?.entry?;
                Some(entry)
            }
        }
    }
}
