//! Guarded transitions between nodes.
//!
//! A [`Transition`] fires when its [`Guard`] (a conjunction of [`Condition`]s)
//! holds and its [`Timing`] allows it. Disjunctions are expressed as several
//! transitions to the same target; the engine takes the first satisfied
//! transition in declaration order.

use serde::{Deserialize, Serialize};

use super::eval::ChannelValues;
use super::node::{MachineId, NodeId};

/// A single channel-value condition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "when", rename_all = "snake_case")]
pub enum Condition {
    /// Boolean channel equals `value`.
    Flag {
        /// Channel name.
        channel: String,
        /// Required value.
        value: bool,
    },
    /// Numeric channel strictly exceeds `threshold`.
    Greater {
        /// Channel name.
        channel: String,
        /// Threshold.
        threshold: f32,
    },
}

impl Condition {
    /// Boolean channel must be set.
    pub fn is_set(channel: impl Into<String>) -> Self {
        Self::Flag {
            channel: channel.into(),
            value: true,
        }
    }

    /// Boolean channel must be clear.
    pub fn is_clear(channel: impl Into<String>) -> Self {
        Self::Flag {
            channel: channel.into(),
            value: false,
        }
    }

    /// Numeric channel must exceed `threshold`.
    pub fn greater(channel: impl Into<String>, threshold: f32) -> Self {
        Self::Greater {
            channel: channel.into(),
            threshold,
        }
    }

    /// Returns the negated flag condition. Threshold conditions have no
    /// single-condition negation and return `None`.
    pub fn inverted(&self) -> Option<Self> {
        match self {
            Self::Flag { channel, value } => Some(Self::Flag {
                channel: channel.clone(),
                value: !value,
            }),
            Self::Greater { .. } => None,
        }
    }

    /// Evaluates the condition.
    pub fn holds(&self, values: &ChannelValues) -> bool {
        match self {
            Self::Flag { channel, value } => values.flag(channel) == *value,
            Self::Greater { channel, threshold } => values.get(channel) > *threshold,
        }
    }
}

/// Conjunction of conditions. The empty guard always holds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Guard {
    conditions: Vec<Condition>,
}

impl Guard {
    /// A guard that always holds.
    pub fn always() -> Self {
        Self::default()
    }

    /// Creates a guard from a list of conditions.
    pub fn new(conditions: Vec<Condition>) -> Self {
        Self { conditions }
    }

    /// Creates a single-condition guard.
    pub fn single(condition: Condition) -> Self {
        Self {
            conditions: vec![condition],
        }
    }

    /// Conditions in declaration order.
    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    /// Returns `true` if this guard has no conditions.
    pub fn is_always(&self) -> bool {
        self.conditions.is_empty()
    }

    /// Evaluates the conjunction.
    pub fn holds(&self, values: &ChannelValues) -> bool {
        self.conditions.iter().all(|c| c.holds(values))
    }
}

/// When a transition may fire.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum Timing {
    /// As soon as the guard holds, including on the tick the source is entered.
    Immediate,
    /// Only after the source has been occupied for a fixed duration.
    Hold {
        /// Fixed duration in seconds.
        seconds: f32,
    },
}

impl Timing {
    /// Returns `true` if the transition may fire after `elapsed` seconds in the source.
    pub fn ready(self, elapsed: f32) -> bool {
        match self {
            Self::Immediate => true,
            Self::Hold { seconds } => elapsed >= seconds,
        }
    }
}

/// Transition destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Target {
    /// A node in the same layer.
    Node(NodeId),
    /// A sub-graph; entering it enters its entry node.
    Machine(MachineId),
}

/// Outgoing edge of a node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transition {
    /// Destination.
    pub target: Target,
    /// Conjunctive guard.
    #[serde(default, skip_serializing_if = "Guard::is_always")]
    pub guard: Guard,
    /// Timing semantics.
    pub timing: Timing,
}

impl Transition {
    /// Unguarded transition to a node that fires immediately.
    pub fn immediate(to: NodeId) -> Self {
        Self {
            target: Target::Node(to),
            guard: Guard::always(),
            timing: Timing::Immediate,
        }
    }

    /// Unguarded transition to a node after holding the source for `seconds`.
    pub fn after(to: NodeId, seconds: f32) -> Self {
        Self {
            target: Target::Node(to),
            guard: Guard::always(),
            timing: Timing::Hold { seconds },
        }
    }

    /// Unguarded transition into a sub-graph's entry node, firing immediately.
    pub fn enter(machine: MachineId) -> Self {
        Self {
            target: Target::Machine(machine),
            guard: Guard::always(),
            timing: Timing::Immediate,
        }
    }

    /// Replaces the guard.
    pub fn when(mut self, guard: Guard) -> Self {
        self.guard = guard;
        self
    }

    /// Returns `true` if the transition fires given the values and time in state.
    pub fn fires(&self, values: &ChannelValues, elapsed: f32) -> bool {
        self.timing.ready(elapsed) && self.guard.holds(values)
    }
}
