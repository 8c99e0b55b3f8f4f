//! Model of the emitted graph.
//!
//! The synthesizer produces, and the external engine consumes, a
//! [`ControllerGraph`]: typed [`Channel`]s, a list of [`Layer`]s, and
//! timing-anchor [`Motion`]s. A state-machine layer is a [`StateMachine`]
//! of sub-graphs and [`Node`]s; each node carries guarded [`Transition`]s and
//! an ordered [`SideEffectList`]. An expression layer is a list of per-tick
//! [`Expression`]s.
//!
//! # Evaluation
//!
//! This crate never runs the graph. [`ChannelValues`] and the `holds`/`apply`/
//! `step` methods evaluate single fragments against concrete values so the
//! emitted semantics can be checked without an engine.

mod channel;
mod controller;
mod effect;
mod eval;
mod expression;
mod machine;
mod node;
mod transition;

pub use channel::Channel;
pub use controller::{ControllerGraph, Layer, LayerBody, Motion};
pub use effect::{EffectHandle, RangeRemap, SideEffect, SideEffectList};
pub use eval::ChannelValues;
pub use expression::Expression;
pub use machine::{GraphError, StateMachine};
pub use node::{MachineId, Node, NodeId, Position, SubMachine};
pub use transition::{Condition, Guard, Target, Timing, Transition};
