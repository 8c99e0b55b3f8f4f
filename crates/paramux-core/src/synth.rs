//! Graph synthesis.
//!
//! Builds the state machine of the sync layer. The root holds a single split
//! node that enters the `Local` sub-graph when `IsLocal` is set and the
//! `Remote` sub-graph otherwise.
//!
//! ```text
//! Local:   Entry ──► Set Value 1 ──(delay)──► Set Value 2 ──► … ──► Set Value S ─┐
//!                      ▲    │ Δ > t                                               │
//!                      │    ▼                                                     │
//!          Reset 1 ◄── Value Changed ──(1 tick)──► Entry           ◄──────────────┘
//!
//! Remote:  Wait For Address ──(address = i)──► Set values for index i
//!                 ▲                                   │ any bit ≠ i
//!                 └───────────────────────────────────┘
//! ```
//!
//! Every transition out of a node is evaluated in declaration order, so
//! change escapes are declared before the round-robin timeout.

use std::f32::consts::TAU;

use crate::allocator::Allocation;
use crate::differential::DifferentialPlan;
use crate::graph::{
    Condition, Guard, GraphError, MachineId, NodeId, Position, StateMachine, Transition,
};
use crate::indexer::BinaryIndexer;
use crate::naming;

/// Duration of one engine tick in seconds.
pub const TICK_SECONDS: f32 = 1.0 / 60.0;

/// Fraction of the step delay a reset node holds before resyncing.
const RESET_HOLD_FRACTION: f32 = 0.25;

const RING_RADIUS: f32 = 300.0;
const RESET_RING_RADIUS: f32 = 500.0;
const CENTER: Position = Position::new(0.0, 0.0);

/// Guards routing changed parameters to their bucket's reset node.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChangeRouting {
    /// One guard per accelerated parameter; any of them escapes a set node.
    pub escapes: Vec<Guard>,
    /// Per bucket, the guards of that bucket's accelerated parameters.
    pub resets: Vec<Vec<Guard>>,
}

impl ChangeRouting {
    /// Derives routing from the bucket layout and the accelerated signals.
    ///
    /// Parameters without a signal are not routed.
    pub fn new(allocation: &Allocation, differentials: &DifferentialPlan) -> Self {
        let resets: Vec<Vec<Guard>> = (0..allocation.steps())
            .map(|step| {
                allocation
                    .bucket(step)
                    .into_iter()
                    .filter_map(|(param, _)| differentials.signal(&param.name))
                    .map(|signal| signal.change_guard())
                    .collect()
            })
            .collect();
        let escapes = resets.iter().flatten().cloned().collect();
        Self { escapes, resets }
    }
}

/// Nodes of one local step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalStep {
    /// The step's set-value node.
    pub set_value: NodeId,
    /// The step's reset node, when change detection is on.
    pub reset: Option<NodeId>,
}

/// The synthesized sync-layer state machine and the IDs later stages need.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncGraph {
    /// The state machine.
    pub machine: StateMachine,
    /// Root split node.
    pub split: NodeId,
    /// Local sub-graph.
    pub local: MachineId,
    /// Remote sub-graph.
    pub remote: MachineId,
    /// Local entry node.
    pub entry: NodeId,
    /// Local per-step nodes.
    pub steps: Vec<LocalStep>,
    /// Shared change node, when change detection is on.
    pub value_changed: Option<NodeId>,
    /// Remote wait node.
    pub wait: NodeId,
    /// Remote per-step nodes.
    pub remote_sets: Vec<NodeId>,
}

fn ring(step: usize, steps: usize, radius: f32, center: Position) -> Position {
    let angle = TAU * step as f32 / steps as f32;
    Position::on_ring(angle, radius, center)
}

/// Builds the sync-layer state machine.
///
/// `routing` is `None` when change detection is off. `step_delay` is the
/// time each set-value node holds before advancing.
pub fn synthesize(
    indexer: &BinaryIndexer,
    step_delay: f32,
    routing: Option<&ChangeRouting>,
) -> Result<SyncGraph, GraphError> {
    let steps = indexer.steps();
    let mut sm = StateMachine::new(naming::SYNC_LAYER);

    let split = sm.add_node(
        MachineId::ROOT,
        naming::SPLIT_NODE,
        Position::default(),
        naming::ONE_TICK_MOTION,
    )?;
    let local_at = Position::new(-200.0, 200.0);
    let local = sm.add_machine(MachineId::ROOT, naming::LOCAL_MACHINE, local_at)?;
    let remote_at = Position::new(200.0, 200.0);
    let remote = sm.add_machine(MachineId::ROOT, naming::REMOTE_MACHINE, remote_at)?;

    sm.add_transition(
        split,
        Transition::enter(local).when(Guard::single(Condition::is_set(naming::IS_LOCAL))),
    )?;
    sm.add_transition(
        split,
        Transition::enter(remote).when(Guard::single(Condition::is_clear(naming::IS_LOCAL))),
    )?;

    // --- Local ---

    let entry = sm.add_node(local, naming::ENTRY_NODE, CENTER, naming::ONE_TICK_MOTION)?;
    let mut local_steps = Vec::with_capacity(steps);
    for step in 0..steps {
        let set_value = sm.add_node(
            local,
            naming::set_value_node(step),
            ring(step, steps, RING_RADIUS, CENTER),
            naming::ONE_SECOND_MOTION,
        )?;
        local_steps.push(LocalStep {
            set_value,
            reset: None,
        });
    }
    sm.add_transition(entry, Transition::immediate(local_steps[0].set_value))?;

    let value_changed = match routing {
        Some(routing) => {
            let changed = sm.add_node(
                local,
                naming::VALUE_CHANGED_NODE,
                Position::new(CENTER.x, CENTER.y - RESET_RING_RADIUS),
                naming::ONE_TICK_MOTION,
            )?;
            for (step, local_step) in local_steps.iter_mut().enumerate() {
                let reset = sm.add_node(
                    local,
                    naming::reset_node(step),
                    ring(step, steps, RESET_RING_RADIUS, CENTER),
                    naming::ONE_SECOND_MOTION,
                )?;
                local_step.reset = Some(reset);
            }
            Some((changed, routing))
        }
        None => None,
    };

    for (step, local_step) in local_steps.iter().enumerate() {
        if let Some((changed, routing)) = value_changed {
            for guard in &routing.escapes {
                sm.add_transition(
                    local_step.set_value,
                    Transition::immediate(changed).when(guard.clone()),
                )?;
            }
        }
        let next = local_steps[(step + 1) % steps].set_value;
        sm.add_transition(local_step.set_value, Transition::after(next, step_delay))?;

        if let Some(reset) = local_step.reset {
            sm.add_transition(
                reset,
                Transition::after(local_step.set_value, step_delay * RESET_HOLD_FRACTION),
            )?;
        }
    }

    if let Some((changed, routing)) = value_changed {
        for (local_step, guards) in local_steps.iter().zip(&routing.resets) {
            let Some(reset) = local_step.reset else {
                continue;
            };
            for guard in guards {
                sm.add_transition(changed, Transition::immediate(reset).when(guard.clone()))?;
            }
        }
        sm.add_transition(changed, Transition::after(entry, TICK_SECONDS))?;
    }

    // --- Remote ---

    let wait = sm.add_node(remote, naming::WAIT_NODE, CENTER, naming::ONE_TICK_MOTION)?;
    let mut remote_sets = Vec::with_capacity(steps);
    for step in 0..steps {
        let set = sm.add_node(
            remote,
            naming::remote_set_node(step),
            ring(step, steps, RING_RADIUS, CENTER),
            naming::ONE_TICK_MOTION,
        )?;
        sm.add_transition(wait, Transition::immediate(set).when(indexer.match_guard(step)))?;
        let mismatches = indexer.mismatch_guards(step);
        if mismatches.is_empty() {
            // No address bits: refresh every tick instead.
            sm.add_transition(set, Transition::after(wait, TICK_SECONDS))?;
        }
        for guard in mismatches {
            sm.add_transition(set, Transition::immediate(wait).when(guard))?;
        }
        remote_sets.push(set);
    }

    tracing::debug!(
        "synthesize: {steps} steps, {} nodes, {} transitions",
        sm.node_count(),
        sm.transition_count()
    );

    Ok(SyncGraph {
        machine: sm,
        split,
        local,
        remote,
        entry,
        steps: local_steps,
        value_changed: value_changed.map(|(changed, _)| changed),
        wait,
        remote_sets,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{ChannelValues, Target, Timing};

    #[test]
    fn split_routes_on_is_local() {
        let graph = synthesize(&BinaryIndexer::new(2), 0.2, None).unwrap();
        let split = graph.machine.node(graph.split).unwrap();
        assert_eq!(split.transitions.len(), 2);
        assert_eq!(split.transitions[0].target, Target::Machine(graph.local));
        assert_eq!(split.transitions[1].target, Target::Machine(graph.remote));

        let mut values = ChannelValues::new();
        values.set_flag(naming::IS_LOCAL, true);
        assert!(split.transitions[0].guard.holds(&values));
        assert!(!split.transitions[1].guard.holds(&values));
    }

    #[test]
    fn round_robin_wraps() {
        let graph = synthesize(&BinaryIndexer::new(3), 0.5, None).unwrap();
        let last = graph.machine.node(graph.steps[2].set_value).unwrap();
        assert_eq!(last.transitions.len(), 1);
        assert_eq!(last.transitions[0].target, Target::Node(graph.steps[0].set_value));
        assert_eq!(last.transitions[0].timing, Timing::Hold { seconds: 0.5 });
    }

    #[test]
    fn entry_of_local_is_entry_node() {
        let graph = synthesize(&BinaryIndexer::new(2), 0.2, None).unwrap();
        assert_eq!(graph.machine.resolve(Target::Machine(graph.local)), Some(graph.entry));
        assert_eq!(graph.machine.resolve(Target::Machine(graph.remote)), Some(graph.wait));
    }

    #[test]
    fn single_step_remote_refreshes() {
        let graph = synthesize(&BinaryIndexer::new(1), 0.2, None).unwrap();
        let set = graph.machine.node(graph.remote_sets[0]).unwrap();
        assert_eq!(set.transitions.len(), 1);
        assert_eq!(
            set.transitions[0].timing,
            Timing::Hold {
                seconds: TICK_SECONDS
            }
        );
        let local = graph.machine.node(graph.steps[0].set_value).unwrap();
        assert_eq!(local.transitions[0].target, Target::Node(graph.steps[0].set_value));
    }

    #[test]
    fn change_escapes_come_before_timeout() {
        let routing = ChangeRouting {
            escapes: vec![Guard::single(Condition::greater("d", 0.05))],
            resets: vec![vec![Guard::single(Condition::greater("d", 0.05))], Vec::new()],
        };
        let graph = synthesize(&BinaryIndexer::new(2), 0.2, Some(&routing)).unwrap();
        let changed = graph.value_changed.unwrap();

        let set = graph.machine.node(graph.steps[1].set_value).unwrap();
        assert_eq!(set.transitions[0].target, Target::Node(changed));
        assert_eq!(set.transitions[0].timing, Timing::Immediate);
        assert_eq!(set.transitions.last().unwrap().target, Target::Node(graph.steps[0].set_value));

        let vc = graph.machine.node(changed).unwrap();
        assert_eq!(vc.transitions.len(), 2);
        assert_eq!(vc.transitions[0].target, Target::Node(graph.steps[0].reset.unwrap()));
        assert_eq!(vc.transitions[1].target, Target::Node(graph.entry));

        let reset = graph.machine.node(graph.steps[0].reset.unwrap()).unwrap();
        assert_eq!(reset.transitions[0].timing, Timing::Hold { seconds: 0.05 });
    }
}
