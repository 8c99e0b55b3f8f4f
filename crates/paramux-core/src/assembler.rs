//! Side-effect assembly.
//!
//! [`SideEffectPlan::build`] is pure: it turns the bucket layout into one
//! local and one remote [`SideEffectList`] per step. [`SideEffectPlan::attach`]
//! then hands the lists to the synthesized nodes and returns the
//! [`EffectHandle`]s, which [`AttachedEffects::append_smoothing`] uses to add
//! the per-node smoothing amount.

use crate::allocator::Allocation;
use crate::differential::DifferentialPlan;
use crate::graph::{EffectHandle, GraphError, RangeRemap, SideEffect, SideEffectList};
use crate::indexer::BinaryIndexer;
use crate::kind::Parameter;
use crate::naming;
use crate::synth::SyncGraph;

/// Smoothing amount set on entry to a set-value node (track instantly).
pub const SMOOTHING_TRACK: f32 = 0.0;
/// Smoothing amount set on entry to a reset node (freeze).
pub const SMOOTHING_FREEZE: f32 = 1.0;

/// Side effect copying `param` into its data channel on the local side.
fn drive(param: &Parameter, channel: String) -> SideEffect {
    let profile = param.kind.profile();
    if profile.remap {
        let remap = RangeRemap::new(param.range, profile.transport_range).quantized();
        SideEffect::copy_remap(param.name.clone(), channel, remap)
    } else {
        SideEffect::copy(param.name.clone(), channel)
    }
}

/// Side effect copying a data channel back into `param` on the remote side.
fn receive(param: &Parameter, channel: String) -> SideEffect {
    let profile = param.kind.profile();
    if profile.remap {
        let remap = RangeRemap::new(param.range, profile.transport_range).inverse();
        SideEffect::copy_remap(channel, param.name.clone(), remap)
    } else {
        SideEffect::copy(channel, param.name.clone())
    }
}

/// Per-step side-effect lists.
#[derive(Debug, Clone, PartialEq)]
pub struct SideEffectPlan {
    local: Vec<SideEffectList>,
    remote: Vec<SideEffectList>,
    smoothing: bool,
}

impl SideEffectPlan {
    /// Builds the lists for every step.
    ///
    /// With change detection, every local list also refreshes all working
    /// copies from their parameters.
    pub fn build(
        indexer: &BinaryIndexer,
        allocation: &Allocation,
        differentials: Option<&DifferentialPlan>,
    ) -> Self {
        let steps = indexer.steps();
        let mut local = Vec::with_capacity(steps);
        let mut remote = Vec::with_capacity(steps);

        for step in 0..steps {
            let bucket = allocation.bucket(step);

            let mut out: SideEffectList = indexer.assignments(step).into_iter().collect();
            out.extend(bucket.iter().map(|(p, ch)| drive(p, ch.clone())));
            if let Some(differentials) = differentials {
                out.extend(
                    differentials
                        .working_copies()
                        .map(|(param, copy)| SideEffect::copy(param, copy)),
                );
            }

            let mut inbound: SideEffectList = indexer.assignments(step).into_iter().collect();
            inbound.extend(bucket.iter().map(|(p, ch)| receive(p, ch.clone())));

            tracing::debug!(
                "assemble: step {} [{}] local {} effects, remote {} effects",
                step,
                indexer.bit_string(step),
                out.len(),
                inbound.len()
            );
            local.push(out);
            remote.push(inbound);
        }

        Self {
            local,
            remote,
            smoothing: differentials.is_some_and(|d| !d.signals().is_empty()),
        }
    }

    /// Local list of `step`.
    pub fn local(&self, step: usize) -> Option<&SideEffectList> {
        self.local.get(step)
    }

    /// Remote list of `step`.
    pub fn remote(&self, step: usize) -> Option<&SideEffectList> {
        self.remote.get(step)
    }

    /// Attaches the lists to the synthesized nodes.
    ///
    /// Set-value and reset nodes of a step share the same local list.
    pub fn attach(self, graph: &mut SyncGraph) -> Result<AttachedEffects, GraphError> {
        let mut set_values = Vec::with_capacity(self.local.len());
        let mut resets = Vec::new();

        for (step, list) in self.local.into_iter().enumerate() {
            let Some(nodes) = graph.steps.get(step).copied() else {
                break;
            };
            if let Some(reset) = nodes.reset {
                resets.push(graph.machine.attach_effects(reset, list.clone())?);
            }
            set_values.push(graph.machine.attach_effects(nodes.set_value, list)?);
        }
        for (node, list) in graph.remote_sets.iter().zip(self.remote) {
            graph.machine.attach_effects(*node, list)?;
        }

        Ok(AttachedEffects {
            set_values,
            resets,
            smoothing: self.smoothing,
        })
    }
}

/// Handles to the attached local lists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachedEffects {
    /// One handle per set-value node.
    pub set_values: Vec<EffectHandle>,
    /// One handle per reset node.
    pub resets: Vec<EffectHandle>,
    smoothing: bool,
}

impl AttachedEffects {
    /// Appends the smoothing amount: track on set-value nodes, freeze on
    /// reset nodes. Does nothing when no parameter is accelerated.
    pub fn append_smoothing(&self, graph: &mut SyncGraph) -> Result<(), GraphError> {
        if !self.smoothing {
            return Ok(());
        }
        for handle in &self.set_values {
            graph.machine.extend_effects(
                *handle,
                [SideEffect::set(naming::SMOOTHING_AMOUNT, SMOOTHING_TRACK)],
            )?;
        }
        for handle in &self.resets {
            graph.machine.extend_effects(
                *handle,
                [SideEffect::set(naming::SMOOTHING_AMOUNT, SMOOTHING_FREEZE)],
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allocator::{RemainderPolicy, allocate};
    use crate::graph::ChannelValues;
    use crate::kind::{ParamKind, ValueRange};
    use crate::synth::synthesize;

    fn layout(params: &[Parameter], steps: usize) -> (BinaryIndexer, Allocation) {
        let indexer = BinaryIndexer::new(steps);
        let allocation = allocate(params, steps, RemainderPolicy::Distribute).unwrap();
        (indexer, allocation)
    }

    #[test]
    fn local_list_sets_address_then_copies() {
        let params = [
            Parameter::new("a", ParamKind::Bool),
            Parameter::new("b", ParamKind::Bool),
        ];
        let (indexer, allocation) = layout(&params, 2);
        let plan = SideEffectPlan::build(&indexer, &allocation, None);

        let list = plan.local(1).unwrap();
        assert_eq!(
            list.as_slice(),
            [
                SideEffect::set_flag(naming::address_channel(1), true),
                SideEffect::copy("b", naming::bool_data_channel(0)),
            ]
        );
        let remote = plan.remote(1).unwrap();
        assert_eq!(
            remote.as_slice()[1],
            SideEffect::copy(naming::bool_data_channel(0), "b")
        );
    }

    #[test]
    fn float_survives_remap_round_trip() {
        let params = [Parameter::new("hue", ParamKind::Float).bipolar()];
        let (indexer, allocation) = layout(&params, 1);
        let plan = SideEffectPlan::build(&indexer, &allocation, None);

        let mut values = ChannelValues::new();
        values.set("hue", -0.41);
        plan.local(0).unwrap().apply(&mut values);
        let sent = values.get(&naming::numeric_data_channel(0));
        assert_eq!(sent, sent.round());
        assert!(ValueRange::BYTE.clamp(sent) == sent);

        values.set("hue", 0.0);
        plan.remote(0).unwrap().apply(&mut values);
        let step = ValueRange::BIPOLAR.span() / ValueRange::BYTE.span();
        assert!((values.get("hue") + 0.41).abs() <= step / 2.0 + 1e-6);
    }

    #[test]
    fn int_copies_without_remap() {
        let params = [Parameter::new("outfit", ParamKind::Int)];
        let (indexer, allocation) = layout(&params, 1);
        let plan = SideEffectPlan::build(&indexer, &allocation, None);
        assert_eq!(
            plan.local(0).unwrap().as_slice(),
            [SideEffect::copy("outfit", naming::numeric_data_channel(0))]
        );
    }

    #[test]
    fn smoothing_goes_through_handles() {
        use crate::kind::ChannelKind;
        use crate::synth::ChangeRouting;
        use std::collections::BTreeMap;

        let params = [
            Parameter::new("a", ParamKind::Bool),
            Parameter::new("b", ParamKind::Bool),
        ];
        let (indexer, allocation) = layout(&params, 2);
        let kinds: BTreeMap<_, _> = params
            .iter()
            .map(|p| (p.name.clone(), ChannelKind::Bool))
            .collect();
        let differentials = DifferentialPlan::build(&params, &kinds);
        let routing = ChangeRouting::new(&allocation, &differentials);
        let mut graph = synthesize(&indexer, 0.2, Some(&routing)).unwrap();

        let plan = SideEffectPlan::build(&indexer, &allocation, Some(&differentials));
        let attached = plan.attach(&mut graph).unwrap();
        attached.append_smoothing(&mut graph).unwrap();

        let set = graph.machine.node(graph.steps[0].set_value).unwrap();
        let last = set.effects.as_slice().last().unwrap();
        assert_eq!(last, &SideEffect::set(naming::SMOOTHING_AMOUNT, SMOOTHING_TRACK));
        let copies = set
            .effects
            .iter()
            .filter(|e| e.destination() == naming::working_copy("b"))
            .count();
        assert_eq!(copies, 1);

        let reset = graph.machine.node(graph.steps[0].reset.unwrap()).unwrap();
        let last = reset.effects.as_slice().last().unwrap();
        assert_eq!(last, &SideEffect::set(naming::SMOOTHING_AMOUNT, SMOOTHING_FREEZE));
    }
}
