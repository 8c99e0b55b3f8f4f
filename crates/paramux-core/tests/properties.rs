//! Property-based tests for paramux-core.
//!
//! Tests address encoding, bucket allocation, transport remapping, and the
//! change-detection differential using proptest for randomized inputs.

use std::collections::{BTreeMap, BTreeSet};

use proptest::prelude::*;
use paramux_core::{
    BinaryIndexer, ChannelKind, ChannelValues, DifferentialPlan, ParamKind, Parameter, RangeRemap,
    RemainderPolicy, ValueRange, allocate, naming,
};

fn kind_strategy() -> impl Strategy<Value = ParamKind> {
    prop_oneof![
        Just(ParamKind::Bool),
        Just(ParamKind::Int),
        Just(ParamKind::Float),
    ]
}

fn policy_strategy() -> impl Strategy<Value = RemainderPolicy> {
    prop_oneof![
        Just(RemainderPolicy::Distribute),
        Just(RemainderPolicy::Truncate),
    ]
}

fn params_from(kinds: &[ParamKind]) -> Vec<Parameter> {
    kinds
        .iter()
        .enumerate()
        .map(|(i, kind)| Parameter::new(format!("p{i}"), *kind))
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(300))]

    /// For any step count, the address width is ⌈log2 S⌉ and every step has
    /// a distinct encoding of exactly that width.
    #[test]
    fn encodings_are_minimal_and_distinct(steps in 1usize..300) {
        let indexer = BinaryIndexer::new(steps);
        let expected = (steps as f64).log2().ceil() as usize;
        prop_assert_eq!(indexer.width(), expected);

        let encodings: BTreeSet<Vec<bool>> = (0..steps).map(|i| indexer.bits(i)).collect();
        prop_assert_eq!(encodings.len(), steps);
        prop_assert!(encodings.iter().all(|e| e.len() == expected));
    }

    /// Decoding a step's match guard returns the step.
    #[test]
    fn match_guard_decodes_to_step(steps in 1usize..200, seed in any::<usize>()) {
        let indexer = BinaryIndexer::new(steps);
        let step = seed % steps;
        prop_assert_eq!(indexer.decode(&indexer.match_guard(step)), Some(step));
    }

    /// Every assigned parameter appears in exactly one bucket, and no family
    /// assigns more parameters than it was given.
    #[test]
    fn allocation_assigns_each_parameter_once(
        kinds in prop::collection::vec(kind_strategy(), 0..40),
        steps in 1usize..12,
        policy in policy_strategy(),
    ) {
        let params = params_from(&kinds);
        let allocation = allocate(&params, steps, policy).unwrap();

        let mut seen = BTreeSet::new();
        for name in allocation.assigned().map(|p| p.name.clone()) {
            prop_assert!(seen.insert(name), "parameter assigned twice");
        }
        let unassigned: BTreeSet<_> = allocation.unassigned().map(|p| p.name.clone()).collect();
        prop_assert!(seen.is_disjoint(&unassigned));
        prop_assert_eq!(seen.len() + unassigned.len(), params.len());

        for family in allocation.families() {
            let total = family.assigned().count() + family.unassigned().len();
            prop_assert!(family.buckets().len() == steps);
            if policy == RemainderPolicy::Truncate {
                prop_assert!(family.channel_count() * steps <= total);
            } else {
                prop_assert!(family.unassigned().is_empty());
            }
        }
    }

    /// A float sent through the quantized local remap and back through the
    /// inverse lands within half a transport step of where it started.
    #[test]
    fn float_remap_round_trips(value in 0.0f32..=1.0f32, bipolar in any::<bool>()) {
        let range = if bipolar { ValueRange::BIPOLAR } else { ValueRange::UNIT };
        let value = ValueRange::UNIT.map_to(value, range);
        let out = RangeRemap::new(range, ValueRange::BYTE).quantized();
        let back = out.inverse();

        let sent = out.apply(value);
        prop_assert!(sent == sent.round());
        let received = back.apply(sent);
        let half_step = range.span() / ValueRange::BYTE.span() / 2.0;
        prop_assert!((received - value).abs() <= half_step + 1e-5);
    }

    /// With the smoother primed to the raw value the differential is zero;
    /// after a step of Δ with the smoother frozen it equals |Δ|, clamped.
    #[test]
    fn differential_tracks_frozen_step(
        start in -1.0f32..=1.0f32,
        delta in -2.0f32..=2.0f32,
        bipolar in any::<bool>(),
    ) {
        let mut param = Parameter::new("x", ParamKind::Float);
        if bipolar {
            param = param.bipolar();
        }
        let kinds: BTreeMap<_, _> = [("x".to_string(), ChannelKind::Float)].into_iter().collect();
        let plan = DifferentialPlan::build(std::slice::from_ref(&param), &kinds);
        let signal = plan.signal("x").unwrap().clone();

        let mut values = ChannelValues::new();
        values.set("x", start);
        values.set(naming::SMOOTHING_AMOUNT, 0.0);
        for expr in plan.expressions() {
            expr.step(&mut values);
        }
        prop_assert_eq!(values.get(&signal.differential), 0.0);

        values.set(naming::SMOOTHING_AMOUNT, 1.0);
        values.set("x", start + delta);
        for expr in plan.expressions() {
            expr.step(&mut values);
        }
        let expected = param.range.clamp(delta.abs());
        prop_assert!((values.get(&signal.differential) - expected).abs() < 1e-5);
    }
}
