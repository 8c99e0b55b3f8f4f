//! Per-node side effects.
//!
//! A [`SideEffectList`] is executed once, in order, when its node is entered.
//! Each [`SideEffect`] sets a constant, copies one channel into another, or
//! copies with a linear [`RangeRemap`].

use serde::{Deserialize, Serialize};

use super::eval::ChannelValues;
use super::node::NodeId;
use crate::kind::ValueRange;

/// Linear mapping from one value range to another.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RangeRemap {
    /// Source range.
    pub from: ValueRange,
    /// Destination range.
    pub to: ValueRange,
    /// Round the result to an integer (destination is an int channel).
    #[serde(default)]
    pub quantize: bool,
}

impl RangeRemap {
    /// Creates a non-quantizing remap.
    pub const fn new(from: ValueRange, to: ValueRange) -> Self {
        Self {
            from,
            to,
            quantize: false,
        }
    }

    /// Rounds results to integers.
    pub const fn quantized(mut self) -> Self {
        self.quantize = true;
        self
    }

    /// The reverse mapping. Never quantizes.
    pub const fn inverse(self) -> Self {
        Self::new(self.to, self.from)
    }

    /// Maps `value`, clamping the result into the destination range.
    pub fn apply(self, value: f32) -> f32 {
        let mapped = self.to.clamp(self.from.map_to(value, self.to));
        if self.quantize { mapped.round() } else { mapped }
    }
}

/// A value assignment performed on node entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum SideEffect {
    /// Write a constant.
    Set {
        /// Destination channel.
        channel: String,
        /// Value written.
        value: f32,
    },
    /// Copy `source` into `destination`.
    Copy {
        /// Source channel.
        source: String,
        /// Destination channel.
        destination: String,
    },
    /// Copy `source` into `destination` through a range remap.
    CopyRemap {
        /// Source channel.
        source: String,
        /// Destination channel.
        destination: String,
        /// Mapping applied to the copied value.
        remap: RangeRemap,
    },
}

impl SideEffect {
    /// Constant assignment.
    pub fn set(channel: impl Into<String>, value: f32) -> Self {
        Self::Set {
            channel: channel.into(),
            value,
        }
    }

    /// Boolean constant assignment.
    pub fn set_flag(channel: impl Into<String>, value: bool) -> Self {
        Self::set(channel, if value { 1.0 } else { 0.0 })
    }

    /// Plain copy.
    pub fn copy(source: impl Into<String>, destination: impl Into<String>) -> Self {
        Self::Copy {
            source: source.into(),
            destination: destination.into(),
        }
    }

    /// Copy through a remap.
    pub fn copy_remap(
        source: impl Into<String>,
        destination: impl Into<String>,
        remap: RangeRemap,
    ) -> Self {
        Self::CopyRemap {
            source: source.into(),
            destination: destination.into(),
            remap,
        }
    }

    /// Channel written by this side effect.
    pub fn destination(&self) -> &str {
        match self {
            Self::Set { channel, .. } => channel,
            Self::Copy { destination, .. } | Self::CopyRemap { destination, .. } => destination,
        }
    }

    /// Channel read by this side effect, if any.
    pub fn source(&self) -> Option<&str> {
        match self {
            Self::Set { .. } => None,
            Self::Copy { source, .. } | Self::CopyRemap { source, .. } => Some(source),
        }
    }

    /// Executes the side effect against `values`.
    pub fn apply(&self, values: &mut ChannelValues) {
        match self {
            Self::Set { channel, value } => values.set(channel.clone(), *value),
            Self::Copy {
                source,
                destination,
            } => {
                let v = values.get(source);
                values.set(destination.clone(), v);
            }
            Self::CopyRemap {
                source,
                destination,
                remap,
            } => {
                let v = remap.apply(values.get(source));
                values.set(destination.clone(), v);
            }
        }
    }
}

/// Ordered side effects of one node.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SideEffectList {
    effects: Vec<SideEffect>,
}

impl SideEffectList {
    /// Creates an empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a side effect.
    pub fn push(&mut self, effect: SideEffect) {
        self.effects.push(effect);
    }

    /// Side effects in execution order.
    pub fn as_slice(&self) -> &[SideEffect] {
        &self.effects
    }

    /// Iterates in execution order.
    pub fn iter(&self) -> impl Iterator<Item = &SideEffect> {
        self.effects.iter()
    }

    /// Number of side effects.
    pub fn len(&self) -> usize {
        self.effects.len()
    }

    /// Returns `true` if the list is empty.
    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }

    /// Executes every side effect in order.
    pub fn apply(&self, values: &mut ChannelValues) {
        for effect in &self.effects {
            effect.apply(values);
        }
    }
}

impl Extend<SideEffect> for SideEffectList {
    fn extend<I: IntoIterator<Item = SideEffect>>(&mut self, iter: I) {
        self.effects.extend(iter);
    }
}

impl FromIterator<SideEffect> for SideEffectList {
    fn from_iter<I: IntoIterator<Item = SideEffect>>(iter: I) -> Self {
        Self {
            effects: iter.into_iter().collect(),
        }
    }
}

/// Handle to a node's attached side-effect list.
///
/// Returned by [`StateMachine::attach_effects`](super::StateMachine::attach_effects)
/// and required by later stages that append to the list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EffectHandle {
    pub(crate) node: NodeId,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remap_clamps_and_quantizes() {
        let remap = RangeRemap::new(ValueRange::UNIT, ValueRange::BYTE).quantized();
        assert_eq!(remap.apply(0.0), 0.0);
        assert_eq!(remap.apply(1.0), 255.0);
        assert_eq!(remap.apply(2.0), 255.0);
        assert_eq!(remap.apply(0.5), 128.0);
    }

    #[test]
    fn inverse_does_not_quantize() {
        let remap = RangeRemap::new(ValueRange::UNIT, ValueRange::BYTE).quantized();
        let inv = remap.inverse();
        assert!(!inv.quantize);
        assert!((inv.apply(51.0) - 0.2).abs() < 1e-6);
    }

    #[test]
    fn list_applies_in_order() {
        let list: SideEffectList = [
            SideEffect::set("a", 3.0),
            SideEffect::copy("a", "b"),
            SideEffect::set("a", 5.0),
        ]
        .into_iter()
        .collect();

        let mut values = ChannelValues::new();
        list.apply(&mut values);
        assert_eq!(values.get("a"), 5.0);
        assert_eq!(values.get("b"), 3.0);
    }

    #[test]
    fn reapplying_with_same_sources_is_idempotent() {
        let list: SideEffectList = [
            SideEffect::set_flag("bit", true),
            SideEffect::copy_remap(
                "p",
                "slot",
                RangeRemap::new(ValueRange::UNIT, ValueRange::BYTE).quantized(),
            ),
        ]
        .into_iter()
        .collect();

        let mut values = ChannelValues::new();
        values.set("p", 0.3);
        list.apply(&mut values);
        let once = values.clone();
        list.apply(&mut values);
        assert_eq!(values, once);
    }
}
