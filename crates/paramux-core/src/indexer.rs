//! Binary round-robin addressing.
//!
//! A step count `S` is encoded with `B = ⌈log2(S)⌉` boolean address channels.
//! Step `i` is live when channel `b` (1-indexed from the least significant
//! bit) equals bit `b` of `i`. `S = 1` needs no channels at all: the single
//! bucket is always live.
//!
//! # Example
//!
//! ```rust
//! use paramux_core::BinaryIndexer;
//!
//! let indexer = BinaryIndexer::new(4);
//! assert_eq!(indexer.width(), 2);
//! assert_eq!(indexer.bits(2), vec![false, true]);
//! assert_eq!(indexer.decode(&indexer.match_guard(3)), Some(3));
//! ```

use crate::graph::{Condition, Guard, SideEffect};
use crate::naming;

/// Address encoding for a fixed step count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BinaryIndexer {
    steps: usize,
    width: usize,
}

impl BinaryIndexer {
    /// Creates the encoding for `steps` buckets. `steps = 0` is treated as 1.
    pub fn new(steps: usize) -> Self {
        let steps = steps.max(1);
        let width = if steps == 1 {
            0
        } else {
            (usize::BITS - (steps - 1).leading_zeros()) as usize
        };
        Self { steps, width }
    }

    /// Number of steps (buckets).
    #[inline]
    pub fn steps(&self) -> usize {
        self.steps
    }

    /// Number of address channels, `⌈log2(steps)⌉`.
    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Address channel names, bit 1 (LSB) first.
    pub fn channel_names(&self) -> Vec<String> {
        (1..=self.width).map(naming::address_channel).collect()
    }

    /// Fixed-width encoding of `step`, least significant bit first.
    pub fn bits(&self, step: usize) -> Vec<bool> {
        (0..self.width).map(|b| (step >> b) & 1 == 1).collect()
    }

    /// Encoding of `step` as a most-significant-first string, e.g. `"010"`.
    pub fn bit_string(&self, step: usize) -> String {
        self.bits(step)
            .iter()
            .rev()
            .map(|&bit| if bit { '1' } else { '0' })
            .collect()
    }

    /// Conjunction that holds exactly when `step` is addressed.
    pub fn match_guard(&self, step: usize) -> Guard {
        let conditions = self
            .bits(step)
            .into_iter()
            .enumerate()
            .map(|(b, bit)| Condition::Flag {
                channel: naming::address_channel(b + 1),
                value: bit,
            })
            .collect();
        Guard::new(conditions)
    }

    /// One single-condition guard per bit, each holding when that bit
    /// differs from `step`'s encoding. Any of them holding means `step` is
    /// no longer addressed.
    pub fn mismatch_guards(&self, step: usize) -> Vec<Guard> {
        self.match_guard(step)
            .conditions()
            .iter()
            .filter_map(Condition::inverted)
            .map(Guard::single)
            .collect()
    }

    /// Side effects that write `step`'s encoding to the address channels.
    pub fn assignments(&self, step: usize) -> Vec<SideEffect> {
        self.bits(step)
            .into_iter()
            .enumerate()
            .map(|(b, bit)| SideEffect::set_flag(naming::address_channel(b + 1), bit))
            .collect()
    }

    /// Recovers the step selected by a match guard.
    ///
    /// Returns `None` if the guard references a channel outside this
    /// encoding, sets a bit twice, misses a bit, or decodes past the step count.
    pub fn decode(&self, guard: &Guard) -> Option<usize> {
        let names = self.channel_names();
        let mut seen = vec![false; self.width];
        let mut step = 0usize;
        for condition in guard.conditions() {
            let Condition::Flag { channel, value } = condition else {
                return None;
            };
            let bit = names.iter().position(|n| n == channel)?;
            if seen[bit] {
                return None;
            }
            seen[bit] = true;
            if *value {
                step |= 1 << bit;
            }
        }
        if seen.iter().all(|&s| s) && step < self.steps {
            Some(step)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::ChannelValues;

    #[test]
    fn widths() {
        assert_eq!(BinaryIndexer::new(1).width(), 0);
        assert_eq!(BinaryIndexer::new(2).width(), 1);
        assert_eq!(BinaryIndexer::new(3).width(), 2);
        assert_eq!(BinaryIndexer::new(4).width(), 2);
        assert_eq!(BinaryIndexer::new(5).width(), 3);
        assert_eq!(BinaryIndexer::new(8).width(), 3);
        assert_eq!(BinaryIndexer::new(9).width(), 4);
    }

    #[test]
    fn single_step_is_always_live() {
        let indexer = BinaryIndexer::new(1);
        assert!(indexer.channel_names().is_empty());
        assert!(indexer.match_guard(0).is_always());
        assert!(indexer.mismatch_guards(0).is_empty());
        assert_eq!(indexer.decode(&Guard::always()), Some(0));
    }

    #[test]
    fn bit_strings_are_left_padded() {
        let indexer = BinaryIndexer::new(5);
        assert_eq!(indexer.bit_string(0), "000");
        assert_eq!(indexer.bit_string(2), "010");
        assert_eq!(indexer.bit_string(4), "100");
    }

    #[test]
    fn assignments_satisfy_match_guard() {
        let indexer = BinaryIndexer::new(6);
        for step in 0..6 {
            let mut values = ChannelValues::new();
            for effect in indexer.assignments(step) {
                effect.apply(&mut values);
            }
            for other in 0..6 {
                assert_eq!(indexer.match_guard(other).holds(&values), other == step);
                let mismatch = indexer
                    .mismatch_guards(other)
                    .iter()
                    .any(|g| g.holds(&values));
                assert_eq!(mismatch, other != step);
            }
        }
    }

    #[test]
    fn decode_rejects_foreign_channels() {
        let indexer = BinaryIndexer::new(4);
        let guard = Guard::single(Condition::is_set("elsewhere"));
        assert_eq!(indexer.decode(&guard), None);
        let partial = Guard::single(Condition::is_set(naming::address_channel(1)));
        assert_eq!(indexer.decode(&partial), None);
    }

    #[test]
    fn decode_rejects_out_of_range_steps() {
        // Width 2 can express 3, but only steps 0..3 exist.
        let indexer = BinaryIndexer::new(3);
        let guard = Guard::new(vec![
            Condition::is_set(naming::address_channel(1)),
            Condition::is_set(naming::address_channel(2)),
        ]);
        assert_eq!(indexer.decode(&guard), None);
    }
}
