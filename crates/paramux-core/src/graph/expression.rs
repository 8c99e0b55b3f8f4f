//! Per-tick expressions of the change-detection layer.
//!
//! The engine re-evaluates every expression once per tick. Two shapes are
//! emitted: an exponential tracker that follows its input at a rate set by a
//! shared smoothing-amount channel, and a clamped absolute difference.

use serde::{Deserialize, Serialize};

use super::eval::ChannelValues;
use crate::kind::ValueRange;

/// A per-tick computation writing one channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "expr", rename_all = "snake_case")]
pub enum Expression {
    /// `output = amount * output + (1 - amount) * input`.
    ///
    /// `amount = 0` snaps to the input; `amount = 1` freezes the output.
    Smooth {
        /// Tracking channel.
        output: String,
        /// Tracked channel.
        input: String,
        /// Smoothing-amount channel, read clamped to `[0, 1]`.
        amount: String,
    },
    /// `output = clamp(|a - b|, range)`.
    AbsDifference {
        /// Differential channel.
        output: String,
        /// Minuend.
        a: String,
        /// Subtrahend.
        b: String,
        /// Clamp range.
        range: ValueRange,
    },
}

impl Expression {
    /// Channel written by the expression.
    pub fn output(&self) -> &str {
        match self {
            Self::Smooth { output, .. } | Self::AbsDifference { output, .. } => output,
        }
    }

    /// Evaluates one tick.
    pub fn step(&self, values: &mut ChannelValues) {
        match self {
            Self::Smooth {
                output,
                input,
                amount,
            } => {
                let k = values.get(amount).clamp(0.0, 1.0);
                let current = values.get(output);
                let next = current + (1.0 - k) * (values.get(input) - current);
                values.set(output.clone(), next);
            }
            Self::AbsDifference { output, a, b, range } => {
                let diff = (values.get(a) - values.get(b)).abs();
                values.set(output.clone(), range.clamp(diff));
            }
        }
    }
}
