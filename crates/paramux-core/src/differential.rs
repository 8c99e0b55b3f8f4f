//! Change detection.
//!
//! For every accelerated parameter the pipeline emits a smoothed tracking
//! channel and a differential channel holding `|working - smoothed|`, clamped
//! to the parameter's differential range. A differential above
//! [`CHANGE_SENSITIVITY`] of that range means the parameter moved enough to
//! resync its bucket out of turn.
//!
//! Bool and int parameters are smoothed through a same-kind working copy so
//! the original channel is never written by the smoothing stage. Floats are
//! smoothed directly.
//!
//! All smoothers share one smoothing-amount channel. Local nodes set it to 0
//! (track instantly) or 1 (freeze).

use std::collections::BTreeMap;

use crate::graph::{Channel, Condition, Expression, Guard};
use crate::kind::{ChannelKind, Parameter, ValueRange};
use crate::marker::{ArtifactCategory, BatchId, Marker};
use crate::naming;

/// Fraction of the differential range that counts as a change.
pub const CHANGE_SENSITIVITY: f32 = 0.05;

/// A parameter the change-detection pipeline could not process.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DifferentialError {
    /// The host channel exists but is not a bool, int, or float.
    #[error("parameter '{name}' has unsupported kind {kind}")]
    UnsupportedKind {
        /// Parameter name.
        name: String,
        /// Kind of the host channel.
        kind: ChannelKind,
    },
    /// The host graph has no channel for the parameter.
    #[error("parameter '{name}' has no channel in the host graph")]
    MissingChannel {
        /// Parameter name.
        name: String,
    },
}

impl DifferentialError {
    /// Name of the rejected parameter.
    pub fn name(&self) -> &str {
        match self {
            Self::UnsupportedKind { name, .. } | Self::MissingChannel { name } => name,
        }
    }
}

/// Channels emitted for one accelerated parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct Signal {
    /// Parameter name.
    pub param: String,
    /// Host channel kind of the parameter.
    pub kind: ChannelKind,
    /// Working copy, for bool and int parameters.
    pub working_copy: Option<String>,
    /// Smoothed tracking channel.
    pub smoothed: String,
    /// Differential channel.
    pub differential: String,
    /// Range the differential is clamped to.
    pub range: ValueRange,
}

impl Signal {
    /// Channel the smoother reads from: the working copy, or the parameter.
    pub fn input(&self) -> &str {
        self.working_copy.as_deref().unwrap_or(&self.param)
    }

    /// Differential level above which the parameter counts as changed.
    pub fn threshold(&self) -> f32 {
        CHANGE_SENSITIVITY * self.range.span()
    }

    /// Guard that holds while the parameter is changing.
    pub fn change_guard(&self) -> Guard {
        Guard::single(Condition::greater(&self.differential, self.threshold()))
    }
}

/// Output of the change-detection pipeline.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DifferentialPlan {
    signals: Vec<Signal>,
    rejected: Vec<DifferentialError>,
}

impl DifferentialPlan {
    /// Builds signals for `params`, using the kinds their host channels had
    /// when the install context was captured.
    ///
    /// Parameters whose host channel is missing or not a bool, int, or float
    /// are rejected individually; the rest are still processed.
    pub fn build(params: &[Parameter], host_kinds: &BTreeMap<String, ChannelKind>) -> Self {
        let mut plan = Self::default();
        for param in params {
            let kind = match host_kinds.get(&param.name) {
                None => {
                    plan.reject(DifferentialError::MissingChannel {
                        name: param.name.clone(),
                    });
                    continue;
                }
                Some(kind) if kind.param_kind().is_none() => {
                    plan.reject(DifferentialError::UnsupportedKind {
                        name: param.name.clone(),
                        kind: *kind,
                    });
                    continue;
                }
                Some(kind) => *kind,
            };

            let working_copy = param
                .kind
                .profile()
                .working_copy
                .then(|| naming::working_copy(&param.name));
            let source = working_copy.as_deref().unwrap_or(&param.name);
            let signal = Signal {
                param: param.name.clone(),
                kind,
                smoothed: naming::smoothed(source),
                differential: naming::differential(source),
                working_copy: working_copy.clone(),
                range: param.differential_range(),
            };
            tracing::debug!(
                "differential: '{}' -> '{}' (threshold {})",
                signal.param,
                signal.differential,
                signal.threshold()
            );
            plan.signals.push(signal);
        }
        plan
    }

    fn reject(&mut self, err: DifferentialError) {
        tracing::error!("differential: {err}, skipping");
        self.rejected.push(err);
    }

    /// Accelerated parameters, in input order.
    pub fn signals(&self) -> &[Signal] {
        &self.signals
    }

    /// Parameters the pipeline rejected.
    pub fn rejected(&self) -> &[DifferentialError] {
        &self.rejected
    }

    /// Signal of a parameter, if it is accelerated.
    pub fn signal(&self, param: &str) -> Option<&Signal> {
        self.signals.iter().find(|s| s.param == param)
    }

    /// `(parameter, working copy)` pairs.
    pub fn working_copies(&self) -> impl Iterator<Item = (&str, &str)> {
        self.signals
            .iter()
            .filter_map(|s| s.working_copy.as_deref().map(|c| (s.param.as_str(), c)))
    }

    /// Per-tick expressions: every smoother first, then every differential.
    pub fn expressions(&self) -> Vec<Expression> {
        let smoothers = self.signals.iter().map(|s| Expression::Smooth {
            output: s.smoothed.clone(),
            input: s.input().to_owned(),
            amount: naming::SMOOTHING_AMOUNT.to_owned(),
        });
        let differentials = self.signals.iter().map(|s| Expression::AbsDifference {
            output: s.differential.clone(),
            a: s.input().to_owned(),
            b: s.smoothed.clone(),
            range: s.range,
        });
        smoothers.chain(differentials).collect()
    }

    /// Channels the pipeline needs, marked with `batch`.
    ///
    /// Empty when no parameter is accelerated.
    pub fn channels(&self, batch: BatchId) -> Vec<Channel> {
        if self.signals.is_empty() {
            return Vec::new();
        }
        let mark = |category| Marker::new(category, batch);
        let mut channels = vec![
            Channel::new(naming::SMOOTHING_AMOUNT, ChannelKind::Float)
                .marked(mark(ArtifactCategory::SmoothingAmount)),
        ];
        for signal in &self.signals {
            if let Some(copy) = &signal.working_copy {
                channels.push(
                    Channel::new(copy.clone(), signal.kind)
                        .marked(mark(ArtifactCategory::WorkingCopy)),
                );
            }
            channels.push(
                Channel::new(signal.smoothed.clone(), ChannelKind::Float)
                    .marked(mark(ArtifactCategory::SmoothedChannel)),
            );
            channels.push(
                Channel::new(signal.differential.clone(), ChannelKind::Float)
                    .marked(mark(ArtifactCategory::DifferentialChannel)),
            );
        }
        channels
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::ChannelValues;
    use crate::kind::ParamKind;

    fn kinds(entries: &[(&str, ChannelKind)]) -> BTreeMap<String, ChannelKind> {
        entries
            .iter()
            .map(|(n, k)| ((*n).to_string(), *k))
            .collect()
    }

    #[test]
    fn bool_and_int_get_working_copies() {
        let params = [
            Parameter::new("Hat", ParamKind::Bool),
            Parameter::new("Outfit", ParamKind::Int),
            Parameter::new("Hue", ParamKind::Float),
        ];
        let plan = DifferentialPlan::build(
            &params,
            &kinds(&[
                ("Hat", ChannelKind::Bool),
                ("Outfit", ChannelKind::Int),
                ("Hue", ChannelKind::Float),
            ]),
        );
        let copies: Vec<_> = plan.working_copies().map(|(p, _)| p).collect();
        assert_eq!(copies, ["Hat", "Outfit"]);
        assert_eq!(plan.signal("Hue").unwrap().input(), "Hue");
        assert_eq!(plan.signal("Hat").unwrap().input(), naming::working_copy("Hat"));
    }

    #[test]
    fn triggers_and_missing_channels_are_skipped() {
        let params = [
            Parameter::new("Wave", ParamKind::Bool),
            Parameter::new("Gone", ParamKind::Bool),
            Parameter::new("Ok", ParamKind::Bool),
        ];
        let plan = DifferentialPlan::build(
            &params,
            &kinds(&[("Wave", ChannelKind::Trigger), ("Ok", ChannelKind::Bool)]),
        );
        assert_eq!(plan.signals().len(), 1);
        let rejected: Vec<_> = plan.rejected().iter().map(DifferentialError::name).collect();
        assert_eq!(rejected, ["Wave", "Gone"]);
    }

    #[test]
    fn bipolar_threshold_scales_with_range() {
        let params = [Parameter::new("Tilt", ParamKind::Float).bipolar()];
        let plan = DifferentialPlan::build(&params, &kinds(&[("Tilt", ChannelKind::Float)]));
        let signal = plan.signal("Tilt").unwrap();
        assert_eq!(signal.range, ValueRange::BIPOLAR);
        assert!((signal.threshold() - 0.1).abs() < 1e-6);
    }

    #[test]
    fn channels_include_shared_smoothing_amount_once() {
        let params = [
            Parameter::new("a", ParamKind::Bool),
            Parameter::new("b", ParamKind::Float),
        ];
        let plan = DifferentialPlan::build(
            &params,
            &kinds(&[("a", ChannelKind::Bool), ("b", ChannelKind::Float)]),
        );
        let channels = plan.channels(BatchId(1));
        let amount = channels
            .iter()
            .filter(|c| c.name == naming::SMOOTHING_AMOUNT)
            .count();
        assert_eq!(amount, 1);
        // amount + (copy, smoothed, delta) + (smoothed, delta)
        assert_eq!(channels.len(), 6);
        assert!(DifferentialPlan::default().channels(BatchId(1)).is_empty());
    }

    #[test]
    fn frozen_smoother_reports_step_size() {
        let params = [Parameter::new("x", ParamKind::Float)];
        let plan = DifferentialPlan::build(&params, &kinds(&[("x", ChannelKind::Float)]));
        let signal = plan.signal("x").unwrap().clone();
        let mut values = ChannelValues::new();
        values.set("x", 0.3);
        values.set(naming::SMOOTHING_AMOUNT, 0.0);
        for expr in plan.expressions() {
            expr.step(&mut values);
        }
        assert_eq!(values.get(&signal.differential), 0.0);
        assert!(!signal.change_guard().holds(&values));

        values.set(naming::SMOOTHING_AMOUNT, 1.0);
        values.set("x", 0.5);
        for expr in plan.expressions() {
            expr.step(&mut values);
        }
        assert!((values.get(&signal.differential) - 0.2).abs() < 1e-6);
        assert!(signal.change_guard().holds(&values));
    }
}
