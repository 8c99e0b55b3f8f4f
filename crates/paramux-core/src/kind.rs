//! Parameter kinds and their transport profiles.
//!
//! Every multiplexed parameter is one of three network kinds. Instead of
//! branching on the kind at each call site, the kind-specific behavior lives
//! in a static [`KindProfile`] table: which channel family carries it, what
//! channel kind the transport slot uses, whether its value is range-remapped
//! on the way in and out, and how much of the transmission budget it costs.
//!
//! # Example
//!
//! ```rust
//! use paramux_core::{ChannelKind, Family, ParamKind};
//!
//! let profile = ParamKind::Float.profile();
//! assert_eq!(profile.family, Family::Numeric);
//! assert_eq!(profile.transport, ChannelKind::Int);
//! assert!(profile.remap);
//! ```

use serde::{Deserialize, Serialize};

/// Network kind of an externally-synchronized parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamKind {
    /// One-bit boolean.
    Bool,
    /// Eight-bit integer in `[0, 255]`.
    Int,
    /// Eight-bit quantized float.
    Float,
}

/// Kind of a channel stored in the host graph.
///
/// The host engine knows one more kind than the network does: triggers, which
/// cannot be multiplexed and are rejected by the change-detection pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelKind {
    /// Boolean channel.
    Bool,
    /// Integer channel.
    Int,
    /// Float channel.
    Float,
    /// One-shot trigger channel.
    Trigger,
}

impl ChannelKind {
    /// Returns the network kind for this channel kind, if it has one.
    pub fn param_kind(self) -> Option<ParamKind> {
        match self {
            Self::Bool => Some(ParamKind::Bool),
            Self::Int => Some(ParamKind::Int),
            Self::Float => Some(ParamKind::Float),
            Self::Trigger => None,
        }
    }
}

impl From<ParamKind> for ChannelKind {
    fn from(kind: ParamKind) -> Self {
        match kind {
            ParamKind::Bool => Self::Bool,
            ParamKind::Int => Self::Int,
            ParamKind::Float => Self::Float,
        }
    }
}

/// Disjoint families of data channels.
///
/// Booleans and numerics are allocated independently and never share a
/// data channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Family {
    /// Boolean data channels.
    Bool,
    /// Int/float data channels.
    Numeric,
}

/// A closed numeric interval `[min, max]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValueRange {
    /// Lower bound.
    pub min: f32,
    /// Upper bound.
    pub max: f32,
}

impl ValueRange {
    /// The unit interval `[0, 1]`.
    pub const UNIT: Self = Self::new(0.0, 1.0);
    /// The bipolar interval `[-1, 1]`.
    pub const BIPOLAR: Self = Self::new(-1.0, 1.0);
    /// The eight-bit transport interval `[0, 255]`.
    pub const BYTE: Self = Self::new(0.0, 255.0);

    /// Creates a range.
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    /// Width of the range (`max - min`).
    #[inline]
    pub fn span(self) -> f32 {
        self.max - self.min
    }

    /// Clamps `value` into the range.
    #[inline]
    pub fn clamp(self, value: f32) -> f32 {
        value.clamp(self.min, self.max)
    }

    /// Linearly maps `value` from this range into `target`.
    ///
    /// A zero-width source range maps everything to `target.min`.
    pub fn map_to(self, value: f32, target: Self) -> f32 {
        let span = self.span();
        if span == 0.0 {
            return target.min;
        }
        target.min + (value - self.min) / span * target.span()
    }
}

/// Kind-specific transport behavior.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KindProfile {
    /// Channel family the parameter is multiplexed through.
    pub family: Family,
    /// Kind of the shared data channel.
    pub transport: ChannelKind,
    /// Value range of the data channel.
    pub transport_range: ValueRange,
    /// Range of the parameter itself when not declared otherwise.
    pub natural_range: ValueRange,
    /// Range the differential signal is clamped to.
    pub differential_range: ValueRange,
    /// Bits consumed from the transmission budget when synced directly.
    pub cost_bits: u32,
    /// Whether the change detector needs a working copy of the parameter.
    pub working_copy: bool,
    /// Whether copies to and from the data channel are range-remapped.
    pub remap: bool,
}

const BOOL_PROFILE: KindProfile = KindProfile {
    family: Family::Bool,
    transport: ChannelKind::Bool,
    transport_range: ValueRange::UNIT,
    natural_range: ValueRange::UNIT,
    differential_range: ValueRange::UNIT,
    cost_bits: 1,
    working_copy: true,
    remap: false,
};

const INT_PROFILE: KindProfile = KindProfile {
    family: Family::Numeric,
    transport: ChannelKind::Int,
    transport_range: ValueRange::BYTE,
    natural_range: ValueRange::BYTE,
    differential_range: ValueRange::UNIT,
    cost_bits: 8,
    working_copy: true,
    remap: false,
};

const FLOAT_PROFILE: KindProfile = KindProfile {
    family: Family::Numeric,
    transport: ChannelKind::Int,
    transport_range: ValueRange::BYTE,
    natural_range: ValueRange::UNIT,
    differential_range: ValueRange::UNIT,
    cost_bits: 8,
    working_copy: false,
    remap: true,
};

impl ParamKind {
    /// Returns the static transport profile for this kind.
    pub const fn profile(self) -> &'static KindProfile {
        match self {
            Self::Bool => &BOOL_PROFILE,
            Self::Int => &INT_PROFILE,
            Self::Float => &FLOAT_PROFILE,
        }
    }

    /// Shorthand for `self.profile().family`.
    #[inline]
    pub const fn family(self) -> Family {
        self.profile().family
    }

    /// Display name used in logs and reports.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Float => "float",
        }
    }
}

impl core::fmt::Display for ParamKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let name = match self {
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Float => "float",
            Self::Trigger => "trigger",
        };
        f.write_str(name)
    }
}

/// A parameter selected for multiplexing.
///
/// Captured from the parameter table at install time; never mutated afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    /// Parameter name, shared by the table entry and the host channel.
    pub name: String,
    /// Network kind.
    pub kind: ParamKind,
    /// Declared value range.
    pub range: ValueRange,
}

impl Parameter {
    /// Creates a parameter with its kind's natural range.
    pub fn new(name: impl Into<String>, kind: ParamKind) -> Self {
        Self {
            name: name.into(),
            kind,
            range: kind.profile().natural_range,
        }
    }

    /// Declares a float parameter as bipolar (`[-1, 1]`).
    ///
    /// Has no effect on bool and int parameters.
    pub fn bipolar(mut self) -> Self {
        if self.kind == ParamKind::Float {
            self.range = ValueRange::BIPOLAR;
        }
        self
    }

    /// Range the differential signal of this parameter is clamped to.
    ///
    /// Bool and int parameters use `[0, 1]`; floats use their declared range.
    pub fn differential_range(&self) -> ValueRange {
        match self.kind {
            ParamKind::Float => self.range,
            _ => self.kind.profile().differential_range,
        }
    }

    /// Channel family this parameter is multiplexed through.
    #[inline]
    pub fn family(&self) -> Family {
        self.kind.family()
    }
}
