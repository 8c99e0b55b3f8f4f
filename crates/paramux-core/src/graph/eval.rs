//! Channel value store for evaluating emitted graph fragments.
//!
//! The external engine owns execution. These helpers exist so guards, side
//! effects, and expressions can be checked against concrete values.

use std::collections::BTreeMap;

/// Current value of every channel, keyed by name. Missing channels read as 0.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChannelValues {
    values: BTreeMap<String, f32>,
}

impl ChannelValues {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads a channel.
    #[inline]
    pub fn get(&self, name: &str) -> f32 {
        self.values.get(name).copied().unwrap_or(0.0)
    }

    /// Reads a channel as a boolean (non-zero is true).
    #[inline]
    pub fn flag(&self, name: &str) -> bool {
        self.get(name) != 0.0
    }

    /// Writes a channel.
    pub fn set(&mut self, name: impl Into<String>, value: f32) {
        self.values.insert(name.into(), value);
    }

    /// Writes a boolean channel.
    pub fn set_flag(&mut self, name: impl Into<String>, value: bool) {
        self.set(name, if value { 1.0 } else { 0.0 });
    }
}
