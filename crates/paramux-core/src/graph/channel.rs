//! Typed channels stored in the host graph.

use serde::{Deserialize, Serialize};

use crate::kind::ChannelKind;
use crate::marker::Marker;

/// A named, typed storage slot in the host graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Channel {
    /// Channel name, unique within the graph.
    pub name: String,
    /// Channel kind.
    pub kind: ChannelKind,
    /// Default value.
    #[serde(default)]
    pub default: f32,
    /// Set on channels created by an install.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub marker: Option<Marker>,
}

impl Channel {
    /// Creates an unmarked channel with a zero default.
    pub fn new(name: impl Into<String>, kind: ChannelKind) -> Self {
        Self {
            name: name.into(),
            kind,
            default: 0.0,
            marker: None,
        }
    }

    /// Attaches a marker.
    pub fn marked(mut self, marker: Marker) -> Self {
        self.marker = Some(marker);
        self
    }
}
