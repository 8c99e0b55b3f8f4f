//! Structured identity for generated artifacts.
//!
//! Every channel, table entry, layer, and timing anchor created by an install
//! carries a [`Marker`]: the category of artifact and the generation batch it
//! belongs to. The presence check and uninstall select artifacts by marker.

use serde::{Deserialize, Serialize};

/// Generation batch. Each install takes the next unused batch number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BatchId(pub u32);

impl BatchId {
    /// Returns the following batch number.
    #[inline]
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl core::fmt::Display for BatchId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "batch {}", self.0)
    }
}

/// What a generated artifact is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactCategory {
    /// The state-machine layer holding the local/remote sub-graphs.
    SyncLayer,
    /// The per-tick smoothing/differential layer.
    ExpressionLayer,
    /// Indexer bit channel.
    AddressChannel,
    /// Bucket-position data channel.
    DataChannel,
    /// Working copy of a bool/int parameter.
    WorkingCopy,
    /// Smoothed tracking copy.
    SmoothedChannel,
    /// Differential signal.
    DifferentialChannel,
    /// Shared smoothing-amount channel.
    SmoothingAmount,
    /// Timing anchor motion. Kept across uninstalls for reuse.
    TimingAnchor,
}

/// Category and batch of a generated artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Marker {
    /// Artifact category.
    pub category: ArtifactCategory,
    /// Generation batch.
    pub batch: BatchId,
}

impl Marker {
    /// Creates a marker.
    pub const fn new(category: ArtifactCategory, batch: BatchId) -> Self {
        Self { category, batch }
    }

    /// Returns `true` if this marker belongs to `batch`.
    #[inline]
    pub fn in_batch(&self, batch: BatchId) -> bool {
        self.batch == batch
    }
}
