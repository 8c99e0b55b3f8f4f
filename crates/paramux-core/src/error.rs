//! Install and uninstall errors.
//!
//! Every variant is raised before the graph or the parameter table is
//! mutated.

use crate::allocator::AllocationError;
use crate::graph::GraphError;

/// Errors that abort an install.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InstallError {
    /// The graph already carries generated layers.
    #[error("multiplexer is already installed; uninstall it first")]
    AlreadyInstalled,
    /// Step count below 1.
    #[error("step count must be at least 1, got {0}")]
    InvalidStepCount(usize),
    /// Step delay not positive and finite.
    #[error("step delay must be positive and finite, got {0}")]
    InvalidStepDelay(f32),
    /// No parameters requested.
    #[error("no parameters selected for multiplexing")]
    NoParameters,
    /// A requested parameter is not in the parameter table.
    #[error("parameter '{0}' is not in the parameter table")]
    UnknownParameter(String),
    /// A requested parameter is not network-synchronized.
    #[error("parameter '{0}' is not network-synchronized")]
    ParameterNotSynced(String),
    /// A parameter was requested twice.
    #[error("parameter '{0}' is listed more than once")]
    DuplicateParameter(String),
    /// A parameter marked bipolar is not a float.
    #[error("parameter '{0}' is marked bipolar but is not a float")]
    BipolarNotFloat(String),
    /// Bucket allocation failed.
    #[error(transparent)]
    Allocation(#[from] AllocationError),
    /// Allocation left every bucket empty.
    #[error("none of the {count} parameters fit into {steps} steps")]
    NothingAssigned {
        /// Requested step count.
        steps: usize,
        /// Requested parameter count.
        count: usize,
    },
    /// A generated channel or table entry name is already used by the host.
    #[error("generated name '{0}' is already used by the host")]
    NameTaken(String),
    /// The installed layout would not fit the transmission budget.
    #[error("install needs {required} synced bits but the budget is {budget}")]
    BudgetExceeded {
        /// Bits synced after the install.
        required: u32,
        /// Table budget.
        budget: u32,
    },
    /// Graph construction failed.
    #[error(transparent)]
    Graph(#[from] GraphError),
}

/// Errors that abort an uninstall.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UninstallError {
    /// More than one change-detection layer.
    #[error("{0} change-detection layers found, unable to uninstall automatically")]
    AmbiguousExpressionLayers(usize),
    /// Not exactly one sync layer.
    #[error("{0} syncing layers found, unable to uninstall automatically")]
    AmbiguousSyncLayers(usize),
    /// No generated entries in the parameter table.
    #[error("too few generated expression parameters found (only {0})")]
    TooFewGeneratedTableEntries(usize),
    /// No generated channels in the graph.
    #[error("too few generated graph channels found (only {0})")]
    TooFewGeneratedChannels(usize),
    /// No optimized parameters recoverable from the sync layer.
    #[error("too few optimized parameters found (only {0})")]
    TooFewOptimizedParameters(usize),
}
