//! Paramux Core - synchronization scheduler and graph synthesizer
//!
//! This crate compiles a request to multiplex N boolean/numeric parameters
//! over a handful of synchronized transmission channels into a hierarchical
//! state machine, to be run by an external graph-evaluation engine.
//!
//! # Pipeline
//!
//! - [`BinaryIndexer`] - encodes a step count into `⌈log2 S⌉` address channels
//! - [`allocate`] - partitions parameters into one bucket per step
//! - [`DifferentialPlan`] - optional smoothing + differential change detection
//! - [`synthesize`] - builds the local/remote state machine and its guarded transitions
//! - [`SideEffectPlan`] - per-node value-copy lists, attached through [`EffectHandle`]s
//! - [`resolve`] - picks the default-value retention flag for every node
//!
//! [`install`] composes the stages over a captured [`InstallContext`] and
//! commits the result in one step; [`uninstall`] removes it again.
//!
//! # Graph Model
//!
//! - [`ControllerGraph`] - channels, layers, and timing-anchor motions
//! - [`StateMachine`] - sub-graphs and nodes of one layer
//! - [`Transition`] / [`Guard`] / [`Condition`] - guarded edges
//! - [`SideEffect`] - set, copy, and remapped copy
//! - [`Expression`] - per-tick smoothing and differencing
//!
//! Generated artifacts carry a [`Marker`] identifying their category and
//! install batch.
//!
//! # Example
//!
//! ```rust
//! use paramux_core::{
//!     Channel, ChannelKind, ControllerGraph, InstallRequest, ParamKind, ParamTable,
//!     TableEntry, install, uninstall,
//! };
//!
//! let mut table = ParamTable::default();
//! let mut graph = ControllerGraph::new();
//! for name in ["Hat", "Coat", "Scarf", "Boots"] {
//!     table.add_if_absent(TableEntry::new(name, ParamKind::Bool));
//!     graph.add_channel_if_absent(Channel::new(name, ChannelKind::Bool));
//! }
//!
//! let request = InstallRequest::new(["Hat", "Coat", "Scarf", "Boots"], 4);
//! let report = install(&request, &mut table, &mut graph).unwrap();
//! assert_eq!(report.address_channels.len(), 2);
//! assert_eq!(report.data_channels.len(), 1);
//!
//! let removed = uninstall(&mut table, &mut graph).unwrap();
//! assert_eq!(removed.restored.len(), 4);
//! ```

pub mod allocator;
pub mod assembler;
pub mod conformance;
pub mod differential;
pub mod error;
pub mod graph;
pub mod indexer;
pub mod install;
pub mod kind;
pub mod marker;
pub mod naming;
pub mod synth;
pub mod table;
pub mod uninstall;

pub use allocator::{Allocation, AllocationError, FamilyAllocation, RemainderPolicy, Slot, allocate};
pub use assembler::{AttachedEffects, SMOOTHING_FREEZE, SMOOTHING_TRACK, SideEffectPlan};
pub use conformance::{RetentionOption, detect_convention, resolve};
pub use differential::{CHANGE_SENSITIVITY, DifferentialError, DifferentialPlan, Signal};
pub use error::{InstallError, UninstallError};
pub use graph::{
    Channel, ChannelValues, Condition, ControllerGraph, EffectHandle, Expression, GraphError,
    Guard, Layer, LayerBody, MachineId, Motion, Node, NodeId, Position, RangeRemap, SideEffect,
    SideEffectList, StateMachine, SubMachine, Target, Timing, Transition,
};
pub use indexer::BinaryIndexer;
pub use install::{
    DEFAULT_STEP_DELAY, InstallContext, InstallPlan, InstallReport, InstallRequest, install,
    is_installed,
};
pub use kind::{ChannelKind, Family, KindProfile, ParamKind, Parameter, ValueRange};
pub use marker::{ArtifactCategory, BatchId, Marker};
pub use synth::{ChangeRouting, LocalStep, SyncGraph, TICK_SECONDS, synthesize};
pub use table::{DEFAULT_BUDGET_BITS, ParamTable, TableEntry};
pub use uninstall::{UninstallReport, optimized_parameters, uninstall};
