//! Install pipeline.
//!
//! An install runs in three phases:
//!
//! 1. [`InstallContext::capture`] validates the request and copies everything
//!    it needs out of the parameter table and the host graph.
//! 2. [`InstallPlan::build`] runs allocation, change detection, synthesis,
//!    side-effect assembly, and conformance against that snapshot, and checks
//!    the transmission budget. Nothing is mutated.
//! 3. [`InstallPlan::commit`] writes the planned artifacts into the graph and
//!    the table.
//!
//! [`install`] runs all three after the presence check.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::allocator::{Allocation, RemainderPolicy, allocate};
use crate::assembler::SideEffectPlan;
use crate::conformance::{RetentionOption, detect_convention, resolve};
use crate::differential::DifferentialPlan;
use crate::error::InstallError;
use crate::graph::{Channel, ControllerGraph, Layer, Motion};
use crate::indexer::BinaryIndexer;
use crate::kind::{ChannelKind, Family, ParamKind, Parameter};
use crate::marker::{ArtifactCategory, BatchId, Marker};
use crate::naming;
use crate::synth::{ChangeRouting, TICK_SECONDS, synthesize};
use crate::table::{ParamTable, TableEntry};

/// Default time each set-value node holds, in seconds.
pub const DEFAULT_STEP_DELAY: f32 = 0.2;

/// Duration of the one-second timing anchor.
const ONE_SECOND: f32 = 1.0;

/// What to multiplex and how.
#[derive(Debug, Clone, PartialEq)]
pub struct InstallRequest {
    /// Names of the parameters to multiplex, in allocation order.
    pub parameters: Vec<String>,
    /// Float parameters whose range is `[-1, 1]`.
    pub bipolar: Vec<String>,
    /// Number of synchronization steps (buckets).
    pub step_count: usize,
    /// Seconds each step stays live.
    pub step_delay: f32,
    /// Whether to build the change-detection pipeline.
    pub change_detection: bool,
    /// Default-value retention option.
    pub retention: RetentionOption,
    /// Where missing timing-anchor assets are created.
    pub storage_path: String,
    /// How to handle counts that do not divide evenly.
    pub remainder: RemainderPolicy,
}

impl InstallRequest {
    /// Creates a request with default options.
    pub fn new<I, S>(parameters: I, step_count: usize) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            parameters: parameters.into_iter().map(Into::into).collect(),
            bipolar: Vec::new(),
            step_count,
            step_delay: DEFAULT_STEP_DELAY,
            change_detection: false,
            retention: RetentionOption::Auto,
            storage_path: String::new(),
            remainder: RemainderPolicy::Distribute,
        }
    }

    /// Marks float parameters as bipolar.
    pub fn with_bipolar<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.bipolar.extend(names.into_iter().map(Into::into));
        self
    }

    /// Sets the step delay.
    pub fn with_step_delay(mut self, seconds: f32) -> Self {
        self.step_delay = seconds;
        self
    }

    /// Enables or disables change detection.
    pub fn with_change_detection(mut self, enabled: bool) -> Self {
        self.change_detection = enabled;
        self
    }

    /// Sets the retention option.
    pub fn with_retention(mut self, retention: RetentionOption) -> Self {
        self.retention = retention;
        self
    }

    /// Sets the asset storage path.
    pub fn with_storage_path(mut self, path: impl Into<String>) -> Self {
        self.storage_path = path.into();
        self
    }

    /// Sets the remainder policy.
    pub fn with_remainder(mut self, policy: RemainderPolicy) -> Self {
        self.remainder = policy;
        self
    }
}

/// Returns `true` if the graph already carries a generated layer.
pub fn is_installed(graph: &ControllerGraph) -> bool {
    graph.layers().any(|l| {
        l.is(ArtifactCategory::SyncLayer) || l.is(ArtifactCategory::ExpressionLayer)
    })
}

/// Immutable snapshot of everything an install reads.
#[derive(Debug, Clone, PartialEq)]
pub struct InstallContext {
    request: InstallRequest,
    params: Vec<Parameter>,
    host_kinds: BTreeMap<String, ChannelKind>,
    param_costs: BTreeMap<String, u32>,
    detected_retention: Option<bool>,
    taken_names: BTreeSet<String>,
    batch: BatchId,
    used_bits: u32,
    budget_bits: u32,
}

impl InstallContext {
    /// Validates `request` and captures the state it depends on.
    pub fn capture(
        request: &InstallRequest,
        table: &ParamTable,
        graph: &ControllerGraph,
    ) -> Result<Self, InstallError> {
        if request.step_count == 0 {
            return Err(InstallError::InvalidStepCount(request.step_count));
        }
        if !(request.step_delay.is_finite() && request.step_delay > 0.0) {
            return Err(InstallError::InvalidStepDelay(request.step_delay));
        }
        if request.parameters.is_empty() {
            return Err(InstallError::NoParameters);
        }

        let mut seen = BTreeSet::new();
        let mut params = Vec::with_capacity(request.parameters.len());
        let mut param_costs = BTreeMap::new();
        for name in &request.parameters {
            if !seen.insert(name.as_str()) {
                return Err(InstallError::DuplicateParameter(name.clone()));
            }
            let entry = table
                .get(name)
                .ok_or_else(|| InstallError::UnknownParameter(name.clone()))?;
            if !entry.synced {
                return Err(InstallError::ParameterNotSynced(name.clone()));
            }
            let mut param = Parameter::new(name.clone(), entry.kind);
            if request.bipolar.contains(name) {
                param = param.bipolar();
            }
            param_costs.insert(name.clone(), entry.cost_bits());
            params.push(param);
        }
        for name in &request.bipolar {
            match params.iter().find(|p| &p.name == name) {
                Some(p) if p.kind == ParamKind::Float => {}
                _ => return Err(InstallError::BipolarNotFloat(name.clone())),
            }
        }

        let host_kinds = params
            .iter()
            .filter_map(|p| graph.channel(&p.name).map(|c| (p.name.clone(), c.kind)))
            .collect();
        let table_batch = table
            .generated()
            .filter_map(|e| e.marker)
            .map(|m| m.batch.next())
            .max()
            .unwrap_or(BatchId(1));

        Ok(Self {
            request: request.clone(),
            params,
            host_kinds,
            param_costs,
            detected_retention: detect_convention(graph),
            taken_names: graph
                .channels()
                .map(|c| c.name.clone())
                .chain(table.entries().map(|e| e.name.clone()))
                .collect(),
            batch: graph.next_batch().max(table_batch),
            used_bits: table.used_bits(),
            budget_bits: table.budget_bits,
        })
    }

    /// Batch the install will mark its artifacts with.
    pub fn batch(&self) -> BatchId {
        self.batch
    }
}

/// Summary of an install, planned or committed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InstallReport {
    /// Marker batch.
    pub batch: BatchId,
    /// Step count.
    pub steps: usize,
    /// Address channel names, LSB first.
    pub address_channels: Vec<String>,
    /// Data channel names, bool family first.
    pub data_channels: Vec<String>,
    /// Parameter names per bucket.
    pub buckets: Vec<Vec<String>>,
    /// Parameters with change detection.
    pub accelerated: Vec<String>,
    /// Parameters the change-detection pipeline rejected.
    pub skipped: Vec<String>,
    /// Parameters left out of every bucket.
    pub unassigned: Vec<String>,
    /// Retention flag applied to every synthesized node.
    pub retain_defaults: bool,
    /// Nodes in the sync layer.
    pub node_count: usize,
    /// Synced bits after the install.
    pub required_bits: u32,
    /// Table budget.
    pub budget_bits: u32,
}

/// Fully synthesized install, ready to commit.
#[derive(Debug, Clone, PartialEq)]
pub struct InstallPlan {
    report: InstallReport,
    allocation: Allocation,
    layers: Vec<Layer>,
    channels: Vec<Channel>,
    table_entries: Vec<TableEntry>,
    motions: Vec<Motion>,
    absorbed: Vec<String>,
}

impl InstallPlan {
    /// Runs the synthesis pipeline against a captured context.
    pub fn build(ctx: &InstallContext) -> Result<Self, InstallError> {
        let request = &ctx.request;
        let batch = ctx.batch;
        let mark = |category| Marker::new(category, batch);

        let indexer = BinaryIndexer::new(request.step_count);
        let allocation = allocate(&ctx.params, request.step_count, request.remainder)?;
        if allocation.assigned().next().is_none() {
            return Err(InstallError::NothingAssigned {
                steps: request.step_count,
                count: ctx.params.len(),
            });
        }

        let differentials = request.change_detection.then(|| {
            let assigned: Vec<Parameter> = allocation.assigned().cloned().collect();
            DifferentialPlan::build(&assigned, &ctx.host_kinds)
        });
        let routing = differentials
            .as_ref()
            .filter(|d| !d.signals().is_empty())
            .map(|d| ChangeRouting::new(&allocation, d));

        let mut sync = synthesize(&indexer, request.step_delay, routing.as_ref())?;
        let attached =
            SideEffectPlan::build(&indexer, &allocation, differentials.as_ref()).attach(&mut sync)?;
        attached.append_smoothing(&mut sync)?;

        let retain_defaults = resolve(request.retention, ctx.detected_retention);
        sync.machine.set_retain_defaults(retain_defaults);
        let node_count = sync.machine.node_count();

        let mut layers = vec![
            Layer::state_machine(naming::SYNC_LAYER, sync.machine)
                .marked(mark(ArtifactCategory::SyncLayer)),
        ];
        if let Some(d) = differentials.as_ref().filter(|d| !d.signals().is_empty()) {
            layers.push(
                Layer::expressions(naming::EXPRESSION_LAYER, d.expressions())
                    .marked(mark(ArtifactCategory::ExpressionLayer)),
            );
        }

        // Synced transport channels: address bits, then data channels.
        let address_channels = indexer.channel_names();
        let mut transport: Vec<(String, ParamKind, ArtifactCategory)> = address_channels
            .iter()
            .map(|n| (n.clone(), ParamKind::Bool, ArtifactCategory::AddressChannel))
            .collect();
        let mut data_channels = Vec::new();
        for family in allocation.families() {
            let kind = match family.family() {
                Family::Bool => ParamKind::Bool,
                Family::Numeric => ParamKind::Int,
            };
            for name in family.channel_names() {
                data_channels.push(name.clone());
                transport.push((name, kind, ArtifactCategory::DataChannel));
            }
        }

        let mut channels: Vec<Channel> = transport
            .iter()
            .map(|(name, kind, category)| {
                Channel::new(name.clone(), ChannelKind::from(*kind)).marked(mark(*category))
            })
            .collect();
        if let Some(d) = &differentials {
            channels.extend(d.channels(batch));
        }
        let table_entries: Vec<TableEntry> = transport
            .into_iter()
            .map(|(name, kind, category)| {
                let mut entry = TableEntry::new(name, kind);
                entry.marker = Some(mark(category));
                entry
            })
            .collect();

        let generated_names = channels
            .iter()
            .map(|c| &c.name)
            .chain(table_entries.iter().map(|e| &e.name));
        for name in generated_names {
            if ctx.taken_names.contains(name) {
                return Err(InstallError::NameTaken(name.clone()));
            }
        }

        let motions: Vec<Motion> = [
            (naming::ONE_TICK_MOTION, TICK_SECONDS),
            (naming::ONE_SECOND_MOTION, ONE_SECOND),
        ]
        .into_iter()
        .map(|(name, duration_secs)| Motion {
            name: name.to_owned(),
            duration_secs,
            asset_path: naming::motion_asset_path(&request.storage_path, name),
            marker: Some(mark(ArtifactCategory::TimingAnchor)),
        })
        .collect();

        let absorbed: Vec<String> = allocation.assigned().map(|p| p.name.clone()).collect();
        let released: u32 = absorbed
            .iter()
            .filter_map(|n| ctx.param_costs.get(n))
            .sum();
        let added: u32 = table_entries.iter().map(TableEntry::cost_bits).sum();
        let required_bits = ctx.used_bits.saturating_sub(released) + added;
        if required_bits > ctx.budget_bits {
            return Err(InstallError::BudgetExceeded {
                required: required_bits,
                budget: ctx.budget_bits,
            });
        }

        let buckets: Vec<Vec<String>> = (0..allocation.steps())
            .map(|step| {
                allocation
                    .bucket(step)
                    .into_iter()
                    .map(|(p, _)| p.name.clone())
                    .collect()
            })
            .collect();
        let (accelerated, skipped): (Vec<String>, Vec<String>) = match &differentials {
            Some(d) => (
                d.signals().iter().map(|s| s.param.clone()).collect(),
                d.rejected().iter().map(|e| e.name().to_owned()).collect(),
            ),
            None => (Vec::new(), Vec::new()),
        };

        let report = InstallReport {
            batch,
            steps: request.step_count,
            address_channels,
            data_channels,
            buckets,
            accelerated,
            skipped,
            unassigned: allocation.unassigned().map(|p| p.name.clone()).collect(),
            retain_defaults,
            node_count,
            required_bits,
            budget_bits: ctx.budget_bits,
        };

        Ok(Self {
            report,
            allocation,
            layers,
            channels,
            table_entries,
            motions,
            absorbed,
        })
    }

    /// Summary of what [`commit`](Self::commit) would do.
    pub fn report(&self) -> &InstallReport {
        &self.report
    }

    /// Bucket layout.
    pub fn allocation(&self) -> &Allocation {
        &self.allocation
    }

    /// Layers to be added, sync layer first.
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    /// Channels to be added.
    pub fn channels(&self) -> &[Channel] {
        &self.channels
    }

    /// Writes the plan into the graph and the table.
    pub fn commit(self, table: &mut ParamTable, graph: &mut ControllerGraph) -> InstallReport {
        graph.add_channel_if_absent(Channel::new(naming::IS_LOCAL, ChannelKind::Bool));
        for motion in self.motions {
            if graph.motion(&motion.name).is_none() {
                tracing::info!("creating timing anchor '{}' at {}", motion.name, motion.asset_path);
            }
            graph.add_motion_if_absent(motion);
        }
        for channel in self.channels {
            if !graph.add_channel_if_absent(channel.clone()) {
                tracing::warn!("channel '{}' already exists, reusing it", channel.name);
            }
        }
        for layer in self.layers {
            graph.add_layer(layer);
        }
        for entry in self.table_entries {
            table.add_if_absent(entry);
        }
        for name in &self.absorbed {
            table.set_synced(name, false);
        }
        for name in &self.report.unassigned {
            tracing::warn!("'{name}' was not multiplexed and keeps syncing directly");
        }

        tracing::info!(
            "installed {} parameters over {} steps ({}), {} of {} bits synced",
            self.absorbed.len(),
            self.report.steps,
            self.report.batch,
            self.report.required_bits,
            self.report.budget_bits
        );
        self.report
    }
}

/// Installs the multiplexer described by `request`.
///
/// Rejected with [`InstallError::AlreadyInstalled`] if the graph already
/// carries generated layers. All validation and synthesis happens before the
/// first mutation.
pub fn install(
    request: &InstallRequest,
    table: &mut ParamTable,
    graph: &mut ControllerGraph,
) -> Result<InstallReport, InstallError> {
    if is_installed(graph) {
        return Err(InstallError::AlreadyInstalled);
    }
    let ctx = InstallContext::capture(request, table, graph)?;
    let plan = InstallPlan::build(&ctx)?;
    Ok(plan.commit(table, graph))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture() -> (ParamTable, ControllerGraph) {
        let mut table = ParamTable::default();
        let mut graph = ControllerGraph::new();
        for (name, kind) in [
            ("Hat", ParamKind::Bool),
            ("Coat", ParamKind::Bool),
            ("Outfit", ParamKind::Int),
            ("Hue", ParamKind::Float),
        ] {
            table.add_if_absent(TableEntry::new(name, kind));
            graph.add_channel_if_absent(Channel::new(name, ChannelKind::from(kind)));
        }
        (table, graph)
    }

    #[test]
    fn capture_rejects_bad_requests() {
        let (table, graph) = fixture();
        let capture = |r: &InstallRequest| InstallContext::capture(r, &table, &graph);

        assert_eq!(
            capture(&InstallRequest::new(["Hat"], 0)),
            Err(InstallError::InvalidStepCount(0))
        );
        assert_eq!(
            capture(&InstallRequest::new(["Hat"], 2).with_step_delay(0.0)),
            Err(InstallError::InvalidStepDelay(0.0))
        );
        assert_eq!(
            capture(&InstallRequest::new(["Hat", "Hat"], 2)),
            Err(InstallError::DuplicateParameter("Hat".into()))
        );
        assert_eq!(
            capture(&InstallRequest::new(["Nope"], 2)),
            Err(InstallError::UnknownParameter("Nope".into()))
        );
        assert_eq!(
            capture(&InstallRequest::new(["Hat"], 2).with_bipolar(["Hat"])),
            Err(InstallError::BipolarNotFloat("Hat".into()))
        );
    }

    #[test]
    fn unsynced_parameters_are_rejected() {
        let (mut table, graph) = fixture();
        table.set_synced("Coat", false);
        assert_eq!(
            InstallContext::capture(&InstallRequest::new(["Coat"], 1), &table, &graph),
            Err(InstallError::ParameterNotSynced("Coat".into()))
        );
    }

    #[test]
    fn budget_is_checked_before_commit() {
        let (table, graph) = fixture();
        let mut tight = table.clone();
        tight.budget_bits = 4;
        let request = InstallRequest::new(["Hat", "Coat", "Outfit", "Hue"], 2);
        let ctx = InstallContext::capture(&request, &tight, &graph).unwrap();
        // 1 address bit + 1 bool channel + 1 numeric channel = 10 bits.
        assert_eq!(
            InstallPlan::build(&ctx),
            Err(InstallError::BudgetExceeded {
                required: 10,
                budget: 4
            })
        );
    }

    #[test]
    fn host_channel_with_a_generated_name_is_rejected() {
        let (mut table, mut graph) = fixture();
        let taken = naming::bool_data_channel(0);
        graph.add_channel_if_absent(Channel::new(taken.clone(), ChannelKind::Bool));
        let before = (table.clone(), graph.clone());

        assert_eq!(
            install(&InstallRequest::new(["Hat", "Coat"], 2), &mut table, &mut graph),
            Err(InstallError::NameTaken(taken))
        );
        assert_eq!((table, graph), before);
    }

    #[test]
    fn table_entry_with_a_generated_name_is_rejected() {
        let (table, graph) = fixture();
        let taken = naming::address_channel(1);
        let table =
            table.with_entry(TableEntry::new(taken.clone(), ParamKind::Bool).with_synced(false));
        let request = InstallRequest::new(["Hat", "Coat"], 2);
        let ctx = InstallContext::capture(&request, &table, &graph).unwrap();
        assert_eq!(InstallPlan::build(&ctx), Err(InstallError::NameTaken(taken)));
    }

    #[test]
    fn plan_does_not_mutate() {
        let (table, graph) = fixture();
        let request = InstallRequest::new(["Hat", "Coat"], 2).with_change_detection(true);
        let ctx = InstallContext::capture(&request, &table, &graph).unwrap();
        let plan = InstallPlan::build(&ctx).unwrap();
        assert_eq!(plan.layers().len(), 2);
        assert_eq!(plan.report().accelerated, ["Hat", "Coat"]);
        assert!(!is_installed(&graph));
        assert!(table.get("Hat").unwrap().synced);
    }

    #[test]
    fn install_clears_sync_flags_and_marks_layers() {
        let (mut table, mut graph) = fixture();
        let request = InstallRequest::new(["Hat", "Coat", "Outfit", "Hue"], 2);
        let report = install(&request, &mut table, &mut graph).unwrap();

        assert_eq!(report.batch, BatchId(1));
        assert_eq!(report.address_channels, [naming::address_channel(1)]);
        assert!(is_installed(&graph));
        for name in ["Hat", "Coat", "Outfit", "Hue"] {
            assert!(!table.get(name).unwrap().synced, "{name} still synced");
        }
        assert_eq!(table.used_bits(), report.required_bits);
        assert_eq!(
            install(&request, &mut table, &mut graph),
            Err(InstallError::AlreadyInstalled)
        );
    }

    #[test]
    fn timing_anchors_use_storage_path() {
        let (mut table, mut graph) = fixture();
        let request = InstallRequest::new(["Hat"], 1).with_storage_path("Assets/Mux");
        install(&request, &mut table, &mut graph).unwrap();
        let anchor = graph.motion(naming::ONE_SECOND_MOTION).unwrap();
        assert_eq!(anchor.asset_path, "Assets/Mux/GeneratedAssets/Mux_OneSecBuffer.anim");
        assert_eq!(anchor.duration_secs, 1.0);
    }
}
