//! Bucket allocation.
//!
//! Parameters are split into one bucket per synchronization step. Booleans
//! and numerics are allocated independently because they travel through
//! disjoint data-channel families. Within a family, the parameter at position
//! `p` of its bucket rides on data channel `p`, which every bucket reuses.
//!
//! How a count that does not divide evenly by the step count is handled is
//! chosen by a [`RemainderPolicy`].

use serde::{Deserialize, Serialize};

use crate::kind::{Family, Parameter};
use crate::naming;

/// What to do with parameters that do not fill whole buckets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemainderPolicy {
    /// Balanced buckets: the first `count % steps` buckets hold one extra
    /// parameter. Every parameter is assigned.
    #[default]
    Distribute,
    /// Floor-sized buckets. Parameters past `size * steps` stay unassigned
    /// and keep syncing directly.
    Truncate,
    /// Fail unless every family divides evenly by the step count.
    Reject,
}

impl RemainderPolicy {
    /// Name used in logs and reports.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Distribute => "distribute",
            Self::Truncate => "truncate",
            Self::Reject => "reject",
        }
    }
}

/// Errors raised by [`allocate`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AllocationError {
    /// The step count was zero.
    #[error("step count must be at least 1")]
    ZeroSteps,
    /// A family's parameter count is not a multiple of the step count.
    #[error("{count} {family:?} parameters cannot be split evenly into {steps} steps")]
    Indivisible {
        /// Family that failed to divide.
        family: Family,
        /// Number of parameters in that family.
        count: usize,
        /// Requested step count.
        steps: usize,
    },
}

/// Where a parameter lives: its bucket and its position inside the bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Slot {
    /// Bucket (step) index.
    pub step: usize,
    /// Position within the bucket, which is also the data-channel index.
    pub position: usize,
}

/// Allocation of one channel family.
#[derive(Debug, Clone, PartialEq)]
pub struct FamilyAllocation {
    family: Family,
    buckets: Vec<Vec<Parameter>>,
    unassigned: Vec<Parameter>,
}

impl FamilyAllocation {
    fn build(
        family: Family,
        params: Vec<Parameter>,
        steps: usize,
        policy: RemainderPolicy,
    ) -> Result<Self, AllocationError> {
        let count = params.len();
        let base = count / steps;
        let extra = count % steps;

        if policy == RemainderPolicy::Reject && extra != 0 {
            return Err(AllocationError::Indivisible {
                family,
                count,
                steps,
            });
        }

        let mut remaining = params.into_iter();
        let mut buckets = Vec::with_capacity(steps);
        for step in 0..steps {
            let size = match policy {
                RemainderPolicy::Distribute => base + usize::from(step < extra),
                RemainderPolicy::Truncate | RemainderPolicy::Reject => base,
            };
            buckets.push(remaining.by_ref().take(size).collect());
        }
        let unassigned: Vec<Parameter> = remaining.collect();

        for param in &unassigned {
            tracing::warn!(
                "allocate: '{}' left unassigned ({} {family:?} parameters over {steps} steps)",
                param.name,
                count
            );
        }

        Ok(Self {
            family,
            buckets,
            unassigned,
        })
    }

    /// Channel family.
    pub fn family(&self) -> Family {
        self.family
    }

    /// Buckets in step order.
    pub fn buckets(&self) -> &[Vec<Parameter>] {
        &self.buckets
    }

    /// Parameters of bucket `step` (empty past the last step).
    pub fn bucket(&self, step: usize) -> &[Parameter] {
        self.buckets.get(step).map_or(&[], Vec::as_slice)
    }

    /// Parameters left out of every bucket.
    pub fn unassigned(&self) -> &[Parameter] {
        &self.unassigned
    }

    /// All assigned parameters, in bucket order.
    pub fn assigned(&self) -> impl Iterator<Item = &Parameter> {
        self.buckets.iter().flatten()
    }

    /// Number of data channels the family needs: the largest bucket size.
    pub fn channel_count(&self) -> usize {
        self.buckets.iter().map(Vec::len).max().unwrap_or(0)
    }

    /// Name of the data channel for bucket position `position`.
    pub fn channel_name(&self, position: usize) -> String {
        match self.family {
            Family::Bool => naming::bool_data_channel(position),
            Family::Numeric => naming::numeric_data_channel(position),
        }
    }

    /// Names of all data channels of this family.
    pub fn channel_names(&self) -> Vec<String> {
        (0..self.channel_count())
            .map(|p| self.channel_name(p))
            .collect()
    }

    /// Finds the slot of a parameter by name.
    pub fn slot_of(&self, name: &str) -> Option<Slot> {
        self.buckets.iter().enumerate().find_map(|(step, bucket)| {
            bucket
                .iter()
                .position(|p| p.name == name)
                .map(|position| Slot { step, position })
        })
    }
}

/// Bucket layout for both families.
#[derive(Debug, Clone, PartialEq)]
pub struct Allocation {
    steps: usize,
    bools: FamilyAllocation,
    numerics: FamilyAllocation,
}

impl Allocation {
    /// Number of steps.
    pub fn steps(&self) -> usize {
        self.steps
    }

    /// Boolean family.
    pub fn bools(&self) -> &FamilyAllocation {
        &self.bools
    }

    /// Int/float family.
    pub fn numerics(&self) -> &FamilyAllocation {
        &self.numerics
    }

    /// Both families, booleans first.
    pub fn families(&self) -> [&FamilyAllocation; 2] {
        [&self.bools, &self.numerics]
    }

    /// Parameters of bucket `step` paired with their data-channel names.
    pub fn bucket(&self, step: usize) -> Vec<(&Parameter, String)> {
        self.families()
            .into_iter()
            .flat_map(|family| {
                family
                    .bucket(step)
                    .iter()
                    .enumerate()
                    .map(move |(position, param)| (param, family.channel_name(position)))
            })
            .collect()
    }

    /// All assigned parameters.
    pub fn assigned(&self) -> impl Iterator<Item = &Parameter> {
        self.bools.assigned().chain(self.numerics.assigned())
    }

    /// All unassigned parameters.
    pub fn unassigned(&self) -> impl Iterator<Item = &Parameter> {
        self.bools
            .unassigned()
            .iter()
            .chain(self.numerics.unassigned())
    }

    /// Slot of a parameter in whichever family holds it.
    pub fn slot_of(&self, name: &str) -> Option<Slot> {
        self.bools
            .slot_of(name)
            .or_else(|| self.numerics.slot_of(name))
    }
}

/// Partitions `params` into `steps` buckets per family.
///
/// Parameter order is preserved: within a family, buckets are filled
/// greedily in declaration order.
pub fn allocate(
    params: &[Parameter],
    steps: usize,
    policy: RemainderPolicy,
) -> Result<Allocation, AllocationError> {
    if steps == 0 {
        return Err(AllocationError::ZeroSteps);
    }
    let (bools, numerics): (Vec<Parameter>, Vec<Parameter>) = params
        .iter()
        .cloned()
        .partition(|p| p.family() == Family::Bool);

    let allocation = Allocation {
        steps,
        bools: FamilyAllocation::build(Family::Bool, bools, steps, policy)?,
        numerics: FamilyAllocation::build(Family::Numeric, numerics, steps, policy)?,
    };
    tracing::debug!(
        "allocate: {steps} steps, {} bool channels, {} numeric channels ({})",
        allocation.bools.channel_count(),
        allocation.numerics.channel_count(),
        policy.as_str()
    );
    Ok(allocation)
}
