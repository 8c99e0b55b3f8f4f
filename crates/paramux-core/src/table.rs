//! The externally-synchronized parameter table.
//!
//! The table lists every parameter the host replicates over the network, each
//! with a kind and a "network-synchronized" flag. Synced entries consume bits
//! from a finite transmission budget; multiplexing exists to fit more
//! parameters into that budget.

use serde::{Deserialize, Serialize};

use crate::kind::ParamKind;
use crate::marker::{BatchId, Marker};

/// Default transmission budget in bits.
pub const DEFAULT_BUDGET_BITS: u32 = 256;

fn default_budget() -> u32 {
    DEFAULT_BUDGET_BITS
}

fn default_synced() -> bool {
    true
}

/// One entry of the parameter table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableEntry {
    /// Parameter name.
    pub name: String,
    /// Network kind.
    pub kind: ParamKind,
    /// Default value.
    #[serde(default)]
    pub default: f32,
    /// Whether the entry is replicated over the network.
    #[serde(default = "default_synced")]
    pub synced: bool,
    /// Set on entries created by an install.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub marker: Option<Marker>,
}

impl TableEntry {
    /// Creates a synced, unmarked entry with a zero default.
    pub fn new(name: impl Into<String>, kind: ParamKind) -> Self {
        Self {
            name: name.into(),
            kind,
            default: 0.0,
            synced: true,
            marker: None,
        }
    }

    /// Sets the synced flag.
    pub fn with_synced(mut self, synced: bool) -> Self {
        self.synced = synced;
        self
    }

    /// Bits this entry consumes from the budget (zero when not synced).
    pub fn cost_bits(&self) -> u32 {
        if self.synced {
            self.kind.profile().cost_bits
        } else {
            0
        }
    }
}

/// Parameter table with a transmission budget.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamTable {
    /// Maximum number of synced bits.
    #[serde(default = "default_budget")]
    pub budget_bits: u32,
    /// Entries in declaration order.
    #[serde(default, rename = "parameters")]
    entries: Vec<TableEntry>,
}

impl Default for ParamTable {
    fn default() -> Self {
        Self::new(DEFAULT_BUDGET_BITS)
    }
}

impl ParamTable {
    /// Creates an empty table with the given budget.
    pub fn new(budget_bits: u32) -> Self {
        Self {
            budget_bits,
            entries: Vec::new(),
        }
    }

    /// Appends an entry (builder form).
    pub fn with_entry(mut self, entry: TableEntry) -> Self {
        self.entries.push(entry);
        self
    }

    /// Looks up an entry by name.
    pub fn get(&self, name: &str) -> Option<&TableEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    /// Looks up an entry by name, mutably.
    pub fn get_mut(&mut self, name: &str) -> Option<&mut TableEntry> {
        self.entries.iter_mut().find(|e| e.name == name)
    }

    /// Iterates over all entries.
    pub fn entries(&self) -> impl Iterator<Item = &TableEntry> {
        self.entries.iter()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the table has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total bits consumed by synced entries.
    pub fn used_bits(&self) -> u32 {
        self.entries.iter().map(TableEntry::cost_bits).sum()
    }

    /// Adds `entry` unless an entry with the same name exists.
    ///
    /// Returns `true` if the entry was added.
    pub fn add_if_absent(&mut self, entry: TableEntry) -> bool {
        if self.get(&entry.name).is_some() {
            return false;
        }
        self.entries.push(entry);
        true
    }

    /// Sets the synced flag of `name`. Returns `false` if there is no such entry.
    pub fn set_synced(&mut self, name: &str, synced: bool) -> bool {
        match self.get_mut(name) {
            Some(entry) => {
                entry.synced = synced;
                true
            }
            None => false,
        }
    }

    /// Entries carrying any marker.
    pub fn generated(&self) -> impl Iterator<Item = &TableEntry> {
        self.entries.iter().filter(|e| e.marker.is_some())
    }

    /// Removes every entry marked with `batch`, returning their names.
    pub fn remove_batch(&mut self, batch: BatchId) -> Vec<String> {
        let mut removed = Vec::new();
        self.entries.retain(|e| match e.marker {
            Some(marker) if marker.in_batch(batch) => {
                removed.push(e.name.clone());
                false
            }
            _ => true,
        });
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::marker::ArtifactCategory;

    #[test]
    fn used_bits_counts_only_synced() {
        let table = ParamTable::default()
            .with_entry(TableEntry::new("a", ParamKind::Bool))
            .with_entry(TableEntry::new("b", ParamKind::Float))
            .with_entry(TableEntry::new("c", ParamKind::Int).with_synced(false));
        assert_eq!(table.used_bits(), 9);
    }

    #[test]
    fn add_if_absent_is_idempotent() {
        let mut table = ParamTable::default();
        assert!(table.add_if_absent(TableEntry::new("a", ParamKind::Bool)));
        assert!(!table.add_if_absent(TableEntry::new("a", ParamKind::Int)));
        assert_eq!(table.len(), 1);
        assert_eq!(table.get("a").map(|e| e.kind), Some(ParamKind::Bool));
    }

    #[test]
    fn remove_batch_keeps_other_entries() {
        let batch = BatchId(3);
        let mut marked = TableEntry::new("Mux_Indexer 1", ParamKind::Bool);
        marked.marker = Some(Marker::new(ArtifactCategory::AddressChannel, batch));
        let mut table = ParamTable::default()
            .with_entry(TableEntry::new("user", ParamKind::Bool))
            .with_entry(marked);

        let removed = table.remove_batch(batch);
        assert_eq!(removed, vec!["Mux_Indexer 1".to_string()]);
        assert_eq!(table.len(), 1);
        assert!(table.get("user").is_some());
    }
}
