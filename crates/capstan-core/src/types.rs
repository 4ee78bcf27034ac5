//! Domain types for the capstan engine.
//!
//! Machines and workloads are snapshots owned by the inventory client;
//! reservation specs and statuses are the desired/observed halves of a
//! metric gauge. Every collection is a BTree map or set so that status
//! iteration is deterministic and re-evaluating an unchanged snapshot
//! yields byte-identical output.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::quantity::Quantity;
use crate::selector::Selector;

/// Unique identifier of a machine in the cluster.
pub type MachineId = String;

/// Unique identifier of a workload (namespace-scoped).
pub type WorkloadId = String;

/// Discriminator for the reserved-capacity producer variant.
pub const RESERVED_CAPACITY: &str = "reserved_capacity";

// ── Machine ───────────────────────────────────────────────────────

/// A cluster member with labeled identity and allocatable capacity.
///
/// Immutable per evaluation cycle; owned by the inventory client.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Machine {
    pub id: MachineId,
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
    /// Allocatable capacity per resource dimension.
    #[serde(default)]
    pub allocatable: BTreeMap<String, Quantity>,
    /// Ready condition reported by the machine.
    #[serde(default = "default_true")]
    pub ready: bool,
    /// False when the machine is cordoned off from new workloads.
    #[serde(default = "default_true")]
    pub schedulable: bool,
}

// ── Workload ──────────────────────────────────────────────────────

/// A unit of demand consuming resources on at most one bound machine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Workload {
    pub id: WorkloadId,
    pub namespace: String,
    /// Bound machine, absent while the workload is pending.
    #[serde(default)]
    pub machine: Option<MachineId>,
    /// Resource requests per dimension.
    #[serde(default)]
    pub requests: BTreeMap<String, Quantity>,
}

// ── Reservation ───────────────────────────────────────────────────

/// Desired state of a reserved-capacity gauge: which machines are in
/// scope and which resource dimensions to track.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReservationSpec {
    pub selector: Selector,
    pub dimensions: BTreeSet<String>,
}

impl ReservationSpec {
    /// Reject specs that can never produce a meaningful status.
    pub fn validate(&self) -> Result<(), String> {
        if self.dimensions.is_empty() {
            return Err("tracked dimension set is empty".to_string());
        }
        for (key, _) in self.selector.iter() {
            if key.is_empty() {
                return Err("selector contains an empty label key".to_string());
            }
        }
        Ok(())
    }
}

/// Spec of one metric gauge, tagged by the producer variant that
/// computes it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "producer", rename_all = "snake_case")]
pub enum ProducerSpec {
    ReservedCapacity(ReservationSpec),
}

impl ProducerSpec {
    /// Discriminator used for factory resolution.
    pub fn kind(&self) -> &'static str {
        match self {
            ProducerSpec::ReservedCapacity(_) => RESERVED_CAPACITY,
        }
    }
}

/// Formatted per-dimension reservation strings.
///
/// Replaced wholesale on every successful evaluation, never partially
/// updated; after success its key set equals the tracked dimension set.
pub type ReservationStatus = BTreeMap<String, String>;

fn default_true() -> bool {
    true
}
