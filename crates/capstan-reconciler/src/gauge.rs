//! Observable gauge state.

use serde::{Deserialize, Serialize};

use capstan_core::ReservationStatus;

/// Lifecycle phase of a gauge's most recent evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GaugePhase {
    /// Created, not yet evaluated.
    Pending,
    /// An evaluation is in flight.
    Evaluating,
    /// The last evaluation succeeded.
    Ready,
    /// The last evaluation failed; `status` still holds the last valid
    /// result.
    Failed,
}

/// Observable state of one gauge.
///
/// `ready` is distinct from `status`: a failed evaluation leaves the last
/// valid status in place with `ready = false`, so consumers can tell
/// "stale but previously valid" from "currently valid".
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GaugeState {
    pub phase: GaugePhase,
    pub ready: bool,
    pub status: ReservationStatus,
    pub last_error: Option<String>,
    /// Completed evaluations, successful or not.
    pub evaluations: u64,
}

impl GaugeState {
    pub fn new() -> Self {
        Self {
            phase: GaugePhase::Pending,
            ready: false,
            status: ReservationStatus::new(),
            last_error: None,
            evaluations: 0,
        }
    }
}

impl Default for GaugeState {
    fn default() -> Self {
        Self::new()
    }
}
