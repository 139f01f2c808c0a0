//! Records written for every stored run.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub type RunId = String;

/// Summary of a finished heat-up, written last when a run is saved.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunManifest {
    pub run_id: RunId,
    pub scenario_id: String,
    pub scenario_name: String,
    /// RFC 3339 wall-clock time the run was saved
    pub timestamp: String,
    pub solver_version: String,
    pub dt_s: f64,
    pub t_end_s: f64,
    pub ticks: u64,
    /// `Regime/BubblePhase` at the last committed tick
    pub final_mode: String,
    pub alarms: AlarmTotals,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub forensics_dumps: Vec<ForensicsDumpEntry>,
}

/// Rising edges seen over the run, per alarm.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct AlarmTotals {
    pub conservation: u64,
    pub non_convergence: u64,
    pub invariant: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ForensicsDumpEntry {
    pub trigger: String,
    pub tick: u64,
    pub sim_time_s: f64,
    /// CSV path, or `memory:<file>` for dumps kept in process
    pub location: String,
}

/// Telemetry sample flattened to named scalars, one per decimation step.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TelemetryRecord {
    pub tick: u64,
    pub time_s: f64,
    pub regime: String,
    pub bubble_phase: String,
    pub values: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EventRecord {
    pub tick: u64,
    pub sim_time_s: f64,
    pub severity: String,
    pub message: String,
}
