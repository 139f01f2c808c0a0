//! Read-only telemetry snapshots.
//!
//! The publisher keeps the latest snapshot; readers get copies and never
//! a reference into the tick's working state.

use crate::alarms::{AlarmCounters, AlarmFlags};
use crate::config::MAX_SG_NODES;
use crate::error::SimResult;
use crate::sg::SgRegime;
use crate::state::{BoundaryAccumulators, BubblePhase, PlantRegime};
use pw_controls::{SampleClock, SampleConfig};
use serde::Serialize;

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct ClosureSummary {
    pub converged: bool,
    pub iterations: u32,
    pub volume_residual_ft3: f32,
    pub energy_residual_btu: f32,
    pub pattern: &'static str,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct TelemetrySnapshot {
    pub tick: u64,
    pub sim_time_s: f64,
    pub regime: PlantRegime,
    pub bubble_phase: BubblePhase,

    pub total_mass_lb: f64,
    pub rcs_water_mass_lb: f64,
    pub pzr_water_mass_lb: f64,
    pub pzr_steam_mass_lb: f64,
    pub drift_lb: f64,
    pub boundary: BoundaryAccumulators,
    pub rcs_energy_btu: f64,
    pub pzr_energy_btu: f64,

    pub pressure_psia: f64,
    pub pressure_setpoint_psia: f64,
    pub rcs_temp_f: f64,
    pub pzr_temp_f: f64,
    pub tsat_f: f64,
    pub subcooling_margin_f: f64,
    pub pzr_level_pct: f64,
    pub level_setpoint_pct: f64,

    pub heater_mw: f64,
    pub spray_lbps: f64,
    pub charging_lbps: f64,
    pub letdown_lbps: f64,
    pub seal_leakoff_lbps: f64,
    pub relief_lbps: f64,
    pub rcps_running: u8,

    pub sg_heat_mw: f64,
    pub sg_regime: SgRegime,
    pub sg_pressure_psia: f64,
    pub sg_node_count: u8,
    pub sg_node_temp_f: [f32; MAX_SG_NODES],
    pub sg_node_blend: [f32; MAX_SG_NODES],

    pub alarms: AlarmFlags,
    pub alarm_counts: AlarmCounters,
    pub closure: ClosureSummary,
}

impl TelemetrySnapshot {
    /// Scalars available through `scalar`.
    pub const SCALARS: [&'static str; 18] = [
        "sim_time_s",
        "total_mass_lb",
        "rcs_water_mass_lb",
        "pzr_water_mass_lb",
        "pzr_steam_mass_lb",
        "drift_lb",
        "pressure_psia",
        "rcs_temp_f",
        "pzr_temp_f",
        "tsat_f",
        "subcooling_margin_f",
        "pzr_level_pct",
        "heater_mw",
        "sg_heat_mw",
        "sg_pressure_psia",
        "charging_lbps",
        "letdown_lbps",
        "rcps_running",
    ];

    /// Look up a scalar by field name, for series export.
    pub fn scalar(&self, name: &str) -> Option<f64> {
        let v = match name {
            "sim_time_s" => self.sim_time_s,
            "total_mass_lb" => self.total_mass_lb,
            "rcs_water_mass_lb" => self.rcs_water_mass_lb,
            "pzr_water_mass_lb" => self.pzr_water_mass_lb,
            "pzr_steam_mass_lb" => self.pzr_steam_mass_lb,
            "drift_lb" => self.drift_lb,
            "pressure_psia" => self.pressure_psia,
            "rcs_temp_f" => self.rcs_temp_f,
            "pzr_temp_f" => self.pzr_temp_f,
            "tsat_f" => self.tsat_f,
            "subcooling_margin_f" => self.subcooling_margin_f,
            "pzr_level_pct" => self.pzr_level_pct,
            "heater_mw" => self.heater_mw,
            "sg_heat_mw" => self.sg_heat_mw,
            "sg_pressure_psia" => self.sg_pressure_psia,
            "charging_lbps" => self.charging_lbps,
            "letdown_lbps" => self.letdown_lbps,
            "rcps_running" => self.rcps_running as f64,
            _ => return None,
        };
        Some(v)
    }
}

/// Publishes snapshots at a fixed rate in simulated time.
#[derive(Clone, Debug)]
pub struct TelemetryPublisher {
    clock: SampleClock,
    latest: Option<TelemetrySnapshot>,
    published: u64,
}

impl TelemetryPublisher {
    pub fn new(rate_hz: f64, start_time_s: f64) -> SimResult<Self> {
        Ok(Self {
            clock: SampleClock::new(SampleConfig::from_frequency(rate_hz)?, start_time_s),
            latest: None,
            published: 0,
        })
    }

    /// Whether a publish is due at `time_s`; advances the clock if so.
    pub fn due(&mut self, time_s: f64) -> bool {
        self.clock.poll(time_s)
    }

    pub fn publish(&mut self, snapshot: TelemetrySnapshot) {
        self.latest = Some(snapshot);
        self.published += 1;
    }

    pub fn latest(&self) -> Option<TelemetrySnapshot> {
        self.latest
    }

    pub fn published(&self) -> u64 {
        self.published
    }
}
