//! Flat per-tick record kept in the forensics ring.

use crate::alarms::AlarmFlags;
use crate::config::MAX_SG_NODES;
use crate::sg::{ClampBypass, SgRegime};
use crate::state::{BubblePhase, PlantRegime};
use pw_solver::ClosureResult;
use std::fmt::Write;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct NodeSample {
    pub temperature_f: f32,
    pub blend: f32,
    pub htc: f32,
    pub area_fraction: f32,
    pub heat_mw: f32,
    pub boiling: bool,
}

/// Everything needed to reconstruct one tick after the fact.
///
/// Plain `Copy` data so writing it into the pre-allocated ring is a copy.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ForensicsSnapshot {
    pub tick: u64,
    pub sim_time_s: f64,
    pub regime: PlantRegime,
    pub bubble_phase: BubblePhase,

    pub total_mass_lb: f64,
    pub initial_mass_lb: f64,
    pub boundary_net_lb: f64,
    pub drift_lb: f64,
    pub rcs_water_mass_lb: f64,
    pub pzr_water_mass_lb: f64,
    pub pzr_steam_mass_lb: f64,
    /// Worst compartment correction made by the accountant this tick
    pub ledger_correction_lb: f64,

    pub charging_net_lb: f64,
    pub letdown_net_lb: f64,
    pub relief_cumulative_lb: f64,
    pub seal_leakoff_net_lb: f64,
    pub makeup_net_lb: f64,

    pub charging_lbps: f64,
    pub letdown_lbps: f64,
    pub seal_leakoff_lbps: f64,
    pub relief_lbps: f64,
    pub spray_lbps: f64,
    pub surge_lb: f64,
    pub surge_energy_btu: f64,

    pub rcs_energy_btu: f64,
    pub pzr_energy_btu: f64,

    pub pressure_psia: f64,
    pub pressure_setpoint_psia: f64,
    pub rcs_temp_f: f64,
    pub pzr_temp_f: f64,
    pub tsat_f: f64,
    pub subcooling_f: f64,
    pub pzr_level_pct: f64,
    pub level_setpoint_pct: f64,
    pub heater_demand: f64,
    pub heater_mw: f64,
    pub rcps_running: u8,

    pub sg_total_mw: f64,
    pub sg_raw_mw: f64,
    pub sg_delta_mw: f64,
    /// Rate of change of absorbed heat [MW/s]
    pub sg_heat_rate_mw_per_s: f64,
    pub sg_clamped: bool,
    pub sg_bypass: Option<ClampBypass>,
    pub sg_regime: SgRegime,
    pub sg_pressure_psia: f64,
    pub sg_tsat_f: f64,
    pub sg_dumped_mw: f64,
    pub node_count: u8,
    pub nodes: [NodeSample; MAX_SG_NODES],

    pub closure: ClosureResult,
    pub alarms: AlarmFlags,
}

/// One CSV cell.
#[derive(Clone, Copy, Debug)]
pub(crate) enum Cell {
    Real(f64),
    Count(u64),
    Flag(bool),
    Tag(&'static str),
}

pub(crate) const CELL_WIDTH: usize = 18;

impl Cell {
    fn write(self, out: &mut String) {
        // writing into a String cannot fail
        let _ = match self {
            Cell::Real(v) => write!(out, "{v:>CELL_WIDTH$.6}"),
            Cell::Count(v) => write!(out, "{v:>CELL_WIDTH$}"),
            Cell::Flag(b) => write!(out, "{:>CELL_WIDTH$}", b as u8),
            Cell::Tag(s) => write!(out, "{s:>CELL_WIDTH$}"),
        };
    }
}

const NODE_COLUMNS: [&str; 6] = ["temp_f", "blend", "htc", "area_frac", "heat_mw", "boiling"];

impl ForensicsSnapshot {
    /// Calls `visit` once per scalar column, in column order.
    fn visit_scalars(&self, mut visit: impl FnMut(&'static str, Cell)) {
        use Cell::*;
        visit("tick", Count(self.tick));
        visit("sim_time_s", Real(self.sim_time_s));
        visit("regime", Tag(self.regime.name()));
        visit("bubble_phase", Tag(self.bubble_phase.name()));
        visit("total_mass_lb", Real(self.total_mass_lb));
        visit("initial_mass_lb", Real(self.initial_mass_lb));
        visit("boundary_net_lb", Real(self.boundary_net_lb));
        visit("drift_lb", Real(self.drift_lb));
        visit("rcs_water_mass_lb", Real(self.rcs_water_mass_lb));
        visit("pzr_water_mass_lb", Real(self.pzr_water_mass_lb));
        visit("pzr_steam_mass_lb", Real(self.pzr_steam_mass_lb));
        visit("ledger_correction_lb", Real(self.ledger_correction_lb));
        visit("charging_net_lb", Real(self.charging_net_lb));
        visit("letdown_net_lb", Real(self.letdown_net_lb));
        visit("relief_cumulative_lb", Real(self.relief_cumulative_lb));
        visit("seal_leakoff_net_lb", Real(self.seal_leakoff_net_lb));
        visit("makeup_net_lb", Real(self.makeup_net_lb));
        visit("charging_lbps", Real(self.charging_lbps));
        visit("letdown_lbps", Real(self.letdown_lbps));
        visit("seal_leakoff_lbps", Real(self.seal_leakoff_lbps));
        visit("relief_lbps", Real(self.relief_lbps));
        visit("spray_lbps", Real(self.spray_lbps));
        visit("surge_lb", Real(self.surge_lb));
        visit("surge_energy_btu", Real(self.surge_energy_btu));
        visit("rcs_energy_btu", Real(self.rcs_energy_btu));
        visit("pzr_energy_btu", Real(self.pzr_energy_btu));
        visit("pressure_psia", Real(self.pressure_psia));
        visit("pressure_setpoint_psia", Real(self.pressure_setpoint_psia));
        visit("rcs_temp_f", Real(self.rcs_temp_f));
        visit("pzr_temp_f", Real(self.pzr_temp_f));
        visit("tsat_f", Real(self.tsat_f));
        visit("subcooling_f", Real(self.subcooling_f));
        visit("pzr_level_pct", Real(self.pzr_level_pct));
        visit("level_setpoint_pct", Real(self.level_setpoint_pct));
        visit("heater_demand", Real(self.heater_demand));
        visit("heater_mw", Real(self.heater_mw));
        visit("rcps_running", Count(self.rcps_running as u64));
        visit("sg_total_mw", Real(self.sg_total_mw));
        visit("sg_raw_mw", Real(self.sg_raw_mw));
        visit("sg_delta_mw", Real(self.sg_delta_mw));
        visit("sg_heat_rate_mw_per_s", Real(self.sg_heat_rate_mw_per_s));
        visit("sg_clamped", Flag(self.sg_clamped));
        visit("sg_bypass", Tag(self.sg_bypass.map_or("none", |b| b.name())));
        visit("sg_regime", Tag(self.sg_regime.name()));
        visit("sg_pressure_psia", Real(self.sg_pressure_psia));
        visit("sg_tsat_f", Real(self.sg_tsat_f));
        visit("sg_dumped_mw", Real(self.sg_dumped_mw));
        visit("closure_converged", Flag(self.closure.converged));
        visit("closure_iterations", Count(self.closure.iterations as u64));
        visit("volume_residual_ft3", Real(self.closure.volume_residual_ft3 as f64));
        visit("energy_residual_btu", Real(self.closure.energy_residual_btu as f64));
        visit("convergence_pattern", Tag(self.closure.pattern.as_tag()));
        visit("alarm_conservation", Flag(self.alarms.conservation));
        visit("alarm_non_convergence", Flag(self.alarms.non_convergence));
        visit("alarm_invariant", Flag(self.alarms.invariant));
        visit("sg_node_count", Count(self.node_count as u64));
        visit("sg_any_boiling", Flag(self.nodes.iter().any(|n| n.boiling)));
    }

    fn node_cells(node: &NodeSample) -> [Cell; 6] {
        [
            Cell::Real(node.temperature_f as f64),
            Cell::Real(node.blend as f64),
            Cell::Real(node.htc as f64),
            Cell::Real(node.area_fraction as f64),
            Cell::Real(node.heat_mw as f64),
            Cell::Flag(node.boiling),
        ]
    }

    /// Column-name row for `node_count` SG nodes.
    pub fn write_header(out: &mut String, node_count: usize) {
        let mut first = true;
        let mut push = |out: &mut String, name: &str| {
            if !first {
                out.push(',');
            }
            first = false;
            let _ = write!(out, "{name:>CELL_WIDTH$}");
        };
        ForensicsSnapshot::default().visit_scalars(|name, _| push(out, name));
        for i in 0..node_count.min(MAX_SG_NODES) {
            for col in NODE_COLUMNS {
                push(out, &format!("sg{i}_{col}"));
            }
        }
        out.push('\n');
    }

    /// One fixed-width row.
    pub fn write_row(&self, out: &mut String) {
        let mut first = true;
        let mut push = |out: &mut String, cell: Cell| {
            if !first {
                out.push(',');
            }
            first = false;
            cell.write(out);
        };
        self.visit_scalars(|_, cell| push(out, cell));
        let count = (self.node_count as usize).min(MAX_SG_NODES);
        for node in &self.nodes[..count] {
            for cell in Self::node_cells(node) {
                push(out, cell);
            }
        }
        out.push('\n');
    }

    /// Total column count for `node_count` nodes.
    pub fn column_count(node_count: usize) -> usize {
        let mut scalars = 0;
        ForensicsSnapshot::default().visit_scalars(|_, _| scalars += 1);
        scalars + node_count.min(MAX_SG_NODES) * NODE_COLUMNS.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_and_row_have_matching_columns() {
        let snap = ForensicsSnapshot {
            tick: 42,
            node_count: 5,
            total_mass_lb: 810_000.25,
            ..ForensicsSnapshot::default()
        };
        let mut header = String::new();
        ForensicsSnapshot::write_header(&mut header, 5);
        let mut row = String::new();
        snap.write_row(&mut row);
        let h = header.trim_end().split(',').count();
        let r = row.trim_end().split(',').count();
        assert_eq!(h, r);
        assert_eq!(h, ForensicsSnapshot::column_count(5));
        assert_eq!(ForensicsSnapshot::column_count(0), 57);
        assert!(h >= 80);
    }

    #[test]
    fn rows_are_fixed_width() {
        let mut a = String::new();
        let mut b = String::new();
        ForensicsSnapshot {
            node_count: 3,
            ..ForensicsSnapshot::default()
        }
        .write_row(&mut a);
        ForensicsSnapshot {
            node_count: 3,
            tick: 123_456,
            pressure_psia: 2_250.5,
            ..ForensicsSnapshot::default()
        }
        .write_row(&mut b);
        assert_eq!(a.len(), b.len());
        assert!(b.contains("123456"));
    }
}
