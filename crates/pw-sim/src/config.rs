//! Plant configuration.
//!
//! Every section carries defaults for a four-loop plant heating up from
//! 100 °F at atmospheric pressure, so a scenario file only needs to name
//! what it changes.

use crate::error::{SimError, SimResult};
use serde::{Deserialize, Serialize};

/// Largest tick the blend ramp, delta clamp, and explicit heat
/// integration are validated for.
pub const MAX_STABLE_DT_S: f64 = 1.0;

/// Upper bound on SG nodes (node state lives in fixed arrays).
pub const MAX_SG_NODES: usize = 8;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlantConfig {
    pub geometry: GeometryConfig,
    pub initial: InitialConfig,
    pub time: TimeConfig,
    pub solver: SolverSettings,
    pub heat: HeatConfig,
    pub cvcs: CvcsConfig,
    pub bubble: BubbleConfig,
    pub rcp: RcpConfig,
    pub sg: SgConfig,
    pub relief: ReliefConfig,
    pub hzp: HzpConfig,
    pub forensics: ForensicsConfig,
    pub event_log_capacity: usize,
    pub drift_tolerance_lb: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeometryConfig {
    /// RCS volume excluding the pressurizer [ft³]
    pub rcs_volume_ft3: f64,
    pub pzr_volume_ft3: f64,
    pub sg_nodes: usize,
}

impl Default for GeometryConfig {
    fn default() -> Self {
        Self {
            rcs_volume_ft3: 11_500.0,
            pzr_volume_ft3: 1_800.0,
            sg_nodes: 5,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InitialConfig {
    pub rcs_temp_f: f64,
    pub pzr_temp_f: f64,
    pub pressure_psia: f64,
    /// Heat-up is authorized from the first tick
    pub heatup_authorized: bool,
}

impl Default for InitialConfig {
    fn default() -> Self {
        Self {
            rcs_temp_f: 100.0,
            pzr_temp_f: 100.0,
            pressure_psia: 14.7,
            heatup_authorized: true,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeConfig {
    pub dt_s: f64,
    pub t_end_s: f64,
    pub max_acceleration: f64,
    pub max_ticks_per_frame: u32,
    pub telemetry_hz: f64,
    /// Simulated seconds between stored telemetry records
    pub record_every_s: f64,
}

impl Default for TimeConfig {
    fn default() -> Self {
        Self {
            dt_s: 0.5,
            t_end_s: 8.0 * 3_600.0,
            max_acceleration: 50.0,
            max_ticks_per_frame: 200,
            telemetry_hz: 10.0,
            record_every_s: 60.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverSettings {
    /// Zero is allowed and forces every closure to report non-convergence
    pub max_iterations: usize,
    pub volume_tol_ft3: f64,
    pub energy_tol_btu: f64,
}

impl Default for SolverSettings {
    fn default() -> Self {
        Self {
            max_iterations: 25,
            volume_tol_ft3: 1e-4,
            energy_tol_btu: 0.5,
        }
    }
}

impl SolverSettings {
    pub fn closure_config(&self) -> pw_solver::ClosureConfig {
        pw_solver::ClosureConfig {
            max_iterations: self.max_iterations,
            volume_tol_ft3: self.volume_tol_ft3,
            energy_tol_btu: self.energy_tol_btu,
            ..pw_solver::ClosureConfig::default()
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeatConfig {
    pub heater_rating_mw: f64,
    pub heater_tau_s: f64,
    pub heater_kp: f64,
    pub heater_ti_s: f64,
    pub rcp_heat_mw: f64,
    pub residual_heat_mw: f64,
    /// Ambient loss per °F above ambient [MW/°F]
    pub ambient_loss_mw_per_f: f64,
    pub ambient_temp_f: f64,
    pub spray_max_lbps: f64,
    /// Spray opens this far above the pressure setpoint [psi]
    pub spray_deadband_psi: f64,
    /// Pressure span over which spray goes from closed to full open [psi]
    pub spray_band_psi: f64,
    pub spray_tau_s: f64,
}

impl Default for HeatConfig {
    fn default() -> Self {
        Self {
            heater_rating_mw: 1.8,
            heater_tau_s: 30.0,
            heater_kp: 0.02,
            heater_ti_s: 300.0,
            rcp_heat_mw: 5.25,
            residual_heat_mw: 1.0,
            ambient_loss_mw_per_f: 0.001,
            ambient_temp_f: 70.0,
            spray_max_lbps: 40.0,
            spray_deadband_psi: 50.0,
            spray_band_psi: 100.0,
            spray_tau_s: 10.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CvcsConfig {
    pub charging_base_lbps: f64,
    pub letdown_base_lbps: f64,
    pub drain_letdown_lbps: f64,
    pub letdown_max_lbps: f64,
    pub charging_max_lbps: f64,
    pub solid_pressure_setpoint_psia: f64,
    pub letdown_kp: f64,
    pub letdown_ti_s: f64,
    pub charging_kp: f64,
    pub charging_ti_s: f64,
    pub seal_leakoff_per_rcp_lbps: f64,
    pub charging_temp_f: f64,
    /// Programmed level at and above `level_program_t_high_f` [%]
    pub level_program_high_pct: f64,
    pub level_program_t_low_f: f64,
    pub level_program_t_high_f: f64,
}

impl Default for CvcsConfig {
    fn default() -> Self {
        Self {
            charging_base_lbps: 10.0,
            letdown_base_lbps: 10.0,
            drain_letdown_lbps: 25.0,
            letdown_max_lbps: 30.0,
            charging_max_lbps: 25.0,
            solid_pressure_setpoint_psia: 365.0,
            letdown_kp: 0.5,
            letdown_ti_s: 120.0,
            charging_kp: 2.0,
            charging_ti_s: 300.0,
            seal_leakoff_per_rcp_lbps: 0.4,
            charging_temp_f: 130.0,
            level_program_high_pct: 60.0,
            level_program_t_low_f: 200.0,
            level_program_t_high_f: 557.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BubbleConfig {
    /// Pressurizer temperature above saturation that marks bubble onset [°F]
    pub onset_superheat_f: f64,
    pub stabilize_hold_s: f64,
    pub drain_target_level_pct: f64,
    pub complete_hold_s: f64,
    /// Heater setpoint while the bubble forms
    pub bubble_pressure_setpoint_psia: f64,
    /// Heater setpoint during pressurization and pump starts
    pub pressurization_setpoint_psia: f64,
}

impl Default for BubbleConfig {
    fn default() -> Self {
        Self {
            onset_superheat_f: 0.5,
            stabilize_hold_s: 300.0,
            drain_target_level_pct: 25.0,
            complete_hold_s: 120.0,
            bubble_pressure_setpoint_psia: 365.0,
            pressurization_setpoint_psia: 450.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RcpConfig {
    pub pump_count: u8,
    pub start_interval_s: f64,
    /// Pressurization hands over to pump starts at this pressure
    pub permissive_pressure_psia: f64,
    /// Low-pressure interlock: no pump starts below this pressure
    pub min_start_pressure_psia: f64,
}

impl Default for RcpConfig {
    fn default() -> Self {
        Self {
            pump_count: 4,
            start_interval_s: 120.0,
            permissive_pressure_psia: 400.0,
            min_start_pressure_psia: 340.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SgConfig {
    /// Subcooled heat transfer coefficient [BTU/hr·ft²·°F]
    pub htc_subcooled: f64,
    pub htc_boiling: f64,
    pub tube_area_ft2: f64,
    /// Fraction of the tube area assigned to each node, top node first
    pub area_fractions: Vec<f64>,
    pub subcooled_area_fraction: f64,
    pub blend_ramp_s: f64,
    /// Largest aggregate heat change per tick outside bypass ticks [MW]
    pub delta_clamp_mw: f64,
    pub secondary_mass_lb: f64,
    /// Adjacent-node mixing rate [1/s]
    pub mixing_per_s: f64,
    pub natural_circulation_factor: f64,
    /// A node boils within this margin below secondary saturation [°F]
    pub boiling_margin_f: f64,
    pub steam_dump_pressure_psia: f64,
    pub condenser_vacuum: bool,
    pub secondary_floor_psia: f64,
}

impl Default for SgConfig {
    fn default() -> Self {
        Self {
            htc_subcooled: 120.0,
            htc_boiling: 1_200.0,
            tube_area_ft2: 220_000.0,
            area_fractions: vec![0.30, 0.25, 0.20, 0.15, 0.10],
            subcooled_area_fraction: 0.4,
            blend_ramp_s: 60.0,
            delta_clamp_mw: 5.0,
            secondary_mass_lb: 400_000.0,
            mixing_per_s: 0.02,
            natural_circulation_factor: 0.08,
            boiling_margin_f: 1.0,
            steam_dump_pressure_psia: 1_106.7,
            condenser_vacuum: true,
            secondary_floor_psia: 14.7,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReliefConfig {
    /// Relief protecting the solid plant
    pub solid_relief_setpoint_psia: f64,
    pub porv_setpoint_psia: f64,
    /// Relief flow per psi above setpoint [lb/s/psi]
    pub coefficient_lbps_per_psi: f64,
    pub max_flow_lbps: f64,
}

impl Default for ReliefConfig {
    fn default() -> Self {
        Self {
            solid_relief_setpoint_psia: 450.0,
            porv_setpoint_psia: 2_335.0,
            coefficient_lbps_per_psi: 2.0,
            max_flow_lbps: 50.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HzpConfig {
    pub approach_temp_f: f64,
    pub temp_f: f64,
    pub pressure_psia: f64,
    pub temp_band_f: f64,
    pub pressure_band_psi: f64,
    pub hold_s: f64,
}

impl Default for HzpConfig {
    fn default() -> Self {
        Self {
            approach_temp_f: 530.0,
            temp_f: 557.0,
            pressure_psia: 2_250.0,
            temp_band_f: 3.0,
            pressure_band_psi: 30.0,
            hold_s: 300.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForensicsConfig {
    pub enabled: bool,
    pub capacity: usize,
    pub cooldown_s: f64,
    pub delta_mw_threshold: f64,
    /// Directory for CSV dumps; `None` keeps dumps in memory
    pub output_dir: Option<String>,
}

impl Default for ForensicsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            capacity: 90,
            cooldown_s: 30.0,
            delta_mw_threshold: 5.0,
            output_dir: None,
        }
    }
}

fn positive(v: f64, what: &'static str) -> SimResult<()> {
    if v.is_finite() && v > 0.0 {
        Ok(())
    } else {
        Err(SimError::InvalidConfig { what })
    }
}

fn non_negative(v: f64, what: &'static str) -> SimResult<()> {
    if v.is_finite() && v >= 0.0 {
        Ok(())
    } else {
        Err(SimError::InvalidConfig { what })
    }
}

fn fraction(v: f64, what: &'static str) -> SimResult<()> {
    if v.is_finite() && (0.0..=1.0).contains(&v) {
        Ok(())
    } else {
        Err(SimError::InvalidConfig { what })
    }
}

impl Default for PlantConfig {
    fn default() -> Self {
        Self {
            geometry: GeometryConfig::default(),
            initial: InitialConfig::default(),
            time: TimeConfig::default(),
            solver: SolverSettings::default(),
            heat: HeatConfig::default(),
            cvcs: CvcsConfig::default(),
            bubble: BubbleConfig::default(),
            rcp: RcpConfig::default(),
            sg: SgConfig::default(),
            relief: ReliefConfig::default(),
            hzp: HzpConfig::default(),
            forensics: ForensicsConfig::default(),
            event_log_capacity: 512,
            drift_tolerance_lb: 0.1,
        }
    }
}

impl PlantConfig {
    pub fn validate(&self) -> SimResult<()> {
        let g = &self.geometry;
        positive(g.rcs_volume_ft3, "rcs_volume_ft3 must be positive")?;
        positive(g.pzr_volume_ft3, "pzr_volume_ft3 must be positive")?;
        if g.sg_nodes == 0 || g.sg_nodes > MAX_SG_NODES {
            return Err(SimError::InvalidConfig {
                what: "sg_nodes must be between 1 and 8",
            });
        }

        let i = &self.initial;
        if !(i.rcs_temp_f.is_finite() && (32.0..=700.0).contains(&i.rcs_temp_f)) {
            return Err(SimError::InvalidConfig {
                what: "initial rcs_temp_f outside 32..700 °F",
            });
        }
        if !(i.pzr_temp_f.is_finite() && (32.0..=700.0).contains(&i.pzr_temp_f)) {
            return Err(SimError::InvalidConfig {
                what: "initial pzr_temp_f outside 32..700 °F",
            });
        }
        positive(i.pressure_psia, "initial pressure must be positive")?;
        if i.pressure_psia < pw_water::saturation::psat_psia(i.pzr_temp_f) {
            return Err(SimError::InvalidConfig {
                what: "initial pressure is below saturation at the pressurizer temperature",
            });
        }

        let t = &self.time;
        positive(t.dt_s, "dt_s must be positive")?;
        if t.dt_s > MAX_STABLE_DT_S {
            return Err(SimError::InvalidConfig {
                what: "dt_s exceeds the stable tick bound",
            });
        }
        non_negative(t.t_end_s, "t_end_s must be non-negative")?;
        if !(t.max_acceleration.is_finite() && t.max_acceleration >= 1.0) {
            return Err(SimError::InvalidConfig {
                what: "max_acceleration must be at least 1",
            });
        }
        if t.max_ticks_per_frame == 0 {
            return Err(SimError::InvalidConfig {
                what: "max_ticks_per_frame must be positive",
            });
        }
        positive(t.telemetry_hz, "telemetry_hz must be positive")?;
        positive(t.record_every_s, "record_every_s must be positive")?;

        let s = &self.solver;
        positive(s.volume_tol_ft3, "volume tolerance must be positive")?;
        positive(s.energy_tol_btu, "energy tolerance must be positive")?;

        let h = &self.heat;
        non_negative(h.heater_rating_mw, "heater_rating_mw must be non-negative")?;
        positive(h.heater_tau_s, "heater_tau_s must be positive")?;
        non_negative(h.heater_kp, "heater_kp must be non-negative")?;
        positive(h.heater_ti_s, "heater_ti_s must be positive")?;
        non_negative(h.rcp_heat_mw, "rcp_heat_mw must be non-negative")?;
        non_negative(h.residual_heat_mw, "residual_heat_mw must be non-negative")?;
        non_negative(h.ambient_loss_mw_per_f, "ambient loss must be non-negative")?;
        non_negative(h.spray_max_lbps, "spray_max_lbps must be non-negative")?;
        non_negative(h.spray_deadband_psi, "spray deadband must be non-negative")?;
        positive(h.spray_band_psi, "spray band must be positive")?;
        positive(h.spray_tau_s, "spray_tau_s must be positive")?;

        let c = &self.cvcs;
        non_negative(c.charging_base_lbps, "charging flow must be non-negative")?;
        non_negative(c.letdown_base_lbps, "letdown flow must be non-negative")?;
        positive(c.letdown_max_lbps, "letdown_max_lbps must be positive")?;
        positive(c.charging_max_lbps, "charging_max_lbps must be positive")?;
        if c.drain_letdown_lbps <= c.charging_base_lbps {
            return Err(SimError::InvalidConfig {
                what: "drain letdown must exceed charging",
            });
        }
        positive(c.solid_pressure_setpoint_psia, "solid setpoint must be positive")?;
        non_negative(c.letdown_kp, "letdown_kp must be non-negative")?;
        positive(c.letdown_ti_s, "letdown_ti_s must be positive")?;
        non_negative(c.charging_kp, "charging_kp must be non-negative")?;
        positive(c.charging_ti_s, "charging_ti_s must be positive")?;
        non_negative(c.seal_leakoff_per_rcp_lbps, "seal leakoff must be non-negative")?;
        if !(c.charging_temp_f.is_finite() && (32.0..=700.0).contains(&c.charging_temp_f)) {
            return Err(SimError::InvalidConfig {
                what: "charging_temp_f outside 32..700 °F",
            });
        }
        if c.level_program_t_high_f <= c.level_program_t_low_f {
            return Err(SimError::InvalidConfig {
                what: "level program temperatures are inverted",
            });
        }

        let b = &self.bubble;
        non_negative(b.onset_superheat_f, "onset superheat must be non-negative")?;
        non_negative(b.stabilize_hold_s, "stabilize hold must be non-negative")?;
        non_negative(b.complete_hold_s, "complete hold must be non-negative")?;
        if !(b.drain_target_level_pct > 0.0 && b.drain_target_level_pct < 100.0) {
            return Err(SimError::InvalidConfig {
                what: "drain target level must be between 0 and 100 %",
            });
        }
        if !(c.level_program_high_pct >= b.drain_target_level_pct
            && c.level_program_high_pct < 100.0)
        {
            return Err(SimError::InvalidConfig {
                what: "programmed level must lie between the drain target and 100 %",
            });
        }
        positive(b.bubble_pressure_setpoint_psia, "bubble setpoint must be positive")?;
        if b.pressurization_setpoint_psia < b.bubble_pressure_setpoint_psia {
            return Err(SimError::InvalidConfig {
                what: "pressurization setpoint is below the bubble setpoint",
            });
        }

        let r = &self.rcp;
        if r.pump_count == 0 {
            return Err(SimError::InvalidConfig {
                what: "pump_count must be positive",
            });
        }
        non_negative(r.start_interval_s, "start interval must be non-negative")?;
        positive(r.permissive_pressure_psia, "permissive pressure must be positive")?;
        positive(r.min_start_pressure_psia, "interlock pressure must be positive")?;

        let sg = &self.sg;
        positive(sg.htc_subcooled, "htc_subcooled must be positive")?;
        positive(sg.htc_boiling, "htc_boiling must be positive")?;
        positive(sg.tube_area_ft2, "tube_area_ft2 must be positive")?;
        if sg.area_fractions.len() != g.sg_nodes {
            return Err(SimError::InvalidConfig {
                what: "area_fractions must have one entry per SG node",
            });
        }
        if sg.area_fractions.iter().any(|f| !(f.is_finite() && *f > 0.0)) {
            return Err(SimError::InvalidConfig {
                what: "area fractions must be positive",
            });
        }
        let sum: f64 = sg.area_fractions.iter().sum();
        if (sum - 1.0).abs() > 1e-6 {
            return Err(SimError::InvalidConfig {
                what: "area fractions must sum to 1",
            });
        }
        fraction(sg.subcooled_area_fraction, "subcooled area fraction outside 0..1")?;
        positive(sg.blend_ramp_s, "blend_ramp_s must be positive")?;
        positive(sg.delta_clamp_mw, "delta_clamp_mw must be positive")?;
        positive(sg.secondary_mass_lb, "secondary_mass_lb must be positive")?;
        non_negative(sg.mixing_per_s, "mixing rate must be non-negative")?;
        if sg.mixing_per_s * t.dt_s > 0.5 {
            return Err(SimError::InvalidConfig {
                what: "mixing rate too large for dt",
            });
        }
        fraction(sg.natural_circulation_factor, "natural circulation factor outside 0..1")?;
        non_negative(sg.boiling_margin_f, "boiling margin must be non-negative")?;
        positive(sg.secondary_floor_psia, "secondary floor must be positive")?;
        if sg.steam_dump_pressure_psia <= sg.secondary_floor_psia {
            return Err(SimError::InvalidConfig {
                what: "steam dump setpoint must exceed the secondary floor",
            });
        }

        let rv = &self.relief;
        positive(rv.solid_relief_setpoint_psia, "solid relief setpoint must be positive")?;
        if rv.solid_relief_setpoint_psia <= c.solid_pressure_setpoint_psia {
            return Err(SimError::InvalidConfig {
                what: "solid relief setpoint must exceed the solid pressure setpoint",
            });
        }
        if rv.porv_setpoint_psia <= self.hzp.pressure_psia {
            return Err(SimError::InvalidConfig {
                what: "PORV setpoint must exceed the HZP pressure",
            });
        }
        positive(rv.coefficient_lbps_per_psi, "relief coefficient must be positive")?;
        positive(rv.max_flow_lbps, "relief max flow must be positive")?;

        let z = &self.hzp;
        if z.approach_temp_f >= z.temp_f {
            return Err(SimError::InvalidConfig {
                what: "approach temperature must be below the HZP temperature",
            });
        }
        positive(z.pressure_psia, "HZP pressure must be positive")?;
        positive(z.temp_band_f, "HZP temperature band must be positive")?;
        positive(z.pressure_band_psi, "HZP pressure band must be positive")?;
        non_negative(z.hold_s, "HZP hold must be non-negative")?;

        let f = &self.forensics;
        if f.capacity == 0 {
            return Err(SimError::InvalidConfig {
                what: "forensics capacity must be positive",
            });
        }
        non_negative(f.cooldown_s, "forensics cooldown must be non-negative")?;
        positive(f.delta_mw_threshold, "forensics threshold must be positive")?;

        if self.event_log_capacity == 0 {
            return Err(SimError::InvalidConfig {
                what: "event_log_capacity must be positive",
            });
        }
        positive(self.drift_tolerance_lb, "drift tolerance must be positive")?;
        Ok(())
    }
}
