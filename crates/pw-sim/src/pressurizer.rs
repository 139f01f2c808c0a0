//! Pressurizer partition step, heaters, and spray.
//!
//! The partition step hands the closure solver the post-boundary,
//! post-heat state and commits the solution only if it converged. Surge
//! is an internal transfer: the pressurizer gains exactly what the RCS
//! remainder loses, mass and energy both.

use crate::config::{GeometryConfig, PlantConfig};
use crate::error::SimResult;
use crate::ledger::LedgerAnomaly;
use crate::regime::PlantMode;
use crate::state::{BubblePhase, PlantRegime, SystemState};
use pw_controls::{ActuatorState, FirstOrderActuator, PIController, PIControllerState};
use pw_core::lerp;
use pw_solver::{ClosureConfig, ClosureResult, Surge, solve_solid, solve_two_phase};
use pw_solver::closure::PartitionInputs;
use pw_water::WaterProperties;

/// Outcome of one partition solve.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PartitionOutcome {
    pub result: ClosureResult,
    pub surge: Surge,
    pub anomaly: Option<LedgerAnomaly>,
}

/// Re-derive RCS (and, when solid, pressurizer) temperature from energy.
pub fn refresh_temperatures<W: WaterProperties + ?Sized>(state: &mut SystemState, water: &W) {
    if state.rcs_water_mass_lb > 0.0 {
        state.rcs_temp_f = water.liquid_temperature(state.rcs_specific_energy(), state.rcs_temp_f);
    }
    if !state.bubble_phase.has_bubble() && state.pzr_water_mass_lb > 0.0 {
        let u = state.pzr_energy_btu / state.pzr_water_mass_lb;
        state.pzr_temp_f = water.liquid_temperature(u, state.pzr_temp_f);
    }
}

/// Solve the pressurizer/RCS split for the current mode and commit it.
///
/// The state is only modified when the solver converged.
pub fn partition_step<W: WaterProperties + ?Sized>(
    state: &mut SystemState,
    water: &W,
    geometry: &GeometryConfig,
    config: &ClosureConfig,
) -> PartitionOutcome {
    refresh_temperatures(state, water);
    let inputs = PartitionInputs {
        total_mass_lb: state.total_mass_lb,
        rcs_volume_ft3: geometry.rcs_volume_ft3,
        pzr_volume_ft3: geometry.pzr_volume_ft3,
        rcs_temp_f: state.rcs_temp_f,
        rcs_specific_energy: state.rcs_specific_energy(),
        pzr_mass_lb: state.pzr_mass_lb(),
        pzr_energy_btu: state.pzr_energy_btu,
        pressure_guess_psia: state.pressure_psia,
        steam_mass_guess_lb: state.pzr_steam_mass_lb.max(0.0),
    };

    if state.bubble_phase.has_bubble() {
        let (solution, result) = solve_two_phase(water, inputs, config);
        if !result.converged {
            return PartitionOutcome {
                result,
                surge: Surge::default(),
                anomaly: None,
            };
        }
        let surge = solution.surge;
        state.set_pzr_inventory(
            solution.pzr_mass_lb - solution.steam_mass_lb,
            solution.steam_mass_lb,
        );
        state.pzr_energy_btu += surge.energy_btu;
        state.rcs_energy_btu -= surge.energy_btu;
        state.pressure_psia = solution.pressure_psia;
        state.pzr_temp_f = solution.sat.t_f;
        let anomaly = state.recompute_remainder();
        refresh_temperatures(state, water);
        PartitionOutcome {
            result,
            surge,
            anomaly,
        }
    } else {
        let (solution, result) = solve_solid(water, inputs, state.pzr_temp_f, config);
        if !result.converged {
            return PartitionOutcome {
                result,
                surge: Surge::default(),
                anomaly: None,
            };
        }
        let surge = solution.surge;
        state.set_pzr_inventory(solution.pzr_mass_lb, 0.0);
        state.pzr_energy_btu += surge.energy_btu;
        state.rcs_energy_btu -= surge.energy_btu;
        state.pressure_psia = solution.pressure_psia;
        let anomaly = state.recompute_remainder();
        refresh_temperatures(state, water);
        PartitionOutcome {
            result,
            surge,
            anomaly,
        }
    }
}

/// Pressure the heaters hold for the current mode.
pub fn pressure_setpoint(mode: PlantMode, rcs_temp_f: f64, config: &PlantConfig) -> f64 {
    let bubble = &config.bubble;
    match mode.regime {
        PlantRegime::ColdShutdown | PlantRegime::SolidHeatup => {
            config.cvcs.solid_pressure_setpoint_psia
        }
        PlantRegime::BubbleFormation => bubble.bubble_pressure_setpoint_psia,
        PlantRegime::Pressurization | PlantRegime::RcpStartup => {
            bubble.pressurization_setpoint_psia
        }
        PlantRegime::BulkHeatup | PlantRegime::ApproachHzp | PlantRegime::HzpStable => {
            let span = config.hzp.temp_f - config.cvcs.level_program_t_low_f;
            let frac = ((rcs_temp_f - config.cvcs.level_program_t_low_f) / span).clamp(0.0, 1.0);
            lerp(
                bubble.pressurization_setpoint_psia,
                config.hzp.pressure_psia,
                frac,
            )
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PressureControlState {
    pub heater_pi: PIControllerState,
    pub heaters: ActuatorState,
    pub spray: ActuatorState,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PressureControlOutput {
    pub setpoint_psia: f64,
    /// Heater demand fraction before actuator lag
    pub heater_demand: f64,
    pub heater_mw: f64,
    pub spray_lbps: f64,
}

/// Heater bank and spray valve driven from pressurizer pressure.
#[derive(Clone, Copy, Debug)]
pub struct PressureControl {
    heater_pi: PIController,
    heaters: FirstOrderActuator,
    spray: FirstOrderActuator,
    heater_rating_mw: f64,
    spray_max_lbps: f64,
    spray_deadband_psi: f64,
    spray_band_psi: f64,
}

impl PressureControl {
    pub fn new(config: &PlantConfig) -> SimResult<Self> {
        let h = &config.heat;
        Ok(Self {
            heater_pi: PIController::new(h.heater_kp, h.heater_ti_s, 0.0, 1.0)?,
            heaters: FirstOrderActuator::new(h.heater_tau_s, 1.0)?,
            spray: FirstOrderActuator::new(h.spray_tau_s, 1.0)?,
            heater_rating_mw: h.heater_rating_mw,
            spray_max_lbps: h.spray_max_lbps,
            spray_deadband_psi: h.spray_deadband_psi,
            spray_band_psi: h.spray_band_psi,
        })
    }

    /// Heaters stay off until heat-up starts, then run flat out until the
    /// bubble is established; after that a PI loop holds the setpoint.
    /// Spray needs a running pump for head.
    pub fn step(
        &self,
        ctrl: &PressureControlState,
        mode: PlantMode,
        pressure_psia: f64,
        setpoint_psia: f64,
        rcps_running: u8,
        dt: f64,
    ) -> (PressureControlState, PressureControlOutput) {
        let full_on = matches!(mode.phase, BubblePhase::Solid | BubblePhase::Stabilize);
        let (heater_pi, demand) = if mode.regime == PlantRegime::ColdShutdown {
            (ctrl.heater_pi, 0.0)
        } else if full_on {
            (ctrl.heater_pi, 1.0)
        } else {
            self.heater_pi
                .update(&ctrl.heater_pi, pressure_psia, setpoint_psia, dt)
        };
        let heaters = self.heaters.step(&ctrl.heaters, dt, demand);

        let spray_allowed = mode.regime >= PlantRegime::Pressurization && rcps_running > 0;
        let spray_cmd = if spray_allowed {
            (pressure_psia - setpoint_psia - self.spray_deadband_psi) / self.spray_band_psi
        } else {
            0.0
        };
        let spray = self.spray.step(&ctrl.spray, dt, spray_cmd);

        (
            PressureControlState {
                heater_pi,
                heaters,
                spray,
            },
            PressureControlOutput {
                setpoint_psia,
                heater_demand: demand,
                heater_mw: heaters.position * self.heater_rating_mw,
                spray_lbps: spray.position * self.spray_max_lbps,
            },
        )
    }
}

/// Move spray water from the RCS into the pressurizer.
///
/// Mass-neutral: the closure that follows returns the displaced liquid
/// through the surge line.
pub fn apply_spray(state: &mut SystemState, spray_lb: f64) -> Option<LedgerAnomaly> {
    if spray_lb <= 0.0 || !state.bubble_phase.has_bubble() {
        return None;
    }
    let spray_lb = spray_lb.min(state.rcs_water_mass_lb.max(0.0));
    let energy = spray_lb * state.rcs_specific_energy();
    state.set_pzr_inventory(state.pzr_water_mass_lb + spray_lb, state.pzr_steam_mass_lb);
    state.pzr_energy_btu += energy;
    state.rcs_energy_btu -= energy;
    state.recompute_remainder()
}
