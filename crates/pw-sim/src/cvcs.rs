//! Chemical and volume control: charging, letdown, seal leakoff.
//!
//! Uses the plant only through boundary flows. While solid, letdown holds
//! pressure; during the drain it runs high to pull level down; once the
//! bubble is complete, charging holds the programmed level.

use crate::config::PlantConfig;
use crate::error::SimResult;
use crate::regime::PlantMode;
use crate::state::{BubblePhase, PlantRegime};
use pw_controls::{Action, PIController, PIControllerState};
use pw_core::lerp;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct CvcsState {
    pub letdown_pi: PIControllerState,
    pub charging_pi: PIControllerState,
}

/// Flow demands for one tick [lb/s].
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct CvcsFlows {
    pub charging_lbps: f64,
    pub letdown_lbps: f64,
    pub seal_leakoff_lbps: f64,
    pub level_setpoint_pct: f64,
}

impl CvcsFlows {
    pub fn net_lbps(&self) -> f64 {
        self.charging_lbps - self.letdown_lbps - self.seal_leakoff_lbps
    }
}

/// Programmed pressurizer level for the mode and average temperature.
pub fn programmed_level(mode: PlantMode, rcs_temp_f: f64, config: &PlantConfig) -> f64 {
    let low = config.bubble.drain_target_level_pct;
    match mode.regime {
        PlantRegime::ColdShutdown | PlantRegime::SolidHeatup => 100.0,
        PlantRegime::BubbleFormation | PlantRegime::Pressurization => low,
        PlantRegime::RcpStartup
        | PlantRegime::BulkHeatup
        | PlantRegime::ApproachHzp
        | PlantRegime::HzpStable => {
            let c = &config.cvcs;
            let frac = ((rcs_temp_f - c.level_program_t_low_f)
                / (c.level_program_t_high_f - c.level_program_t_low_f))
                .clamp(0.0, 1.0);
            lerp(low, c.level_program_high_pct, frac)
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct Cvcs {
    letdown_pi: PIController,
    charging_pi: PIController,
    charging_base_lbps: f64,
    letdown_base_lbps: f64,
    drain_letdown_lbps: f64,
    solid_setpoint_psia: f64,
    seal_per_rcp_lbps: f64,
}

impl Cvcs {
    pub fn new(config: &PlantConfig) -> SimResult<Self> {
        let c = &config.cvcs;
        Ok(Self {
            letdown_pi: PIController::new(c.letdown_kp, c.letdown_ti_s, 0.0, c.letdown_max_lbps)?
                .with_action(Action::Direct),
            charging_pi: PIController::new(
                c.charging_kp,
                c.charging_ti_s,
                0.0,
                c.charging_max_lbps,
            )?,
            charging_base_lbps: c.charging_base_lbps,
            letdown_base_lbps: c.letdown_base_lbps,
            drain_letdown_lbps: c.drain_letdown_lbps,
            solid_setpoint_psia: c.solid_pressure_setpoint_psia,
            seal_per_rcp_lbps: c.seal_leakoff_per_rcp_lbps,
        })
    }

    #[allow(clippy::too_many_arguments)]
    pub fn step(
        &self,
        ctrl: &CvcsState,
        mode: PlantMode,
        pressure_psia: f64,
        level_pct: f64,
        level_setpoint_pct: f64,
        rcps_running: u8,
        dt: f64,
    ) -> (CvcsState, CvcsFlows) {
        let mut next = *ctrl;
        let (charging, letdown) = match mode.phase {
            BubblePhase::Solid | BubblePhase::Stabilize => {
                let (st, letdown) =
                    self.letdown_pi
                        .update(&ctrl.letdown_pi, pressure_psia, self.solid_setpoint_psia, dt);
                next.letdown_pi = st;
                (self.charging_base_lbps, letdown)
            }
            BubblePhase::Drain => (self.charging_base_lbps, self.drain_letdown_lbps),
            BubblePhase::Complete | BubblePhase::TwoPhase => {
                let (st, charging) =
                    self.charging_pi
                        .update(&ctrl.charging_pi, level_pct, level_setpoint_pct, dt);
                next.charging_pi = st;
                (charging, self.letdown_base_lbps)
            }
        };
        (
            next,
            CvcsFlows {
                charging_lbps: charging,
                letdown_lbps: letdown,
                seal_leakoff_lbps: self.seal_per_rcp_lbps * rcps_running as f64,
                level_setpoint_pct,
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mode(regime: PlantRegime, phase: BubblePhase) -> PlantMode {
        PlantMode::new(regime, phase)
    }

    #[test]
    fn letdown_opens_on_high_solid_pressure() {
        let cfg = PlantConfig::default();
        let cvcs = Cvcs::new(&cfg).unwrap();
        let m = mode(PlantRegime::SolidHeatup, BubblePhase::Solid);
        let (_, low) = cvcs.step(&CvcsState::default(), m, 300.0, 100.0, 100.0, 0, 0.5);
        assert_eq!(low.letdown_lbps, 0.0);
        let (_, high) = cvcs.step(&CvcsState::default(), m, 380.0, 100.0, 100.0, 0, 0.5);
        assert!(high.letdown_lbps > 7.0);
        assert_eq!(high.charging_lbps, cfg.cvcs.charging_base_lbps);
    }

    #[test]
    fn drain_removes_net_mass() {
        let cfg = PlantConfig::default();
        let cvcs = Cvcs::new(&cfg).unwrap();
        let m = mode(PlantRegime::BubbleFormation, BubblePhase::Drain);
        let (_, flows) = cvcs.step(&CvcsState::default(), m, 365.0, 80.0, 25.0, 0, 0.5);
        assert!(flows.net_lbps() < 0.0);
    }

    #[test]
    fn charging_follows_level_error() {
        let cfg = PlantConfig::default();
        let cvcs = Cvcs::new(&cfg).unwrap();
        let m = mode(PlantRegime::BulkHeatup, BubblePhase::TwoPhase);
        let (_, low_level) = cvcs.step(&CvcsState::default(), m, 1_000.0, 20.0, 40.0, 4, 0.5);
        let (_, high_level) = cvcs.step(&CvcsState::default(), m, 1_000.0, 60.0, 40.0, 4, 0.5);
        assert!(low_level.charging_lbps > high_level.charging_lbps);
        assert!((low_level.seal_leakoff_lbps - 1.6).abs() < 1e-12);
    }

    #[test]
    fn level_program_shape() {
        let cfg = PlantConfig::default();
        let bulk = mode(PlantRegime::BulkHeatup, BubblePhase::TwoPhase);
        assert_eq!(programmed_level(bulk, 150.0, &cfg), 25.0);
        assert_eq!(programmed_level(bulk, 600.0, &cfg), 60.0);
        let press = mode(PlantRegime::Pressurization, BubblePhase::TwoPhase);
        assert_eq!(programmed_level(press, 450.0, &cfg), 25.0);
    }
}
