//! Regime state machine.
//!
//! The macro regime and the bubble sub-phase move together as one
//! `PlantMode`. Only forward (heat-up) steps exist; every legal mode has
//! exactly one successor, and any request that is not that successor, or
//! that names an inconsistent pair, is rejected as an `InvariantViolation`.

use crate::config::PlantConfig;
use crate::error::InvariantViolation;
use crate::events::Severity;
use crate::state::{BubblePhase, PlantRegime, SystemState};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlantMode {
    pub regime: PlantRegime,
    pub phase: BubblePhase,
}

impl PlantMode {
    pub const fn new(regime: PlantRegime, phase: BubblePhase) -> Self {
        Self { regime, phase }
    }

    /// Whether the sub-phase is legal under the macro regime.
    pub fn is_consistent(self) -> bool {
        match self.regime {
            PlantRegime::ColdShutdown | PlantRegime::SolidHeatup => {
                self.phase == BubblePhase::Solid
            }
            PlantRegime::BubbleFormation => matches!(
                self.phase,
                BubblePhase::Stabilize | BubblePhase::Drain | BubblePhase::Complete
            ),
            PlantRegime::Pressurization
            | PlantRegime::RcpStartup
            | PlantRegime::BulkHeatup
            | PlantRegime::ApproachHzp
            | PlantRegime::HzpStable => self.phase == BubblePhase::TwoPhase,
        }
    }

    /// Whether `to` may directly follow this mode.
    pub fn check_step(self, to: PlantMode) -> Result<(), &'static str> {
        if !to.is_consistent() {
            return Err("inconsistent regime and bubble phase");
        }
        if self.successor() != Some(to) {
            return Err("not the next heat-up step");
        }
        Ok(())
    }

    /// The next heat-up step, if any.
    pub fn successor(self) -> Option<PlantMode> {
        use BubblePhase as B;
        use PlantRegime as R;
        if !self.is_consistent() {
            return None;
        }
        let next = match (self.regime, self.phase) {
            (R::ColdShutdown, _) => PlantMode::new(R::SolidHeatup, B::Solid),
            (R::SolidHeatup, _) => PlantMode::new(R::BubbleFormation, B::Stabilize),
            (R::BubbleFormation, B::Stabilize) => PlantMode::new(R::BubbleFormation, B::Drain),
            (R::BubbleFormation, B::Drain) => PlantMode::new(R::BubbleFormation, B::Complete),
            (R::BubbleFormation, _) => PlantMode::new(R::Pressurization, B::TwoPhase),
            (R::Pressurization, _) => PlantMode::new(R::RcpStartup, B::TwoPhase),
            (R::RcpStartup, _) => PlantMode::new(R::BulkHeatup, B::TwoPhase),
            (R::BulkHeatup, _) => PlantMode::new(R::ApproachHzp, B::TwoPhase),
            (R::ApproachHzp, _) => PlantMode::new(R::HzpStable, B::TwoPhase),
            (R::HzpStable, _) => return None,
        };
        Some(next)
    }
}

impl std::fmt::Display for PlantMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.regime, self.phase)
    }
}

/// A proposed mode change with the log entry it produces.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transition {
    pub from: PlantMode,
    pub to: PlantMode,
    pub severity: Severity,
    pub reason: &'static str,
}

/// Plant readings the machine decides on.
#[derive(Clone, Copy, Debug, Default)]
pub struct RegimeInputs {
    pub pressure_psia: f64,
    pub pzr_temp_f: f64,
    /// Saturation temperature at the current pressure
    pub tsat_f: f64,
    pub rcs_temp_f: f64,
    pub level_pct: f64,
    /// Time spent in the current mode
    pub mode_elapsed_s: f64,
    pub rcps_running: u8,
    pub heatup_authorized: bool,
    pub condenser_vacuum: bool,
    /// Continuous time inside the HZP temperature and pressure band
    pub hzp_band_elapsed_s: Option<f64>,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Evaluation {
    Stay,
    Advance(Transition),
    /// The threshold is met but a permissive is missing
    Blocked(&'static str),
}

fn advance(from: PlantMode, to: PlantMode, severity: Severity, reason: &'static str) -> Evaluation {
    Evaluation::Advance(Transition {
        from,
        to,
        severity,
        reason,
    })
}

/// Decide whether the current mode should advance this tick.
pub fn evaluate(mode: PlantMode, inputs: &RegimeInputs, config: &PlantConfig) -> Evaluation {
    use BubblePhase as B;
    use PlantRegime as R;

    let Some(next) = mode.successor() else {
        return Evaluation::Stay;
    };
    let bubble = &config.bubble;

    match (mode.regime, mode.phase) {
        (R::ColdShutdown, _) => {
            if inputs.heatup_authorized {
                advance(mode, next, Severity::Action, "heat-up authorized")
            } else {
                Evaluation::Stay
            }
        }
        (R::SolidHeatup, _) => {
            if inputs.pzr_temp_f >= inputs.tsat_f + bubble.onset_superheat_f {
                advance(mode, next, Severity::Action, "pressurizer liquid reached saturation")
            } else {
                Evaluation::Stay
            }
        }
        (R::BubbleFormation, B::Stabilize) => {
            if inputs.mode_elapsed_s >= bubble.stabilize_hold_s {
                advance(mode, next, Severity::Action, "bubble stable, draining pressurizer")
            } else {
                Evaluation::Stay
            }
        }
        (R::BubbleFormation, B::Drain) => {
            if inputs.level_pct <= bubble.drain_target_level_pct {
                advance(mode, next, Severity::Info, "pressurizer level at drain target")
            } else {
                Evaluation::Stay
            }
        }
        (R::BubbleFormation, _) => {
            if inputs.mode_elapsed_s >= bubble.complete_hold_s {
                advance(mode, next, Severity::Action, "bubble complete, pressurizing")
            } else {
                Evaluation::Stay
            }
        }
        (R::Pressurization, _) => {
            if inputs.pressure_psia >= config.rcp.permissive_pressure_psia {
                advance(mode, next, Severity::Action, "RCP start permissive pressure reached")
            } else {
                Evaluation::Stay
            }
        }
        (R::RcpStartup, _) => {
            if inputs.rcps_running >= config.rcp.pump_count {
                advance(mode, next, Severity::Info, "all reactor coolant pumps running")
            } else {
                Evaluation::Stay
            }
        }
        (R::BulkHeatup, _) => {
            if inputs.rcs_temp_f < config.hzp.approach_temp_f {
                Evaluation::Stay
            } else if inputs.condenser_vacuum {
                advance(mode, next, Severity::Info, "approach temperature reached")
            } else {
                Evaluation::Blocked("approach temperature reached without condenser vacuum")
            }
        }
        (R::ApproachHzp, _) => match inputs.hzp_band_elapsed_s {
            Some(held) if held >= config.hzp.hold_s => {
                advance(mode, next, Severity::Info, "hot zero power conditions held")
            }
            _ => Evaluation::Stay,
        },
        (R::HzpStable, _) => Evaluation::Stay,
    }
}

impl SystemState {
    pub fn mode(&self) -> PlantMode {
        PlantMode::new(self.regime, self.bubble_phase)
    }

    /// Apply a transition after checking it against the current mode.
    ///
    /// On rejection the state is left untouched.
    pub fn apply_transition(&mut self, transition: &Transition) -> Result<(), InvariantViolation> {
        let current = self.mode();
        let reject = |reason| InvariantViolation {
            from: current,
            to: transition.to,
            reason,
        };
        if transition.from != current {
            return Err(reject("transition does not start from the current mode"));
        }
        current.check_step(transition.to).map_err(reject)?;
        self.regime = transition.to.regime;
        self.bubble_phase = transition.to.phase;
        Ok(())
    }
}
