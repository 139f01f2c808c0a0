//! PI loops for CVCS letdown, charging and pressurizer heater demand.
//!
//! Output is clamped to its band, and the integral stops accumulating while
//! the output sits on a limit so a long solid-plant excursion does not
//! leave the loop wound up when pressure comes back.

use crate::error::{ControlError, ControlResult};
use serde::{Deserialize, Serialize};

/// Sign convention of the loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// Output rises when the measurement falls below setpoint
    /// (heaters on low pressure, charging on low level).
    #[default]
    Reverse,
    /// Output rises when the measurement exceeds setpoint
    /// (letdown on high pressure).
    Direct,
}

impl Action {
    fn error(self, measured: f64, setpoint: f64) -> f64 {
        match self {
            Action::Reverse => setpoint - measured,
            Action::Direct => measured - setpoint,
        }
    }
}

/// Gains and output band of one loop.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PIController {
    pub kp: f64,
    /// Reset time [s]
    pub ti: f64,
    pub out_min: f64,
    pub out_max: f64,
    #[serde(default)]
    pub action: Action,
}

impl PIController {
    /// Reverse-acting loop with output limited to `[out_min, out_max]`.
    pub fn new(kp: f64, ti: f64, out_min: f64, out_max: f64) -> ControlResult<Self> {
        let invalid = |what| Err(ControlError::InvalidArg { what });
        if !(kp.is_finite() && kp >= 0.0) {
            return invalid("proportional gain must be finite and non-negative");
        }
        if !(ti.is_finite() && ti > 0.0) {
            return invalid("reset time must be positive");
        }
        if !(out_min < out_max) {
            return invalid("output band is empty");
        }
        Ok(Self {
            kp,
            ti,
            out_min,
            out_max,
            action: Action::Reverse,
        })
    }

    pub fn with_action(mut self, action: Action) -> Self {
        self.action = action;
        self
    }

    /// One controller step. Returns the next state and the clamped demand;
    /// the caller's state is not touched, so a rolled-back tick just drops
    /// the returned value.
    pub fn update(
        &self,
        state: &PIControllerState,
        measured: f64,
        setpoint: f64,
        dt: f64,
    ) -> (PIControllerState, f64) {
        let error = self.action.error(measured, setpoint);
        let trial_integral = state.integral + error * dt;
        let unclamped = self.kp * (error + trial_integral / self.ti);
        let demand = unclamped.clamp(self.out_min, self.out_max);

        let integral = if demand == unclamped {
            trial_integral
        } else {
            state.integral
        };
        (PIControllerState { integral }, demand)
    }
}

/// Integrated error carried between ticks.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PIControllerState {
    pub integral: f64,
}
