//! Delivered-fraction lag for pressurizer heater banks and the spray valve.
//!
//! Demand from the pressure controller does not reach the plant at once:
//! heater elements warm up and the spray valve strokes at a finite speed.
//! Both are modelled as an exponential approach to demand capped by a
//! stroke rate. The delivered fraction always stays within [0, 1].

use crate::error::{ControlError, ControlResult};
use serde::{Deserialize, Serialize};

/// Delivered fraction of an actuator, 0 = off or shut, 1 = full.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ActuatorState {
    pub position: f64,
}

/// Exponential lag toward demand with a stroke-rate ceiling.
///
/// ```
/// use pw_controls::{FirstOrderActuator, ActuatorState};
///
/// let heaters = FirstOrderActuator::new(30.0, 0.1).unwrap();
/// let mut bank = ActuatorState::default();
/// for _ in 0..600 {
///     bank = heaters.step(&bank, 0.5, 1.0);
/// }
/// assert!(bank.position > 0.99);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct FirstOrderActuator {
    /// Lag time constant [s]
    pub tau: f64,
    /// Largest change of delivered fraction per second [1/s]
    pub rate_limit: f64,
}

impl FirstOrderActuator {
    pub fn new(tau: f64, rate_limit: f64) -> ControlResult<Self> {
        let positive = |v: f64| v.is_finite() && v > 0.0;
        if !positive(tau) {
            return Err(ControlError::InvalidArg {
                what: "actuator lag must be a positive number of seconds",
            });
        }
        if !positive(rate_limit) {
            return Err(ControlError::InvalidArg {
                what: "actuator stroke rate must be positive",
            });
        }
        Ok(Self { tau, rate_limit })
    }

    /// Rate at which the delivered fraction moves toward `demand` [1/s].
    pub fn dpdt(&self, position: f64, demand: f64) -> f64 {
        let lag_rate = (demand - position) / self.tau;
        lag_rate.clamp(-self.rate_limit, self.rate_limit)
    }

    /// Delivered fraction after `dt` seconds of chasing `demand`.
    ///
    /// A step longer than the lag lands on the demand rather than past it.
    pub fn step(&self, state: &ActuatorState, dt: f64, demand: f64) -> ActuatorState {
        let target = demand.clamp(0.0, 1.0);
        let moved = state.position + self.dpdt(state.position, target) * dt;
        let crossed = (moved - target).signum() * (state.position - target).signum() < 0.0;
        let position = if crossed { target } else { moved };
        ActuatorState {
            position: position.clamp(0.0, 1.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heater_bank_warms_gradually() {
        let bank = FirstOrderActuator::new(30.0, 1.0).unwrap();
        let after = bank.step(&ActuatorState::default(), 0.5, 1.0);
        assert!(after.position > 0.0 && after.position < 0.05);
    }

    #[test]
    fn spray_valve_stroke_is_rate_capped() {
        let valve = FirstOrderActuator::new(1.0, 0.5).unwrap();
        assert!((valve.dpdt(0.0, 1.0) - 0.5).abs() < 1e-12);
        assert!((valve.dpdt(1.0, 0.0) + 0.5).abs() < 1e-12);
    }

    #[test]
    fn coarse_tick_lands_on_demand() {
        let valve = FirstOrderActuator::new(0.1, 100.0).unwrap();
        let after = valve.step(&ActuatorState { position: 0.2 }, 1.0, 0.6);
        assert_eq!(after.position, 0.6);
    }

    #[test]
    fn out_of_range_demand_is_saturated() {
        let fast = FirstOrderActuator::new(0.01, 100.0).unwrap();
        let start = ActuatorState { position: 0.5 };
        assert_eq!(fast.step(&start, 0.1, 2.0).position, 1.0);
        assert_eq!(fast.step(&start, 0.1, -1.0).position, 0.0);
    }

    #[test]
    fn rejects_non_positive_parameters() {
        assert!(FirstOrderActuator::new(-0.1, 1.0).is_err());
        assert!(FirstOrderActuator::new(0.1, -1.0).is_err());
        assert!(FirstOrderActuator::new(0.0, 1.0).is_err());
        assert!(FirstOrderActuator::new(f64::NAN, 1.0).is_err());
    }
}
