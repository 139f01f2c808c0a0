//! Real-time pacing.
//!
//! Turns wall-clock frame time into a whole number of fixed ticks. The tick
//! size never changes; acceleration only changes how many ticks run per
//! frame, and it never gates a transition.

use crate::error::{SimError, SimResult};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FramePlan {
    pub ticks: u32,
    /// Acceleration actually applied after clamping
    pub acceleration: f64,
    /// Simulated time dropped because the frame hit the tick cap
    pub dropped_s: f64,
}

#[derive(Clone, Copy, Debug)]
pub struct RealtimePacer {
    dt_s: f64,
    max_acceleration: f64,
    max_ticks_per_frame: u32,
    carry_s: f64,
}

impl RealtimePacer {
    pub fn new(dt_s: f64, max_acceleration: f64, max_ticks_per_frame: u32) -> SimResult<Self> {
        if !(dt_s.is_finite() && dt_s > 0.0) {
            return Err(SimError::InvalidArg {
                what: "dt must be positive",
            });
        }
        if !(max_acceleration.is_finite() && max_acceleration > 0.0) {
            return Err(SimError::InvalidArg {
                what: "max acceleration must be positive",
            });
        }
        if max_ticks_per_frame == 0 {
            return Err(SimError::InvalidArg {
                what: "max ticks per frame must be positive",
            });
        }
        Ok(Self {
            dt_s,
            max_acceleration,
            max_ticks_per_frame,
            carry_s: 0.0,
        })
    }

    pub fn plan(&mut self, wall_elapsed_s: f64, requested_acceleration: f64) -> FramePlan {
        let acceleration = if requested_acceleration.is_finite() {
            requested_acceleration.clamp(0.0, self.max_acceleration)
        } else {
            0.0
        };
        let wall = if wall_elapsed_s.is_finite() {
            wall_elapsed_s.max(0.0)
        } else {
            0.0
        };
        let budget = self.carry_s + wall * acceleration;
        let whole = (budget / self.dt_s).floor();
        let ticks = whole.min(self.max_ticks_per_frame as f64);
        let dropped_s = (whole - ticks) * self.dt_s;
        self.carry_s = budget - whole * self.dt_s;
        FramePlan {
            ticks: ticks as u32,
            acceleration,
            dropped_s,
        }
    }

    pub fn reset(&mut self) {
        self.carry_s = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn carries_fractional_ticks() {
        let mut pacer = RealtimePacer::new(0.5, 50.0, 1_000).unwrap();
        // 0.1 s frames at 3x: 0.3 s of sim per frame
        let ticks: u32 = (0..10).map(|_| pacer.plan(0.1, 3.0).ticks).sum();
        assert_eq!(ticks, 6);
    }

    #[test]
    fn clamps_acceleration_and_tick_count() {
        let mut pacer = RealtimePacer::new(0.5, 50.0, 20).unwrap();
        let plan = pacer.plan(1.0, 500.0);
        assert_eq!(plan.acceleration, 50.0);
        assert_eq!(plan.ticks, 20);
        // 50 s of budget is 100 ticks; 80 of them do not fit under the cap
        assert!((plan.dropped_s - 40.0).abs() < 1e-9);
        assert_eq!(pacer.plan(0.0, 1.0).ticks, 0);
    }

    #[test]
    fn paused_runs_nothing() {
        let mut pacer = RealtimePacer::new(0.5, 50.0, 20).unwrap();
        assert_eq!(pacer.plan(1.0, 0.0).ticks, 0);
        assert_eq!(pacer.plan(1.0, f64::NAN).ticks, 0);
        assert!(RealtimePacer::new(0.0, 1.0, 1).is_err());
    }
}
