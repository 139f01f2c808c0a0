//! Fixed-rate clock in simulated time.
//!
//! Telemetry publishes slower than the physics tick; the clock decides on
//! which ticks it fires.

use crate::error::{ControlError, ControlResult};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SampleConfig {
    /// Seconds between samples
    pub period_s: f64,
}

impl SampleConfig {
    pub fn new(period_s: f64) -> ControlResult<Self> {
        if !(period_s.is_finite() && period_s > 0.0) {
            return Err(ControlError::InvalidArg {
                what: "sample period must be positive",
            });
        }
        Ok(Self { period_s })
    }

    pub fn from_frequency(rate_hz: f64) -> ControlResult<Self> {
        if !(rate_hz.is_finite() && rate_hz > 0.0) {
            return Err(ControlError::InvalidArg {
                what: "sample rate must be positive",
            });
        }
        Self::new(rate_hz.recip())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SampleClock {
    pub config: SampleConfig,
    /// Simulated time at which the next sample is due
    pub due_at_s: f64,
}

impl SampleClock {
    /// Fires first at `start_s`.
    pub fn new(config: SampleConfig, start_s: f64) -> Self {
        Self {
            config,
            due_at_s: start_s,
        }
    }

    /// Fires at most once per call. When ticks are longer than the period,
    /// missed samples are dropped rather than queued.
    pub fn poll(&mut self, now_s: f64) -> bool {
        if now_s < self.due_at_s {
            return false;
        }
        let period = self.config.period_s;
        let skipped = ((now_s - self.due_at_s) / period).floor();
        self.due_at_s += (skipped + 1.0) * period;
        if self.due_at_s <= now_s {
            self.due_at_s += period;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_converts_to_period() {
        let cfg = SampleConfig::from_frequency(10.0).unwrap();
        assert!((cfg.period_s - 0.1).abs() < 1e-12);
    }

    #[test]
    fn rejects_non_positive_period() {
        assert!(SampleConfig::new(0.0).is_err());
        assert!(SampleConfig::from_frequency(-1.0).is_err());
        assert!(SampleConfig::from_frequency(f64::INFINITY).is_err());
    }

    #[test]
    fn fires_at_configured_rate() {
        let mut clock = SampleClock::new(SampleConfig::new(0.2).unwrap(), 0.0);
        let fired = (0..100).filter(|&i| clock.poll(i as f64 * 0.05)).count();
        // 5 s of ticks at a 0.2 s period
        assert!((24..=26).contains(&fired), "fired {fired}");
    }

    #[test]
    fn long_ticks_fire_each_time_without_backlog() {
        let mut clock = SampleClock::new(SampleConfig::from_frequency(10.0).unwrap(), 0.0);
        for i in 0..10 {
            assert!(clock.poll(i as f64 * 0.5));
        }
        assert!(clock.due_at_s - 4.5 <= 0.1 + 1e-9);
        assert!(clock.due_at_s > 4.5);
    }
}
