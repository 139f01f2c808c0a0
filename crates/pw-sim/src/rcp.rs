//! Reactor coolant pump start sequencing.

use crate::config::RcpConfig;
use crate::state::PlantRegime;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum RcpEvent {
    Started { running: u8 },
    /// Low-pressure interlock held a start back
    Refused { pressure_psia: f64 },
}

/// Starts pumps one at a time once the plant is in `RcpStartup`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RcpSequencer {
    running: u8,
    last_start_s: Option<f64>,
    refusal_reported: bool,
}

impl RcpSequencer {
    pub fn running(&self) -> u8 {
        self.running
    }

    /// Advance the sequence; at most one pump starts per call.
    ///
    /// A refusal is reported once per blocked stretch.
    pub fn step(
        &mut self,
        regime: PlantRegime,
        pressure_psia: f64,
        time_s: f64,
        config: &RcpConfig,
    ) -> Option<RcpEvent> {
        if regime != PlantRegime::RcpStartup || self.running >= config.pump_count {
            return None;
        }
        let due = self
            .last_start_s
            .is_none_or(|last| time_s - last >= config.start_interval_s);
        if !due {
            return None;
        }
        if pressure_psia < config.min_start_pressure_psia {
            if self.refusal_reported {
                return None;
            }
            self.refusal_reported = true;
            return Some(RcpEvent::Refused { pressure_psia });
        }
        self.running += 1;
        self.last_start_s = Some(time_s);
        self.refusal_reported = false;
        Some(RcpEvent::Started {
            running: self.running,
        })
    }
}
