//! Recoverable runtime alarms.
//!
//! None of these abort a tick. Flags are latched per tick so callers can
//! act on rising edges (forensics trigger, one log entry per episode).

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AlarmKind {
    /// Derived mass would go negative, or ledger drift exceeded tolerance
    ConservationAlarm,
    /// Closure solver ran out of iterations; tick rolled back
    SolverNonConvergence,
    /// Illegal regime/phase combination was requested and rejected
    InvariantViolation,
}

impl AlarmKind {
    pub fn name(self) -> &'static str {
        match self {
            AlarmKind::ConservationAlarm => "ConservationAlarm",
            AlarmKind::SolverNonConvergence => "SolverNonConvergence",
            AlarmKind::InvariantViolation => "InvariantViolation",
        }
    }
}

/// Alarm state raised during one tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlarmFlags {
    pub conservation: bool,
    pub non_convergence: bool,
    pub invariant: bool,
}

impl AlarmFlags {
    pub fn raise(&mut self, kind: AlarmKind) {
        match kind {
            AlarmKind::ConservationAlarm => self.conservation = true,
            AlarmKind::SolverNonConvergence => self.non_convergence = true,
            AlarmKind::InvariantViolation => self.invariant = true,
        }
    }

    pub fn is_raised(&self, kind: AlarmKind) -> bool {
        match kind {
            AlarmKind::ConservationAlarm => self.conservation,
            AlarmKind::SolverNonConvergence => self.non_convergence,
            AlarmKind::InvariantViolation => self.invariant,
        }
    }

    /// Flags raised now that were clear in `previous`.
    pub fn rising_edges(&self, previous: &AlarmFlags) -> AlarmFlags {
        AlarmFlags {
            conservation: self.conservation && !previous.conservation,
            non_convergence: self.non_convergence && !previous.non_convergence,
            invariant: self.invariant && !previous.invariant,
        }
    }

    pub fn any(&self) -> bool {
        self.conservation || self.non_convergence || self.invariant
    }
}

/// Running totals, reported in telemetry.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlarmCounters {
    pub conservation: u64,
    pub non_convergence: u64,
    pub invariant: u64,
}

impl AlarmCounters {
    pub fn count(&mut self, flags: &AlarmFlags) {
        self.conservation += flags.conservation as u64;
        self.non_convergence += flags.non_convergence as u64;
        self.invariant += flags.invariant as u64;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rising_edge_only_once() {
        let mut prev = AlarmFlags::default();
        let mut now = AlarmFlags::default();
        now.raise(AlarmKind::ConservationAlarm);
        assert!(now.rising_edges(&prev).conservation);
        prev = now;
        assert!(!now.rising_edges(&prev).any());
        assert!(now.is_raised(AlarmKind::ConservationAlarm));
        assert!(!now.is_raised(AlarmKind::InvariantViolation));
    }

    #[test]
    fn counters_accumulate_raised_flags() {
        let mut counters = AlarmCounters::default();
        let mut flags = AlarmFlags::default();
        flags.raise(AlarmKind::SolverNonConvergence);
        counters.count(&flags);
        counters.count(&flags);
        assert_eq!(counters.non_convergence, 2);
        assert_eq!(counters.conservation, 0);
    }
}
