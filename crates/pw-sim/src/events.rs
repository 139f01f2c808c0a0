//! Append-only event log.
//!
//! Fixed capacity, oldest entries evicted first. Every append is mirrored
//! to `tracing` at the matching level.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tracing::{error, info, warn};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Info,
    Action,
    Alert,
    Alarm,
}

impl Severity {
    pub fn name(self) -> &'static str {
        match self {
            Severity::Info => "INFO",
            Severity::Action => "ACTION",
            Severity::Alert => "ALERT",
            Severity::Alarm => "ALARM",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub tick: u64,
    pub sim_time_s: f64,
    pub severity: Severity,
    pub message: String,
}

#[derive(Clone, Debug)]
pub struct EventLog {
    entries: VecDeque<Event>,
    capacity: usize,
    appended: u64,
}

impl EventLog {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
            appended: 0,
        }
    }

    pub fn push(
        &mut self,
        tick: u64,
        sim_time_s: f64,
        severity: Severity,
        message: impl Into<String>,
    ) {
        let message = message.into();
        match severity {
            Severity::Info | Severity::Action => {
                info!(tick, sim_time_s, severity = severity.name(), "{message}")
            }
            Severity::Alert => warn!(tick, sim_time_s, severity = severity.name(), "{message}"),
            Severity::Alarm => error!(tick, sim_time_s, severity = severity.name(), "{message}"),
        }
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(Event {
            tick,
            sim_time_s,
            severity,
            message,
        });
        self.appended += 1;
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Appends since creation, including evicted entries.
    pub fn total_appended(&self) -> u64 {
        self.appended
    }

    pub fn iter(&self) -> impl Iterator<Item = &Event> {
        self.entries.iter()
    }

    pub fn last(&self) -> Option<&Event> {
        self.entries.back()
    }

    /// Entries appended after the first `seen` appends (those still retained).
    pub fn since(&self, seen: u64) -> impl Iterator<Item = &Event> {
        let evicted = self.appended - self.entries.len() as u64;
        let skip = seen.saturating_sub(evicted) as usize;
        self.entries.iter().skip(skip)
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.entries.iter().filter(|e| e.severity == severity).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evicts_oldest_first() {
        let mut log = EventLog::new(3);
        for i in 0..5 {
            log.push(i, i as f64, Severity::Info, format!("event {i}"));
        }
        assert_eq!(log.len(), 3);
        assert_eq!(log.total_appended(), 5);
        let ticks: Vec<u64> = log.iter().map(|e| e.tick).collect();
        assert_eq!(ticks, vec![2, 3, 4]);
    }

    #[test]
    fn since_skips_seen_entries() {
        let mut log = EventLog::new(4);
        for i in 0..6 {
            log.push(i, 0.0, Severity::Alert, "x");
        }
        let fresh: Vec<u64> = log.since(4).map(|e| e.tick).collect();
        assert_eq!(fresh, vec![4, 5]);
        let all: Vec<u64> = log.since(0).map(|e| e.tick).collect();
        assert_eq!(all, vec![2, 3, 4, 5]);
    }

    #[test]
    fn counts_by_severity() {
        let mut log = EventLog::new(8);
        log.push(0, 0.0, Severity::Action, "a");
        log.push(1, 0.5, Severity::Alarm, "b");
        log.push(2, 1.0, Severity::Alarm, "c");
        assert_eq!(log.count(Severity::Alarm), 2);
        assert_eq!(log.last().map(|e| e.message.as_str()), Some("c"));
        assert!(Severity::Alarm > Severity::Alert);
    }
}
