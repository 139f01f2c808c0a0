//! Forensics recorder.
//!
//! Every tick writes one snapshot into the ring. When a trigger fires and
//! the cooldown has elapsed, the whole ring is rendered to CSV and handed
//! to the sink. A sink failure degrades the recorder: it keeps filling the
//! ring but stops dumping, and the simulation carries on.

pub mod ring;
pub mod sink;
pub mod snapshot;

pub use ring::ForensicsRing;
pub use sink::{FileSink, ForensicsSink, MemoryDumps, MemorySink, StoredDump};
pub use snapshot::{ForensicsSnapshot, NodeSample};

use crate::config::ForensicsConfig;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Write;
use tracing::info;
use uuid::Uuid;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Trigger {
    RegimeChange,
    HeatRateSpike,
    DrainStart,
    DrainStop,
    ConservationAlarm,
}

impl Trigger {
    pub fn name(self) -> &'static str {
        match self {
            Trigger::RegimeChange => "regime_change",
            Trigger::HeatRateSpike => "heat_rate_spike",
            Trigger::DrainStart => "drain_start",
            Trigger::DrainStop => "drain_stop",
            Trigger::ConservationAlarm => "conservation_alarm",
        }
    }
}

/// A dump that reached the sink.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DumpRecord {
    pub trigger: Trigger,
    pub tick: u64,
    pub sim_time_s: f64,
    pub rows: usize,
    pub location: String,
}

#[derive(Clone, Debug, PartialEq)]
pub enum RecordOutcome {
    Recorded,
    Dumped(DumpRecord),
    /// Trigger fired inside the cooldown window
    Suppressed(Trigger),
    /// Sink failed; the recorder is now degraded
    Failed { trigger: Trigger, message: String },
}

pub struct ForensicsRecorder {
    ring: ForensicsRing,
    sink: Box<dyn ForensicsSink>,
    enabled: bool,
    cooldown_s: f64,
    delta_mw_threshold: f64,
    node_count: usize,
    session: Uuid,
    last_dump_s: Option<f64>,
    degraded: bool,
    suppressed: u64,
    dumps: Vec<DumpRecord>,
}

impl std::fmt::Debug for ForensicsRecorder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ForensicsRecorder")
            .field("capacity", &self.ring.capacity())
            .field("len", &self.ring.len())
            .field("enabled", &self.enabled)
            .field("degraded", &self.degraded)
            .field("dumps", &self.dumps.len())
            .finish()
    }
}

impl ForensicsRecorder {
    pub fn new(config: &ForensicsConfig, node_count: usize, sink: Box<dyn ForensicsSink>) -> Self {
        Self {
            ring: ForensicsRing::new(config.capacity),
            sink,
            enabled: config.enabled,
            cooldown_s: config.cooldown_s,
            delta_mw_threshold: config.delta_mw_threshold,
            node_count,
            session: Uuid::new_v4(),
            last_dump_s: None,
            degraded: false,
            suppressed: 0,
            dumps: Vec::new(),
        }
    }

    pub fn ring(&self) -> &ForensicsRing {
        &self.ring
    }

    pub fn session(&self) -> Uuid {
        self.session
    }

    pub fn is_degraded(&self) -> bool {
        self.degraded
    }

    pub fn dumps(&self) -> &[DumpRecord] {
        &self.dumps
    }

    pub fn suppressed(&self) -> u64 {
        self.suppressed
    }

    /// Which trigger, if any, `current` raises against the previous tick.
    pub fn evaluate(
        &self,
        previous: &ForensicsSnapshot,
        current: &ForensicsSnapshot,
    ) -> Option<Trigger> {
        use crate::state::BubblePhase::Drain;
        if current.alarms.conservation && !previous.alarms.conservation {
            Some(Trigger::ConservationAlarm)
        } else if current.regime != previous.regime {
            Some(Trigger::RegimeChange)
        } else if current.bubble_phase == Drain && previous.bubble_phase != Drain {
            Some(Trigger::DrainStart)
        } else if previous.bubble_phase == Drain && current.bubble_phase != Drain {
            Some(Trigger::DrainStop)
        } else if current.sg_delta_mw.abs() > self.delta_mw_threshold {
            Some(Trigger::HeatRateSpike)
        } else {
            None
        }
    }

    /// Record one tick and dump if a trigger fires.
    pub fn record(&mut self, snapshot: &ForensicsSnapshot) -> RecordOutcome {
        if !self.enabled {
            return RecordOutcome::Recorded;
        }
        let previous = self.ring.newest().copied();
        self.ring.push(snapshot);

        let Some(previous) = previous else {
            return RecordOutcome::Recorded;
        };
        let Some(trigger) = self.evaluate(&previous, snapshot) else {
            return RecordOutcome::Recorded;
        };
        if self.degraded {
            return RecordOutcome::Recorded;
        }
        if let Some(last) = self.last_dump_s {
            if snapshot.sim_time_s - last < self.cooldown_s {
                self.suppressed += 1;
                return RecordOutcome::Suppressed(trigger);
            }
        }
        self.dump(trigger, snapshot.tick, snapshot.sim_time_s, Utc::now())
    }

    fn dump(
        &mut self,
        trigger: Trigger,
        tick: u64,
        sim_time_s: f64,
        wall: DateTime<Utc>,
    ) -> RecordOutcome {
        let contents = self.render(trigger, tick, sim_time_s, wall);
        let file_name = format!(
            "forensics_{}_t{}_{}.csv",
            wall.format("%Y%m%d_%H%M%S"),
            tick,
            trigger.name()
        );
        self.last_dump_s = Some(sim_time_s);
        match self.sink.write_dump(&file_name, &contents) {
            Ok(location) => {
                info!(
                    trigger = trigger.name(),
                    tick,
                    location = %location,
                    "forensics dump written"
                );
                let record = DumpRecord {
                    trigger,
                    tick,
                    sim_time_s,
                    rows: self.ring.len(),
                    location,
                };
                self.dumps.push(record.clone());
                RecordOutcome::Dumped(record)
            }
            Err(e) => {
                self.degraded = true;
                RecordOutcome::Failed {
                    trigger,
                    message: e.to_string(),
                }
            }
        }
    }

    /// Header lines, column row, then the ring oldest first.
    pub fn render(
        &self,
        trigger: Trigger,
        tick: u64,
        sim_time_s: f64,
        wall: DateTime<Utc>,
    ) -> String {
        let columns = ForensicsSnapshot::column_count(self.node_count);
        let row_len = columns * (snapshot::CELL_WIDTH + 1);
        let mut out = String::with_capacity((self.ring.len() + 2) * row_len);
        let _ = writeln!(out, "# trigger={}", trigger.name());
        let _ = writeln!(out, "# wall_time={}", wall.to_rfc3339());
        let _ = writeln!(out, "# tick={tick}");
        let _ = writeln!(out, "# sim_time_s={sim_time_s:.3}");
        let _ = writeln!(out, "# session={}", self.session);
        ForensicsSnapshot::write_header(&mut out, self.node_count);
        for snap in self.ring.iter() {
            snap.write_row(&mut out);
        }
        out
    }
}
