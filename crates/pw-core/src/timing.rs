//! Wall-clock accounting for the tick phases.
//!
//! Off by default so the hot loop pays one relaxed load per timer. Turned
//! on with `PW_TIMING` in the environment or [`enable_timing`].

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Instant;

static ENABLED: AtomicBool = AtomicBool::new(false);

pub fn enable_timing() {
    ENABLED.store(true, Ordering::Relaxed);
}

pub fn is_enabled() -> bool {
    ENABLED.load(Ordering::Relaxed) || std::env::var_os("PW_TIMING").is_some()
}

/// Stopwatch for one phase of one tick.
pub struct Timer {
    started: Option<Instant>,
}

impl Timer {
    /// `label` names the phase at the call site; only the bucket passed to
    /// [`Timer::stop_into`] is recorded.
    pub fn start(_label: &'static str) -> Self {
        Self {
            started: is_enabled().then(Instant::now),
        }
    }

    pub fn stop_into(self, bucket: &AccumulatingTimer) {
        if let Some(started) = self.started {
            bucket.record(started.elapsed().as_secs_f64());
        }
    }
}

/// Lock-free running total for one phase across every tick of a run.
pub struct AccumulatingTimer {
    total_ns: AtomicU64,
    count: AtomicU64,
}

impl Default for AccumulatingTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl AccumulatingTimer {
    pub const fn new() -> Self {
        Self {
            total_ns: AtomicU64::new(0),
            count: AtomicU64::new(0),
        }
    }

    pub fn record(&self, elapsed_s: f64) {
        self.total_ns
            .fetch_add((elapsed_s * 1e9) as u64, Ordering::Relaxed);
        self.count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn total_seconds(&self) -> f64 {
        self.total_ns.load(Ordering::Relaxed) as f64 * 1e-9
    }

    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }

    pub fn average_seconds(&self) -> f64 {
        match self.count() {
            0 => 0.0,
            n => self.total_seconds() / n as f64,
        }
    }

    pub fn reset(&self) {
        self.total_ns.store(0, Ordering::Relaxed);
        self.count.store(0, Ordering::Relaxed);
    }
}

/// One bucket per phase of `Simulator::tick`.
pub mod tick_timing {
    use super::AccumulatingTimer;

    /// Charging, letdown, seals, relief, makeup and heater input
    pub static BOUNDARY: AccumulatingTimer = AccumulatingTimer::new();
    pub static CLOSURE: AccumulatingTimer = AccumulatingTimer::new();
    /// Node update, blend ramp and delta clamp
    pub static STEAM_GENERATOR: AccumulatingTimer = AccumulatingTimer::new();
    pub static REGIME: AccumulatingTimer = AccumulatingTimer::new();
    pub static FORENSICS: AccumulatingTimer = AccumulatingTimer::new();
    pub static TICK: AccumulatingTimer = AccumulatingTimer::new();

    const PHASES: [(&str, &AccumulatingTimer); 6] = [
        ("boundary", &BOUNDARY),
        ("closure", &CLOSURE),
        ("steam generator", &STEAM_GENERATOR),
        ("regime", &REGIME),
        ("forensics", &FORENSICS),
        ("whole tick", &TICK),
    ];

    pub fn print_summary() {
        if !super::is_enabled() {
            return;
        }
        println!("\nTick phases:");
        for (phase, bucket) in PHASES.iter().filter(|(_, b)| b.count() > 0) {
            println!(
                "  {phase:<16} {:>9} ticks  {:>8.3} s  {:>8.4} ms/tick",
                bucket.count(),
                bucket.total_seconds(),
                bucket.average_seconds() * 1e3
            );
        }
    }
}

/// Run-level wall-clock figures reported by the CLI.
#[derive(Default)]
pub struct PerfStats {
    pub load_time_s: f64,
    pub run_time_s: f64,
    pub ticks: u64,
    pub save_time_s: f64,
}

impl PerfStats {
    /// Prints nothing unless timing is enabled.
    pub fn print_summary(&self) {
        if !is_enabled() {
            return;
        }
        println!("\nWall clock:");
        println!("  scenario load  {:>8.3} s", self.load_time_s);
        if self.ticks > 0 {
            println!(
                "  simulate       {:>8.3} s over {} ticks ({:.4} ms/tick)",
                self.run_time_s,
                self.ticks,
                self.run_time_s * 1e3 / self.ticks as f64
            );
        }
        if self.save_time_s > 0.0 {
            println!("  save run       {:>8.3} s", self.save_time_s);
        }
        tick_timing::print_summary();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bucket_tracks_mean_and_resets() {
        let bucket = AccumulatingTimer::new();
        bucket.record(0.002);
        bucket.record(0.004);
        assert_eq!(bucket.count(), 2);
        assert!((bucket.average_seconds() - 0.003).abs() < 1e-9);
        bucket.reset();
        assert_eq!(bucket.count(), 0);
        assert_eq!(bucket.average_seconds(), 0.0);
    }

    #[test]
    fn enabled_timer_records_into_bucket() {
        enable_timing();
        let bucket = AccumulatingTimer::new();
        Timer::start("test").stop_into(&bucket);
        assert_eq!(bucket.count(), 1);
    }
}
