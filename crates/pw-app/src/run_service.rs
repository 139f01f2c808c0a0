//! Run execution and caching service.

use pw_results::{
    AlarmTotals, EventRecord, ForensicsDumpEntry, RunManifest, RunStore, TelemetryRecord,
};
use pw_scenario::Scenario;
use pw_sim::{Event, SimOptions, Simulator, TelemetrySnapshot, run_sim_with};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::info;

use crate::error::{AppError, AppResult};
use crate::progress::{HeatupProgress, RunProgressEvent, RunStage};
use crate::scenario_service;

/// Number of progress updates emitted over a run.
const PROGRESS_STEPS: u64 = 50;

#[derive(Debug, Clone)]
pub struct RunOptions {
    pub use_cache: bool,
    pub solver_version: String,
    /// Overrides the scenario end time
    pub t_end_s: Option<f64>,
    /// Overrides the scenario forensics output directory
    pub forensics_dir: Option<PathBuf>,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            use_cache: true,
            solver_version: env!("CARGO_PKG_VERSION").to_string(),
            t_end_s: None,
            forensics_dir: None,
        }
    }
}

pub struct RunRequest<'a> {
    pub scenario_path: &'a Path,
    pub options: RunOptions,
}

#[derive(Debug, Clone, Default)]
pub struct RunTimingSummary {
    pub load_time_s: f64,
    pub simulate_time_s: f64,
    pub save_time_s: f64,
    pub load_cache_time_s: f64,
    pub total_time_s: f64,
    pub ticks: u64,
    pub records: usize,
    pub events: usize,
}

#[derive(Debug, Clone)]
pub struct RunResponse {
    pub run_id: String,
    pub manifest: RunManifest,
    pub loaded_from_cache: bool,
    pub timing: RunTimingSummary,
}

fn emit_progress(
    progress_cb: &mut Option<&mut dyn FnMut(RunProgressEvent)>,
    stage: RunStage,
    started: Instant,
    message: Option<String>,
    heatup: Option<HeatupProgress>,
) {
    if let Some(cb) = progress_cb.as_deref_mut() {
        cb(RunProgressEvent {
            stage,
            elapsed_wall_s: started.elapsed().as_secs_f64(),
            message,
            heatup,
        });
    }
}

/// Execute a scenario or load its cached run.
pub fn ensure_run(request: &RunRequest) -> AppResult<RunResponse> {
    ensure_run_with_progress(request, None)
}

/// Execute or load a run and stream progress events.
pub fn ensure_run_with_progress(
    request: &RunRequest,
    mut progress_cb: Option<&mut dyn FnMut(RunProgressEvent)>,
) -> AppResult<RunResponse> {
    let started = Instant::now();
    let mut timing = RunTimingSummary::default();

    emit_progress(
        &mut progress_cb,
        RunStage::LoadingScenario,
        started,
        Some("Loading scenario".to_string()),
        None,
    );
    let mut scenario = scenario_service::load_scenario(request.scenario_path)?;
    apply_overrides(&mut scenario, &request.options)?;
    timing.load_time_s = started.elapsed().as_secs_f64();

    emit_progress(
        &mut progress_cb,
        RunStage::CheckingCache,
        started,
        Some("Checking run cache".to_string()),
        None,
    );
    let run_id = pw_results::compute_run_id(&scenario, &request.options.solver_version);
    let store = RunStore::for_scenario(request.scenario_path)?;

    if request.options.use_cache && store.has_run(&run_id) {
        emit_progress(
            &mut progress_cb,
            RunStage::LoadingCachedResult,
            started,
            Some("Loading cached run".to_string()),
            None,
        );
        let load_started = Instant::now();
        let manifest = store.load_manifest(&run_id)?;
        timing.load_cache_time_s = load_started.elapsed().as_secs_f64();
        timing.ticks = manifest.ticks;
        timing.total_time_s = started.elapsed().as_secs_f64();
        info!(run_id = %run_id, "loaded cached run");

        emit_progress(
            &mut progress_cb,
            RunStage::Completed,
            started,
            Some("Loaded cached run".to_string()),
            None,
        );
        return Ok(RunResponse {
            run_id,
            manifest,
            loaded_from_cache: true,
            timing,
        });
    }

    let manifest = execute_run(
        &scenario,
        &store,
        &run_id,
        &request.options.solver_version,
        &mut progress_cb,
        started,
        &mut timing,
    )?;
    timing.total_time_s = started.elapsed().as_secs_f64();

    emit_progress(
        &mut progress_cb,
        RunStage::Completed,
        started,
        Some("Run completed".to_string()),
        None,
    );

    Ok(RunResponse {
        run_id,
        manifest,
        loaded_from_cache: false,
        timing,
    })
}

/// Apply command-line overrides and re-validate.
fn apply_overrides(scenario: &mut Scenario, options: &RunOptions) -> AppResult<()> {
    if let Some(t_end_s) = options.t_end_s {
        scenario.plant.time.t_end_s = t_end_s;
    }
    if let Some(dir) = &options.forensics_dir {
        scenario.plant.forensics.output_dir = Some(dir.to_string_lossy().into_owned());
    }
    pw_scenario::validate_scenario(scenario)?;
    Ok(())
}

fn execute_run(
    scenario: &Scenario,
    store: &RunStore,
    run_id: &str,
    solver_version: &str,
    progress_cb: &mut Option<&mut dyn FnMut(RunProgressEvent)>,
    started: Instant,
    timing: &mut RunTimingSummary,
) -> AppResult<RunManifest> {
    emit_progress(
        progress_cb,
        RunStage::BuildingPlant,
        started,
        Some("Building plant".to_string()),
        None,
    );
    let mut sim = Simulator::new(scenario.plant.clone())?;
    let opts = SimOptions::from_time(&scenario.plant.time);
    let t_end_s = opts.t_end_s;
    let dt = sim.dt();
    let total_ticks = ((t_end_s / dt).round() as u64).max(1);
    let progress_every = (total_ticks / PROGRESS_STEPS).max(1);

    emit_progress(
        progress_cb,
        RunStage::Running,
        started,
        Some(format!("Simulating {t_end_s} s at dt {dt} s")),
        None,
    );
    let schedule = scenario.sorted_schedule();
    let mut next_flow = 0;
    let sim_started = Instant::now();
    let run = run_sim_with(&mut sim, &opts, |sim| {
        let now = sim.time_s();
        while let Some(flow) = schedule.get(next_flow) {
            if flow.at_s > now + 0.5 * dt {
                break;
            }
            sim.queue_boundary_flow(flow.delta_lb, flow.source.into())?;
            next_flow += 1;
        }
        let tick = sim.tick_count();
        if tick % progress_every == 0 {
            emit_progress(
                progress_cb,
                RunStage::Running,
                started,
                None,
                Some(HeatupProgress {
                    sim_time_s: now,
                    t_end_s,
                    fraction_complete: (now / t_end_s).clamp(0.0, 1.0),
                    tick,
                    mode: sim.mode().to_string(),
                }),
            );
        }
        Ok(())
    })?;
    timing.simulate_time_s = sim_started.elapsed().as_secs_f64();
    timing.ticks = run.ticks;
    timing.records = run.records.len();
    timing.events = run.events.len();

    let records: Vec<TelemetryRecord> = run.records.iter().map(to_telemetry_record).collect();
    let events: Vec<EventRecord> = run.events.iter().map(to_event_record).collect();

    let counts = sim.alarm_counts();
    let manifest = RunManifest {
        run_id: run_id.to_string(),
        scenario_id: scenario.id.clone(),
        scenario_name: scenario.name.clone(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        solver_version: solver_version.to_string(),
        dt_s: dt,
        t_end_s,
        ticks: run.ticks,
        final_mode: sim.mode().to_string(),
        alarms: AlarmTotals {
            conservation: counts.conservation,
            non_convergence: counts.non_convergence,
            invariant: counts.invariant,
        },
        forensics_dumps: run
            .dumps
            .iter()
            .map(|d| ForensicsDumpEntry {
                trigger: d.trigger.name().to_string(),
                tick: d.tick,
                sim_time_s: d.sim_time_s,
                location: d.location.clone(),
            })
            .collect(),
    };

    emit_progress(
        progress_cb,
        RunStage::SavingResults,
        started,
        Some("Saving run output".to_string()),
        None,
    );
    let save_started = Instant::now();
    store.save_run(&manifest, &records, &events)?;
    timing.save_time_s = save_started.elapsed().as_secs_f64();
    info!(
        run_id = %run_id,
        ticks = run.ticks,
        final_mode = %manifest.final_mode,
        "run saved"
    );

    Ok(manifest)
}

/// Flatten a snapshot into named scalar columns.
pub fn to_telemetry_record(snapshot: &TelemetrySnapshot) -> TelemetryRecord {
    let mut values = BTreeMap::new();
    for name in TelemetrySnapshot::SCALARS {
        if let Some(v) = snapshot.scalar(name) {
            values.insert(name.to_string(), v);
        }
    }
    let nodes = snapshot.sg_node_count as usize;
    for (i, (t, blend)) in snapshot
        .sg_node_temp_f
        .iter()
        .zip(snapshot.sg_node_blend.iter())
        .take(nodes)
        .enumerate()
    {
        values.insert(format!("sg{i}_temp_f"), *t as f64);
        values.insert(format!("sg{i}_blend"), *blend as f64);
    }
    TelemetryRecord {
        tick: snapshot.tick,
        time_s: snapshot.sim_time_s,
        regime: snapshot.regime.name().to_string(),
        bubble_phase: snapshot.bubble_phase.name().to_string(),
        values,
    }
}

pub fn to_event_record(event: &Event) -> EventRecord {
    EventRecord {
        tick: event.tick,
        sim_time_s: event.sim_time_s,
        severity: event.severity.name().to_string(),
        message: event.message.clone(),
    }
}

/// Runs stored for a scenario, most recent first.
pub fn list_runs(scenario_path: &Path) -> AppResult<Vec<RunManifest>> {
    let scenario = scenario_service::load_scenario(scenario_path)?;
    let store = RunStore::for_scenario(scenario_path)?;

    let mut runs = store.list_runs(&scenario.id)?;
    runs.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    Ok(runs)
}

pub fn load_run(
    scenario_path: &Path,
    run_id: &str,
) -> AppResult<(RunManifest, Vec<TelemetryRecord>)> {
    let store = RunStore::for_scenario(scenario_path)?;

    let manifest = store.load_manifest(run_id)?;
    let records = store.load_telemetry(run_id)?;

    Ok((manifest, records))
}

pub fn load_events(scenario_path: &Path, run_id: &str) -> AppResult<Vec<EventRecord>> {
    let store = RunStore::for_scenario(scenario_path)?;
    if !store.has_run(run_id) {
        return Err(AppError::RunNotFound(run_id.to_string()));
    }
    Ok(store.load_events(run_id)?)
}
