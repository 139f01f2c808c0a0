use clap::{Parser, Subcommand};
use pw_app::{
    AppResult, RunOptions, RunProgressEvent, RunRequest, RunStage, query, run_service,
    scenario_service,
};
use pw_core::timing::PerfStats;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "pw-cli")]
#[command(about = "Primary-loop heat-up simulator", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a scenario file
    Validate {
        /// Path to the scenario YAML or JSON file
        scenario_path: PathBuf,
    },
    /// Run a heat-up scenario
    Run {
        /// Path to the scenario YAML or JSON file
        scenario_path: PathBuf,
        /// End time in simulated seconds, overriding the scenario
        #[arg(long)]
        t_end: Option<f64>,
        /// Tick the scenario even when a stored run matches
        #[arg(long)]
        no_cache: bool,
        /// Write forensics CSV dumps to this directory
        #[arg(long)]
        forensics_dir: Option<PathBuf>,
        /// Print the per-phase tick time breakdown
        #[arg(long)]
        timing: bool,
    },
    /// List cached runs for a scenario
    Runs {
        /// Path to the scenario file
        scenario_path: PathBuf,
    },
    /// Summarize a stored run
    ShowRun {
        /// Path to the scenario file
        scenario_path: PathBuf,
        /// Run ID to display
        run_id: String,
    },
    /// Export one telemetry variable from a run as CSV
    ExportSeries {
        /// Path to the scenario file
        scenario_path: PathBuf,
        /// Run ID
        run_id: String,
        /// Variable name (e.g., pressure_psia, rcs_temp_f, sg_heat_mw)
        variable: String,
        /// Write the CSV here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Print the event log of a run
    Events {
        /// Path to the scenario file
        scenario_path: PathBuf,
        /// Run ID
        run_id: String,
        /// Lowest severity shown (INFO, ACTION, ALERT, ALARM)
        #[arg(long, default_value = "INFO")]
        min_severity: String,
    },
}

fn main() -> AppResult<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Validate { scenario_path } => cmd_validate(&scenario_path),
        Commands::Run {
            scenario_path,
            t_end,
            no_cache,
            forensics_dir,
            timing,
        } => {
            if timing {
                pw_core::timing::enable_timing();
            }
            cmd_run(&scenario_path, t_end, !no_cache, forensics_dir)
        }
        Commands::Runs { scenario_path } => cmd_runs(&scenario_path),
        Commands::ShowRun {
            scenario_path,
            run_id,
        } => cmd_show_run(&scenario_path, &run_id),
        Commands::ExportSeries {
            scenario_path,
            run_id,
            variable,
            output,
        } => cmd_export_series(&scenario_path, &run_id, &variable, output.as_deref()),
        Commands::Events {
            scenario_path,
            run_id,
            min_severity,
        } => cmd_events(&scenario_path, &run_id, &min_severity),
    }
}

fn cmd_validate(scenario_path: &Path) -> AppResult<()> {
    println!("Validating scenario: {}", scenario_path.display());
    let scenario = scenario_service::load_scenario(scenario_path)?;
    let summary = scenario_service::summarize(&scenario);
    println!("✓ Scenario is valid");
    println!("  {} - {} (version {})", summary.id, summary.name, summary.version);
    println!(
        "  dt = {:.3} s, t_end = {:.1} s ({} ticks)",
        summary.dt_s, summary.t_end_s, summary.ticks
    );
    println!("  SG nodes: {}", summary.sg_nodes);
    println!("  Scheduled flows: {}", summary.scheduled_flows);
    Ok(())
}

fn cmd_run(
    scenario_path: &Path,
    t_end: Option<f64>,
    use_cache: bool,
    forensics_dir: Option<PathBuf>,
) -> AppResult<()> {
    println!("Running scenario: {}", scenario_path.display());

    let request = RunRequest {
        scenario_path,
        options: RunOptions {
            use_cache,
            t_end_s: t_end,
            forensics_dir,
            ..RunOptions::default()
        },
    };

    let mut last_emit = Instant::now();
    let mut last_fraction = -1.0f64;
    let response = run_service::ensure_run_with_progress(
        &request,
        Some(&mut |event| {
            let fraction = event
                .heatup
                .as_ref()
                .map(|h| h.fraction_complete)
                .unwrap_or(-1.0);
            let emit_now = (fraction >= 0.0 && (fraction - last_fraction).abs() >= 0.005)
                || last_emit.elapsed().as_millis() >= 100;
            if emit_now {
                render_cli_progress(&event);
                if fraction >= 0.0 {
                    last_fraction = fraction;
                }
                last_emit = Instant::now();
            }
        }),
    )?;
    clear_progress_line();

    let origin = if response.loaded_from_cache { "cached" } else { "simulated" };
    println!("✓ Run {} ({origin})", response.run_id);

    let manifest = &response.manifest;
    println!("  Final mode: {}", manifest.final_mode);
    println!("  Ticks: {} at dt = {:.3} s", manifest.ticks, manifest.dt_s);
    println!(
        "  Alarms: conservation={} non_convergence={} invariant={}",
        manifest.alarms.conservation, manifest.alarms.non_convergence, manifest.alarms.invariant
    );
    for dump in &manifest.forensics_dumps {
        println!(
            "  Forensics: {} at t={:.1}s -> {}",
            dump.trigger, dump.sim_time_s, dump.location
        );
    }

    let timing = &response.timing;
    println!("\nWall time:");
    println!("  Load:     {:.3}s", timing.load_time_s);
    if timing.load_cache_time_s > 0.0 {
        println!("  Cached:   {:.3}s", timing.load_cache_time_s);
    } else {
        println!("  Simulate: {:.3}s", timing.simulate_time_s);
        println!("  Save:     {:.3}s", timing.save_time_s);
    }
    println!("  Total:    {:.3}s", timing.total_time_s);

    PerfStats {
        load_time_s: timing.load_time_s,
        run_time_s: timing.simulate_time_s,
        ticks: timing.ticks,
        save_time_s: timing.save_time_s,
    }
    .print_summary();

    Ok(())
}

fn clear_progress_line() {
    print!("\r{:140}\r", "");
    let _ = io::stdout().flush();
}

fn render_cli_progress(event: &RunProgressEvent) {
    const BAR: usize = 28;
    let line = match (event.stage, &event.heatup) {
        (RunStage::Running, Some(h)) => {
            let filled = ((h.fraction_complete * BAR as f64).round() as usize).min(BAR);
            format!(
                "\r[{:#<filled$}{:-<rest$}] {:>6.2}%  t={:.0}/{:.0}s  tick={}  {}  wall={:.1}s",
                "",
                "",
                h.fraction_complete * 100.0,
                h.sim_time_s,
                h.t_end_s,
                h.tick,
                h.mode,
                event.elapsed_wall_s,
                rest = BAR - filled,
            )
        }
        _ => format!(
            "\r.. {}  wall={:.2}s  {}",
            event.stage.label(),
            event.elapsed_wall_s,
            event.message.as_deref().unwrap_or(""),
        ),
    };
    print!("{line}");
    let _ = io::stdout().flush();
}

fn cmd_runs(scenario_path: &Path) -> AppResult<()> {
    let runs = run_service::list_runs(scenario_path)?;

    if runs.is_empty() {
        println!("No stored runs beside {}", scenario_path.display());
    } else {
        println!("Stored runs beside {}:", scenario_path.display());
        for manifest in runs {
            println!(
                "  {} ({}, {} ticks, {})",
                manifest.run_id, manifest.timestamp, manifest.ticks, manifest.final_mode
            );
        }
    }
    Ok(())
}

fn cmd_show_run(scenario_path: &Path, run_id: &str) -> AppResult<()> {
    let (manifest, records) = run_service::load_run(scenario_path, run_id)?;
    let summary = query::get_run_summary(&records)?;

    println!("Run {run_id}");
    println!("  Scenario: {} ({})", manifest.scenario_name, manifest.scenario_id);
    println!("  Recorded: {}", manifest.timestamp);
    println!("  Records: {}", summary.record_count);
    println!(
        "  Time range: {:.1} - {:.1} s",
        summary.time_range.0, summary.time_range.1
    );
    println!("  Final mode: {}", summary.final_mode);

    println!("\nMode timeline:");
    for (t, mode) in query::mode_timeline(&records) {
        println!("  {:>10.1} s  {}", t, mode);
    }

    println!("\nVariables:");
    for name in query::list_variables(&records) {
        println!("  {}", name);
    }

    Ok(())
}

fn cmd_export_series(
    scenario_path: &Path,
    run_id: &str,
    variable: &str,
    output: Option<&Path>,
) -> AppResult<()> {
    let (_manifest, records) = run_service::load_run(scenario_path, run_id)?;
    let series = query::extract_series(&records, variable)?;

    let csv: String = std::iter::once(format!("time_s,{variable}\n"))
        .chain(series.iter().map(|(t, v)| format!("{t},{v}\n")))
        .collect();

    match output {
        Some(path) => {
            std::fs::write(path, &csv)?;
            println!("✓ {} samples of {variable} -> {}", series.len(), path.display());
        }
        None => print!("{csv}"),
    }

    Ok(())
}

fn cmd_events(scenario_path: &Path, run_id: &str, min_severity: &str) -> AppResult<()> {
    let events = run_service::load_events(scenario_path, run_id)?;
    let shown = query::filter_events(&events, min_severity)?;

    for event in &shown {
        println!(
            "{:>10} {:>10.1}s  {:<6}  {}",
            event.tick, event.sim_time_s, event.severity, event.message
        );
    }
    println!("{} of {} events", shown.len(), events.len());
    Ok(())
}
