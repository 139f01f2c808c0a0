use std::path::PathBuf;

use pw_app::{
    RunOptions, RunProgressEvent, RunRequest, RunStage, query, run_service,
    scenario_service,
};
use pw_results::RunStore;
use pw_scenario::{FlowSourceDef, Scenario, ScheduledFlowDef};

fn temp_scenario(t_end_s: f64) -> (PathBuf, PathBuf) {
    let dir = std::env::temp_dir().join(format!("pw_app_{}", uuid::Uuid::new_v4()));
    std::fs::create_dir_all(&dir).unwrap();
    let mut scenario = Scenario::new("persistence");
    scenario.plant.time.dt_s = 1.0;
    scenario.plant.time.t_end_s = t_end_s;
    scenario.plant.time.record_every_s = 60.0;
    scenario.schedule.push(ScheduledFlowDef {
        at_s: 120.0,
        source: FlowSourceDef::Makeup,
        delta_lb: 40.0,
    });
    let path = dir.join("scenario.yaml");
    pw_scenario::save_yaml(&path, &scenario).unwrap();
    (path, dir)
}

#[test]
fn run_persists_and_is_cached() {
    let (path, dir) = temp_scenario(600.0);

    let request = RunRequest {
        scenario_path: &path,
        options: RunOptions {
            use_cache: true,
            ..RunOptions::default()
        },
    };

    let mut stages = Vec::new();
    let mut progress = |event: RunProgressEvent| stages.push(event.stage);
    let first = run_service::ensure_run_with_progress(&request, Some(&mut progress))
        .expect("run failed");
    assert!(!first.loaded_from_cache);
    assert_eq!(first.manifest.ticks, 600);
    assert_eq!(first.manifest.final_mode, "SolidHeatup/Solid");
    assert!(stages.contains(&RunStage::Running));
    assert_eq!(stages.last(), Some(&RunStage::Completed));

    let second = run_service::ensure_run(&request).expect("cached run failed");
    assert!(second.loaded_from_cache);
    assert_eq!(second.run_id, first.run_id);

    let store = RunStore::for_scenario(&path).unwrap();
    assert!(store.has_run(&first.run_id));
    let runs = run_service::list_runs(&path).unwrap();
    assert_eq!(runs.len(), 1);

    let (manifest, records) = run_service::load_run(&path, &first.run_id).unwrap();
    assert_eq!(manifest, first.manifest);
    // 0, 60, ..., 600
    assert_eq!(records.len(), 11);

    let summary = query::get_run_summary(&records).unwrap();
    assert_eq!(summary.time_range, (0.0, 600.0));
    let pressure = query::extract_series(&records, "pressure_psia").unwrap();
    assert_eq!(pressure.len(), records.len());
    let mass = query::extract_series(&records, "total_mass_lb").unwrap();
    assert!(mass.iter().all(|(_, m)| *m > 0.0));
    assert!(query::list_variables(&records).contains(&"sg0_temp_f".to_string()));

    let events = run_service::load_events(&path, &first.run_id).unwrap();
    assert!(
        events
            .iter()
            .any(|e| e.severity == "ACTION" && e.message.contains("SolidHeatup"))
    );

    std::fs::remove_dir_all(dir).ok();
}

#[test]
fn overrides_change_the_run_id() {
    let (path, dir) = temp_scenario(300.0);

    let base = run_service::ensure_run(&RunRequest {
        scenario_path: &path,
        options: RunOptions::default(),
    })
    .unwrap();
    let shorter = run_service::ensure_run(&RunRequest {
        scenario_path: &path,
        options: RunOptions {
            t_end_s: Some(120.0),
            ..RunOptions::default()
        },
    })
    .unwrap();
    assert_ne!(base.run_id, shorter.run_id);
    assert_eq!(shorter.manifest.ticks, 120);

    let bad = run_service::ensure_run(&RunRequest {
        scenario_path: &path,
        options: RunOptions {
            t_end_s: Some(-5.0),
            ..RunOptions::default()
        },
    });
    assert!(bad.is_err());

    std::fs::remove_dir_all(dir).ok();
}

#[test]
fn missing_scenario_is_reported() {
    let path = std::env::temp_dir().join(format!("pw_app_missing_{}.yaml", uuid::Uuid::new_v4()));
    assert!(matches!(
        scenario_service::load_scenario(&path),
        Err(pw_app::AppError::ScenarioNotFound { .. })
    ));
    assert!(matches!(
        run_service::load_events(&std::env::temp_dir().join("x.yaml"), "nope"),
        Err(pw_app::AppError::RunNotFound(_))
    ));
}
