use pw_results::*;
use std::collections::BTreeMap;

fn temp_store(name: &str) -> (RunStore, std::path::PathBuf) {
    let dir = std::env::temp_dir().join(format!(
        "pw_results_{}_{}_{name}",
        std::process::id(),
        chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default()
    ));
    (RunStore::new(dir.clone()).unwrap(), dir)
}

fn manifest(run_id: &str, scenario_id: &str, timestamp: &str) -> RunManifest {
    RunManifest {
        run_id: run_id.to_string(),
        scenario_id: scenario_id.to_string(),
        scenario_name: "Test".to_string(),
        timestamp: timestamp.to_string(),
        solver_version: "0.1.0".to_string(),
        dt_s: 0.5,
        t_end_s: 60.0,
        ticks: 120,
        final_mode: "SolidHeatup/Solid".to_string(),
        alarms: AlarmTotals::default(),
        forensics_dumps: vec![ForensicsDumpEntry {
            trigger: "regime_change".to_string(),
            tick: 1,
            sim_time_s: 0.5,
            location: "memory:forensics_x.csv".to_string(),
        }],
    }
}

#[test]
fn save_and_load_run() {
    let (store, dir) = temp_store("roundtrip");
    let m = manifest("run-a", "scn", "2026-01-01T00:00:00Z");

    let mut values = BTreeMap::new();
    values.insert("pressure_psia".to_string(), 14.7);
    values.insert("rcs_temp_f".to_string(), 100.0);
    let records = vec![
        TelemetryRecord {
            tick: 0,
            time_s: 0.0,
            regime: "ColdShutdown".to_string(),
            bubble_phase: "Solid".to_string(),
            values: values.clone(),
        },
        TelemetryRecord {
            tick: 120,
            time_s: 60.0,
            regime: "SolidHeatup".to_string(),
            bubble_phase: "Solid".to_string(),
            values,
        },
    ];
    let events = vec![EventRecord {
        tick: 1,
        sim_time_s: 0.5,
        severity: "ACTION".to_string(),
        message: "ColdShutdown/Solid -> SolidHeatup/Solid".to_string(),
    }];

    assert!(!store.has_run("run-a"));
    store.save_run(&m, &records, &events).unwrap();
    assert!(store.has_run("run-a"));

    assert_eq!(store.load_manifest("run-a").unwrap(), m);
    assert_eq!(store.load_telemetry("run-a").unwrap(), records);
    assert_eq!(store.load_events("run-a").unwrap(), events);

    std::fs::remove_dir_all(dir).ok();
}

#[test]
fn list_filters_by_scenario_and_sorts() {
    let (store, dir) = temp_store("list");
    store
        .save_run(&manifest("b", "scn", "2026-01-02T00:00:00Z"), &[], &[])
        .unwrap();
    store
        .save_run(&manifest("a", "scn", "2026-01-01T00:00:00Z"), &[], &[])
        .unwrap();
    store
        .save_run(&manifest("c", "other", "2026-01-03T00:00:00Z"), &[], &[])
        .unwrap();

    let runs = store.list_runs("scn").unwrap();
    let ids: Vec<_> = runs.iter().map(|m| m.run_id.as_str()).collect();
    assert_eq!(ids, vec!["a", "b"]);

    store.delete_run("a").unwrap();
    assert!(!store.has_run("a"));
    assert!(matches!(
        store.load_manifest("a"),
        Err(ResultsError::RunNotFound { .. })
    ));

    std::fs::remove_dir_all(dir).ok();
}
