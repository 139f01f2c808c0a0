use pw_scenario::schema::*;
use pw_scenario::{load, load_json, load_yaml, save_json, save_yaml, validate_scenario};

fn temp_path(name: &str) -> std::path::PathBuf {
    std::env::temp_dir().join(format!("pw_scenario_{}_{name}", std::process::id()))
}

#[test]
fn roundtrip_yaml_default_scenario() {
    let scenario = Scenario::new("Default");
    validate_scenario(&scenario).unwrap();

    let path = temp_path("default.yaml");
    save_yaml(&path, &scenario).unwrap();
    let loaded = load_yaml(&path).unwrap();
    std::fs::remove_file(&path).ok();

    assert_eq!(scenario, loaded);
}

#[test]
fn roundtrip_json_with_schedule() {
    let mut scenario = Scenario::new("Scheduled");
    scenario.plant.time.dt_s = 1.0;
    scenario.plant.sg.condenser_vacuum = false;
    scenario.schedule = vec![
        ScheduledFlowDef {
            at_s: 120.0,
            source: FlowSourceDef::Makeup,
            delta_lb: 50.0,
        },
        ScheduledFlowDef {
            at_s: 60.0,
            source: FlowSourceDef::Relief,
            delta_lb: -10.0,
        },
    ];

    let path = temp_path("scheduled.json");
    save_json(&path, &scenario).unwrap();
    let loaded = load(&path).unwrap();
    std::fs::remove_file(&path).ok();

    assert_eq!(scenario, loaded);
    let order: Vec<f64> = loaded.sorted_schedule().iter().map(|e| e.at_s).collect();
    assert_eq!(order, vec![60.0, 120.0]);
}

#[test]
fn sparse_yaml_takes_defaults() {
    let text = "version: 1\nid: sparse\nname: Sparse\ngeometry:\n  pzr_volume_ft3: 1500.0\n";
    let path = temp_path("sparse.yaml");
    std::fs::write(&path, text).unwrap();
    let loaded = load_yaml(&path).unwrap();
    std::fs::remove_file(&path).ok();

    assert_eq!(loaded.plant.geometry.pzr_volume_ft3, 1500.0);
    assert_eq!(loaded.plant.geometry.rcs_volume_ft3, 11_500.0);
    assert_eq!(loaded.plant.sg.blend_ramp_s, 60.0);
    assert_eq!(loaded.plant.forensics.capacity, 90);
}

#[test]
fn invalid_json_is_rejected_on_load() {
    let text = r#"{"version": 1, "id": "bad", "name": "Bad", "time": {"dt_s": 2.0}}"#;
    let path = temp_path("bad.json");
    std::fs::write(&path, text).unwrap();
    let result = load_json(&path);
    std::fs::remove_file(&path).ok();
    assert!(result.is_err());
}
