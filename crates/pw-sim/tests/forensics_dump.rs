//! Forensics dumps on regime change, to memory and to disk.

use pw_sim::forensics::{MemorySink, Trigger};
use pw_sim::{PlantConfig, PlantRegime, Simulator};
use pw_water::SteamTables;

#[test]
fn regime_change_dumps_ring() {
    let sink = MemorySink::new();
    let dumps = sink.handle();
    let mut sim = Simulator::with_parts(
        PlantConfig::default(),
        Box::new(SteamTables::new()),
        Box::new(sink),
    )
    .unwrap();

    let report = sim.tick().clone();
    assert_eq!(sim.state().regime(), PlantRegime::SolidHeatup);
    let record = report.dump.expect("regime change should dump");
    assert_eq!(record.trigger, Trigger::RegimeChange);
    assert_eq!(record.tick, 1);
    assert_eq!(record.rows, 2);

    let stored = dumps.all();
    assert_eq!(stored.len(), 1);
    let dump = &stored[0];
    assert!(dump.file_name.starts_with("forensics_"));
    assert!(dump.file_name.ends_with("_t1_regime_change.csv"));
    let mut lines = dump.contents.lines();
    assert_eq!(lines.next(), Some("# trigger=regime_change"));
    assert!(lines.next().is_some_and(|l| l.starts_with("# wall_time=")));
    assert_eq!(lines.next(), Some("# tick=1"));
    // header + column names + two rows
    assert_eq!(dump.contents.lines().count(), 5 + 1 + 2);
}

#[test]
fn file_sink_writes_csv() {
    let dir = std::env::temp_dir().join(format!("pw-forensics-{}", uuid::Uuid::new_v4()));
    let mut cfg = PlantConfig::default();
    cfg.forensics.output_dir = Some(dir.to_string_lossy().into_owned());
    let mut sim = Simulator::new(cfg).unwrap();

    sim.tick();
    let records = sim.forensics().dumps();
    assert_eq!(records.len(), 1);
    let path = std::path::PathBuf::from(&records[0].location);
    assert!(path.starts_with(&dir));
    let contents = std::fs::read_to_string(&path).unwrap();
    assert!(contents.contains("regime_change"));

    std::fs::remove_dir_all(&dir).ok();
}
