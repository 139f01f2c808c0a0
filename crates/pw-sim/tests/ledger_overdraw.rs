//! An outflow larger than the RCS inventory is clamped and alarmed once.

use pw_sim::forensics::{MemorySink, Trigger};
use pw_sim::{AlarmKind, BoundarySource, PlantConfig, Severity, Simulator};
use pw_water::SteamTables;

#[test]
fn oversized_letdown_is_clamped_alarmed_and_dumped() {
    let mut cfg = PlantConfig::default();
    cfg.time.dt_s = 1.0;
    cfg.forensics.cooldown_s = 0.0;
    let sink = MemorySink::new();
    let dumps = sink.handle();
    let mut sim =
        Simulator::with_parts(cfg, Box::new(SteamTables::new()), Box::new(sink)).unwrap();

    for _ in 0..5 {
        assert!(sim.tick().committed);
    }
    let before = *sim.plant();
    let m0 = sim.state().total_mass_lb();
    let overdraw = -(sim.state().rcs_water_mass_lb() + 10_000.0);
    sim.queue_boundary_flow(overdraw, BoundarySource::Letdown).unwrap();

    let report = sim.tick().clone();
    assert!(report.alarms.is_raised(AlarmKind::ConservationAlarm));
    assert!(!report.committed);
    assert_eq!(*sim.plant(), before);
    let record = report.dump.expect("conservation alarm should dump");
    assert_eq!(record.trigger, Trigger::ConservationAlarm);
    assert!(
        dumps
            .all()
            .iter()
            .any(|d| d.file_name.ends_with("_conservation_alarm.csv"))
    );

    let clamped: Vec<_> = sim
        .events()
        .iter()
        .filter(|e| e.severity == Severity::Alarm && e.message.contains("clamped"))
        .collect();
    assert_eq!(clamped.len(), 1);
    assert!(clamped[0].message.contains("letdown"), "{}", clamped[0].message);
    assert!(
        sim.events()
            .iter()
            .any(|e| e.severity == Severity::Alert && e.message.contains("discarded"))
    );
    assert_eq!(sim.alarm_counts().conservation, 1);

    // the overdraw is not retried; the plant carries on from where it was
    for _ in 0..20 {
        let report = sim.tick().clone();
        assert!(report.committed, "tick {}", report.tick);
        assert!(!report.alarms.is_raised(AlarmKind::ConservationAlarm));
    }
    let s = sim.state();
    assert!(s.rcs_water_mass_lb() > 0.5 * m0);
    assert!(s.drift_lb().abs() <= 0.1, "drift {}", s.drift_lb());
    assert_eq!(sim.alarm_counts().conservation, 1);
    assert_eq!(
        sim.events()
            .iter()
            .filter(|e| e.message.contains("clamped"))
            .count(),
        1
    );
}
