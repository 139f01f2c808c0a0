//! A closure that cannot converge leaves the plant untouched.

use pw_sim::{AlarmKind, BoundarySource, PlantConfig, Severity, Simulator};

#[test]
fn zero_iteration_budget_rolls_back() {
    let mut cfg = PlantConfig::default();
    cfg.solver.max_iterations = 0;
    let mut sim = Simulator::new(cfg).unwrap();
    let before = *sim.plant();

    sim.queue_boundary_flow(100.0, BoundarySource::Makeup).unwrap();
    for k in 1..=5 {
        let report = sim.tick().clone();
        assert!(!report.committed);
        assert!(!report.closure.converged);
        assert!(report.alarms.is_raised(AlarmKind::SolverNonConvergence));
        assert_eq!(*sim.plant(), before);
        assert_eq!(sim.tick_count(), k);
    }
    assert!((sim.time_s() - 5.0 * sim.dt()).abs() < 1e-12);

    // one alarm for the whole stretch
    assert_eq!(sim.events().count(Severity::Alarm), 1);
    assert_eq!(sim.alarm_counts().non_convergence, 1);
    let snap = sim.telemetry().unwrap();
    assert!(snap.alarms.non_convergence);
    assert!(!snap.closure.converged);
}
