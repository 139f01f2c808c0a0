//! Long-running heat-up: ledger conservation and non-negativity.
//!
//! Runs the default plant at one-second ticks from cold shutdown and checks
//! every tick that the ledger matches the integrated boundary flow and that
//! no compartment goes negative.

use pw_sim::{BoundarySource, BubblePhase, PlantConfig, PlantRegime, Simulator};

fn one_second_plant() -> Simulator {
    let mut cfg = PlantConfig::default();
    cfg.time.dt_s = 1.0;
    Simulator::new(cfg).unwrap()
}

#[test]
fn eight_hours_conserve_mass() {
    let mut sim = one_second_plant();
    let m0 = sim.state().total_mass_lb();
    let mut external_lb = 0.0;

    for k in 0..8 * 3600 {
        // operator makeup and drain every half hour on top of CVCS
        if k % 1800 == 0 {
            sim.queue_boundary_flow(40.0, BoundarySource::Makeup).unwrap();
            external_lb += 40.0;
        }
        let report = sim.tick().clone();
        let s = sim.state();

        assert!(s.rcs_water_mass_lb() >= 0.0, "tick {}", report.tick);
        assert!(s.pzr_water_mass_lb() >= 0.0, "tick {}", report.tick);
        assert!(s.pzr_steam_mass_lb() >= 0.0, "tick {}", report.tick);
        let parts = s.rcs_water_mass_lb() + s.pzr_water_mass_lb() + s.pzr_steam_mass_lb();
        assert!((parts - s.total_mass_lb()).abs() < 1e-6 * m0);
        assert!(s.drift_lb().abs() <= 0.1, "drift {} at tick {}", s.drift_lb(), report.tick);
    }

    let s = sim.state();
    let acc = s.accumulators();
    assert!((acc.makeup_net_lb - external_lb).abs() < 1e-9);
    let net = s.total_mass_lb() - m0;
    assert!((net - acc.net_lb()).abs() <= 0.1, "net {net} vs {}", acc.net_lb());
    assert!((net - s.boundary_net_lb()).abs() <= 0.1);
    // eight hours is past bubble formation
    assert!(s.regime() >= PlantRegime::BubbleFormation);
}

#[test]
fn heatup_reaches_complete_within_tolerance() {
    let mut sim = one_second_plant();
    let m0 = sim.state().total_mass_lb();

    let reached = sim.run_until(
        |sim| sim.state().bubble_phase() == BubblePhase::Complete,
        12 * 3600,
    );
    assert!(reached.is_some(), "stuck in {}", sim.mode());

    let s = sim.state();
    let expected = m0 + s.boundary_net_lb();
    assert!(
        (s.total_mass_lb() - expected).abs() <= 0.001 * m0,
        "total {} expected {expected}",
        s.total_mass_lb()
    );
    assert!(s.pzr_steam_mass_lb() > 0.0);

    let regimes: Vec<_> = sim
        .events()
        .iter()
        .filter(|e| e.message.contains("->"))
        .map(|e| e.message.clone())
        .collect();
    assert!(regimes.iter().any(|m| m.contains("BubbleFormation/Stabilize")));
    assert!(regimes.iter().any(|m| m.contains("BubbleFormation/Drain")));
}
