//! Overpressure relief.
//!
//! While solid, a relief valve on the RCS side discharges liquid. With a
//! bubble, the PORV discharges pressurizer steam. Both are boundary flows.

use crate::config::ReliefConfig;
use crate::error::LedgerError;
use crate::state::{BoundarySource, SystemState};
use pw_water::WaterProperties;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ReliefFlow {
    pub solid_relief_lbps: f64,
    pub porv_lbps: f64,
}

impl ReliefFlow {
    pub fn total_lbps(&self) -> f64 {
        self.solid_relief_lbps + self.porv_lbps
    }

    pub fn is_open(&self) -> bool {
        self.total_lbps() > 0.0
    }
}

fn valve_flow(pressure_psia: f64, setpoint_psia: f64, config: &ReliefConfig) -> f64 {
    if pressure_psia <= setpoint_psia {
        return 0.0;
    }
    (config.coefficient_lbps_per_psi * (pressure_psia - setpoint_psia)).min(config.max_flow_lbps)
}

/// Discharge through whichever valve is lifted.
pub fn relief_step<W: WaterProperties + ?Sized>(
    state: &mut SystemState,
    water: &W,
    config: &ReliefConfig,
    dt: f64,
) -> Result<ReliefFlow, LedgerError> {
    let p = state.pressure_psia;
    if state.bubble_phase.has_bubble() {
        let rate = valve_flow(p, config.porv_setpoint_psia, config);
        let mass = (rate * dt).min(state.pzr_steam_mass_lb.max(0.0));
        if mass <= 0.0 {
            return Ok(ReliefFlow::default());
        }
        let receipt = state.apply_boundary_flow(-mass, BoundarySource::Relief)?;
        let released = -receipt.applied_lb;
        let ug = water.sat_at_pressure(p).ug;
        state.set_pzr_inventory(state.pzr_water_mass_lb, state.pzr_steam_mass_lb - released);
        state.pzr_energy_btu -= released * ug;
        Ok(ReliefFlow {
            solid_relief_lbps: 0.0,
            porv_lbps: released / dt,
        })
    } else {
        let rate = valve_flow(p, config.solid_relief_setpoint_psia, config);
        if rate <= 0.0 {
            return Ok(ReliefFlow::default());
        }
        let u = state.rcs_specific_energy();
        let receipt =
            state.apply_boundary_flow_with_energy(-rate * dt, BoundarySource::Relief, u)?;
        Ok(ReliefFlow {
            solid_relief_lbps: -receipt.applied_lb / dt,
            porv_lbps: 0.0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pw_water::SteamTables;

    #[test]
    fn closed_below_setpoint() {
        let water = SteamTables::new();
        let mut s = SystemState::solid(700_000.0, 110_000.0, 4.7e7, 7.4e6, 400.0, 300.0, 300.0);
        let before = s;
        let flow = relief_step(&mut s, &water, &ReliefConfig::default(), 0.5).unwrap();
        assert!(!flow.is_open());
        assert_eq!(s, before);
    }

    #[test]
    fn solid_relief_discharges_rcs_liquid() {
        let water = SteamTables::new();
        let mut s = SystemState::solid(700_000.0, 110_000.0, 4.7e7, 7.4e6, 460.0, 300.0, 300.0);
        let flow = relief_step(&mut s, &water, &ReliefConfig::default(), 0.5).unwrap();
        assert!((flow.solid_relief_lbps - 20.0).abs() < 1e-9);
        assert!((s.total_mass_lb() - (810_000.0 - 10.0)).abs() < 1e-9);
        assert_eq!(s.accumulators().relief_cumulative_lb, 10.0);
        assert_eq!(s.pzr_mass_lb(), 110_000.0);
        assert_eq!(s.drift_lb(), 0.0);
    }
}
