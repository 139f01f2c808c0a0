//! Mass ledger and boundary accountant.
//!
//! `apply_boundary_flow` is the only path that changes the ledger total,
//! and it never draws the RCS compartment below zero.
//! Internal transfers (surge, spray) move mass between compartments and are
//! followed by `recompute_remainder`, which re-derives the RCS water mass and
//! clamps any compartment that would go negative.

use crate::error::LedgerError;
use crate::state::{BoundarySource, FlowDirection, SystemState};

/// Outcome of one accepted boundary delta.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundaryReceipt {
    pub source: BoundarySource,
    pub requested_lb: f64,
    pub applied_lb: f64,
}

impl BoundaryReceipt {
    /// The ledger could not honour the full outflow without going negative.
    pub fn clamped(&self) -> bool {
        self.applied_lb != self.requested_lb
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Compartment {
    Rcs,
    PzrWater,
    PzrSteam,
    Ledger,
}

impl Compartment {
    pub fn name(self) -> &'static str {
        match self {
            Compartment::Rcs => "rcs_water",
            Compartment::PzrWater => "pzr_water",
            Compartment::PzrSteam => "pzr_steam",
            Compartment::Ledger => "ledger_total",
        }
    }
}

/// Something the accountant had to correct or flag.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum LedgerAnomaly {
    /// A compartment would have gone negative by `deficit_lb` and was clamped.
    NegativeCompartment {
        compartment: Compartment,
        deficit_lb: f64,
    },
    /// Ledger total disagrees with the integrated boundary flow.
    Drift { drift_lb: f64 },
}

impl SystemState {
    /// Apply one tagged boundary delta to the ledger.
    ///
    /// Inflow sources take non-negative deltas and outflow sources
    /// non-positive ones. Every boundary connection is on the RCS side, so
    /// an outflow larger than the RCS water inventory is clamped to empty
    /// that compartment; the receipt reports the applied amount.
    pub fn apply_boundary_flow(
        &mut self,
        delta_lb: f64,
        source: BoundarySource,
    ) -> Result<BoundaryReceipt, LedgerError> {
        if !delta_lb.is_finite() {
            return Err(LedgerError::NonFinite {
                origin: source.name(),
            });
        }
        let wrong_sign = match source.direction() {
            FlowDirection::Inflow => delta_lb < 0.0,
            FlowDirection::Outflow => delta_lb > 0.0,
        };
        if wrong_sign {
            return Err(LedgerError::WrongSign {
                origin: source.name(),
                delta_lb,
            });
        }

        let available = self.rcs_water_mass_lb.max(0.0);
        let applied = delta_lb.max(-available);
        self.total_mass_lb += applied;
        self.boundary_integral.add(applied);
        self.accumulators.record(source, applied);
        self.rcs_water_mass_lb =
            self.total_mass_lb - self.pzr_water_mass_lb - self.pzr_steam_mass_lb;

        Ok(BoundaryReceipt {
            source,
            requested_lb: delta_lb,
            applied_lb: applied,
        })
    }

    /// Boundary delta that also moves energy into or out of the RCS.
    ///
    /// Boundary connections are on the RCS side, so the remainder
    /// compartment takes both the mass and `specific_energy` per lb.
    pub fn apply_boundary_flow_with_energy(
        &mut self,
        delta_lb: f64,
        source: BoundarySource,
        specific_energy_btu_per_lb: f64,
    ) -> Result<BoundaryReceipt, LedgerError> {
        let receipt = self.apply_boundary_flow(delta_lb, source)?;
        self.rcs_energy_btu += receipt.applied_lb * specific_energy_btu_per_lb;
        Ok(receipt)
    }

    /// Set the pressurizer compartments after an internal transfer.
    pub(crate) fn set_pzr_inventory(&mut self, water_lb: f64, steam_lb: f64) {
        self.pzr_water_mass_lb = water_lb;
        self.pzr_steam_mass_lb = steam_lb;
    }

    /// Re-derive the RCS remainder, clamping negative compartments.
    ///
    /// Clamping never touches the ledger total; it only reshapes the split.
    /// Returns the largest correction made, if any.
    pub fn recompute_remainder(&mut self) -> Option<LedgerAnomaly> {
        let mut anomaly = None;
        let mut note = |compartment: Compartment, deficit_lb: f64| {
            let worse = match anomaly {
                Some(LedgerAnomaly::NegativeCompartment { deficit_lb: d, .. }) => deficit_lb > d,
                _ => true,
            };
            if worse {
                anomaly = Some(LedgerAnomaly::NegativeCompartment {
                    compartment,
                    deficit_lb,
                });
            }
        };

        if self.total_mass_lb < 0.0 {
            note(Compartment::Ledger, -self.total_mass_lb);
            self.total_mass_lb = 0.0;
        }
        if self.pzr_water_mass_lb < 0.0 {
            note(Compartment::PzrWater, -self.pzr_water_mass_lb);
            self.pzr_water_mass_lb = 0.0;
        }
        if self.pzr_steam_mass_lb < 0.0 {
            note(Compartment::PzrSteam, -self.pzr_steam_mass_lb);
            self.pzr_steam_mass_lb = 0.0;
        }

        let rcs = self.total_mass_lb - self.pzr_water_mass_lb - self.pzr_steam_mass_lb;
        if rcs < 0.0 {
            note(Compartment::Rcs, -rcs);
            let pzr = self.pzr_water_mass_lb + self.pzr_steam_mass_lb;
            let scale = if pzr > 0.0 { self.total_mass_lb / pzr } else { 0.0 };
            self.pzr_water_mass_lb *= scale;
            self.pzr_steam_mass_lb = self.total_mass_lb - self.pzr_water_mass_lb;
            self.rcs_water_mass_lb = 0.0;
        } else {
            self.rcs_water_mass_lb = rcs;
        }
        anomaly
    }

    /// Compare the ledger against the integrated boundary flow.
    pub fn check_drift(&self, tolerance_lb: f64) -> Option<LedgerAnomaly> {
        let drift_lb = self.drift_lb();
        (drift_lb.abs() > tolerance_lb).then_some(LedgerAnomaly::Drift { drift_lb })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plant() -> SystemState {
        SystemState::solid(700_000.0, 110_000.0, 4.7e7, 7.4e6, 14.7, 100.0, 100.0)
    }

    #[test]
    fn boundary_flow_moves_total_and_remainder() {
        let mut s = plant();
        let r = s.apply_boundary_flow(12.5, BoundarySource::Charging).unwrap();
        assert!(!r.clamped());
        assert_eq!(s.total_mass_lb(), 810_012.5);
        assert_eq!(s.rcs_water_mass_lb(), 700_012.5);
        s.apply_boundary_flow(-2.5, BoundarySource::Letdown).unwrap();
        assert_eq!(s.boundary_net_lb(), 10.0);
        assert_eq!(s.drift_lb(), 0.0);
        assert_eq!(s.accumulators().letdown_net_lb, 2.5);
    }

    #[test]
    fn wrong_sign_and_non_finite_rejected() {
        let mut s = plant();
        let before = s;
        assert!(matches!(
            s.apply_boundary_flow(-1.0, BoundarySource::Charging),
            Err(LedgerError::WrongSign { .. })
        ));
        assert!(matches!(
            s.apply_boundary_flow(1.0, BoundarySource::Relief),
            Err(LedgerError::WrongSign { .. })
        ));
        assert!(matches!(
            s.apply_boundary_flow(f64::NAN, BoundarySource::Makeup),
            Err(LedgerError::NonFinite { .. })
        ));
        assert_eq!(s, before);
    }

    #[test]
    fn oversized_outflow_stops_at_empty_rcs() {
        let mut s = plant();
        let r = s.apply_boundary_flow(-710_000.0, BoundarySource::Letdown).unwrap();
        assert!(r.clamped());
        assert_eq!(r.applied_lb, -700_000.0);
        assert_eq!(s.rcs_water_mass_lb(), 0.0);
        assert_eq!(s.total_mass_lb(), 110_000.0);
        assert_eq!(s.pzr_mass_lb(), 110_000.0);
        assert_eq!(s.accumulators().letdown_net_lb, 700_000.0);
        assert_eq!(s.drift_lb(), 0.0);
        assert!(s.recompute_remainder().is_none());

        // nothing left to draw
        let r = s.apply_boundary_flow(-5.0, BoundarySource::SealLeakoff).unwrap();
        assert!(r.clamped());
        assert_eq!(r.applied_lb, 0.0);
        assert_eq!(s.total_mass_lb(), 110_000.0);
    }

    #[test]
    fn rcs_remainder_clamp_rescales_pressurizer() {
        let mut s = plant();
        s.total_mass_lb = 55_000.0;
        let anomaly = s.recompute_remainder();
        assert!(matches!(
            anomaly,
            Some(LedgerAnomaly::NegativeCompartment {
                compartment: Compartment::Rcs,
                ..
            })
        ));
        assert_eq!(s.rcs_water_mass_lb(), 0.0);
        assert!((s.pzr_mass_lb() - 55_000.0).abs() < 1e-9);
    }

    #[test]
    fn negative_steam_clamped_without_touching_total() {
        let mut s = plant();
        s.set_pzr_inventory(110_010.0, -10.0);
        let anomaly = s.recompute_remainder();
        assert!(matches!(
            anomaly,
            Some(LedgerAnomaly::NegativeCompartment {
                compartment: Compartment::PzrSteam,
                ..
            })
        ));
        assert_eq!(s.total_mass_lb(), 810_000.0);
        assert_eq!(s.pzr_steam_mass_lb(), 0.0);
        assert_eq!(
            s.rcs_water_mass_lb(),
            s.total_mass_lb() - s.pzr_water_mass_lb() - s.pzr_steam_mass_lb()
        );
    }

    #[test]
    fn drift_check_uses_tolerance() {
        let mut s = plant();
        assert!(s.check_drift(0.1).is_none());
        s.total_mass_lb += 1.0;
        assert!(matches!(s.check_drift(0.1), Some(LedgerAnomaly::Drift { .. })));
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        fn source() -> impl Strategy<Value = BoundarySource> {
            prop_oneof![
                Just(BoundarySource::Charging),
                Just(BoundarySource::Letdown),
                Just(BoundarySource::SealLeakoff),
                Just(BoundarySource::Relief),
                Just(BoundarySource::Makeup),
            ]
        }

        proptest! {
            #[test]
            fn ledger_change_equals_integrated_flows(
                flows in proptest::collection::vec((source(), 0.0f64..40.0), 1..2_000)
            ) {
                let mut s = plant();
                let start = s.total_mass_lb();
                let mut applied = 0.0;
                for (src, magnitude) in flows {
                    let delta = match src.direction() {
                        FlowDirection::Inflow => magnitude,
                        FlowDirection::Outflow => -magnitude,
                    };
                    let r = s.apply_boundary_flow(delta, src).unwrap();
                    applied += r.applied_lb;
                    prop_assert!(s.recompute_remainder().is_none());
                }
                prop_assert!((s.total_mass_lb() - start - applied).abs() < 1e-6);
                prop_assert!(s.drift_lb().abs() < 1e-6);
                prop_assert!((s.accumulators().net_lb() - s.boundary_net_lb()).abs() < 1e-6);
            }
        }
    }
}
