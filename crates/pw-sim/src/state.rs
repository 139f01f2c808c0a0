//! Plant state owned by the tick.
//!
//! `SystemState` is a plain `Copy` value: the tick mutates a working copy
//! and commits it wholesale, and readers only ever see committed copies.
//! Compartment masses are private; the RCS water mass is always the ledger
//! remainder `total - pzr_water - pzr_steam`.

use pw_core::CompensatedSum;
use serde::{Deserialize, Serialize};

/// Macro plant mode, heat-up order.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum PlantRegime {
    #[default]
    ColdShutdown,
    SolidHeatup,
    BubbleFormation,
    Pressurization,
    #[serde(rename = "RCPStartup")]
    RcpStartup,
    BulkHeatup,
    #[serde(rename = "ApproachHZP")]
    ApproachHzp,
    #[serde(rename = "HZPStable")]
    HzpStable,
}

impl PlantRegime {
    pub const ALL: [PlantRegime; 8] = [
        PlantRegime::ColdShutdown,
        PlantRegime::SolidHeatup,
        PlantRegime::BubbleFormation,
        PlantRegime::Pressurization,
        PlantRegime::RcpStartup,
        PlantRegime::BulkHeatup,
        PlantRegime::ApproachHzp,
        PlantRegime::HzpStable,
    ];

    pub fn name(self) -> &'static str {
        match self {
            PlantRegime::ColdShutdown => "ColdShutdown",
            PlantRegime::SolidHeatup => "SolidHeatup",
            PlantRegime::BubbleFormation => "BubbleFormation",
            PlantRegime::Pressurization => "Pressurization",
            PlantRegime::RcpStartup => "RCPStartup",
            PlantRegime::BulkHeatup => "BulkHeatup",
            PlantRegime::ApproachHzp => "ApproachHZP",
            PlantRegime::HzpStable => "HZPStable",
        }
    }
}

impl std::fmt::Display for PlantRegime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Pressurizer sub-phase during bubble formation.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum BubblePhase {
    #[default]
    Solid,
    Stabilize,
    Drain,
    Complete,
    TwoPhase,
}

impl BubblePhase {
    pub fn name(self) -> &'static str {
        match self {
            BubblePhase::Solid => "Solid",
            BubblePhase::Stabilize => "Stabilize",
            BubblePhase::Drain => "Drain",
            BubblePhase::Complete => "Complete",
            BubblePhase::TwoPhase => "TwoPhase",
        }
    }

    /// A steam space exists in the pressurizer.
    pub fn has_bubble(self) -> bool {
        !matches!(self, BubblePhase::Solid)
    }
}

impl std::fmt::Display for BubblePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FlowDirection {
    Inflow,
    Outflow,
}

/// Tag carried by every boundary mass delta.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BoundarySource {
    Charging,
    Letdown,
    SealLeakoff,
    Relief,
    Makeup,
}

impl BoundarySource {
    pub fn direction(self) -> FlowDirection {
        match self {
            BoundarySource::Charging | BoundarySource::Makeup => FlowDirection::Inflow,
            BoundarySource::Letdown | BoundarySource::SealLeakoff | BoundarySource::Relief => {
                FlowDirection::Outflow
            }
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            BoundarySource::Charging => "charging",
            BoundarySource::Letdown => "letdown",
            BoundarySource::SealLeakoff => "seal_leakoff",
            BoundarySource::Relief => "relief",
            BoundarySource::Makeup => "makeup",
        }
    }
}

/// Per-source audit trail. Each field only grows.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BoundaryAccumulators {
    pub charging_net_lb: f64,
    pub letdown_net_lb: f64,
    pub relief_cumulative_lb: f64,
    pub seal_leakoff_net_lb: f64,
    pub makeup_net_lb: f64,
}

impl BoundaryAccumulators {
    pub(crate) fn record(&mut self, source: BoundarySource, magnitude_lb: f64) {
        let slot = match source {
            BoundarySource::Charging => &mut self.charging_net_lb,
            BoundarySource::Letdown => &mut self.letdown_net_lb,
            BoundarySource::Relief => &mut self.relief_cumulative_lb,
            BoundarySource::SealLeakoff => &mut self.seal_leakoff_net_lb,
            BoundarySource::Makeup => &mut self.makeup_net_lb,
        };
        *slot += magnitude_lb.abs();
    }

    /// Net boundary mass implied by the accumulators (in minus out).
    pub fn net_lb(&self) -> f64 {
        self.charging_net_lb + self.makeup_net_lb
            - self.letdown_net_lb
            - self.seal_leakoff_net_lb
            - self.relief_cumulative_lb
    }
}

/// Primary-loop state: ledger, compartments, energies, and mode.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SystemState {
    pub(crate) total_mass_lb: f64,
    pub(crate) initial_mass_lb: f64,
    /// Compensated integral of every applied boundary delta
    pub(crate) boundary_integral: CompensatedSum,
    pub(crate) accumulators: BoundaryAccumulators,

    pub(crate) rcs_water_mass_lb: f64,
    pub(crate) pzr_water_mass_lb: f64,
    pub(crate) pzr_steam_mass_lb: f64,

    pub(crate) rcs_energy_btu: f64,
    pub(crate) pzr_energy_btu: f64,

    pub(crate) pressure_psia: f64,
    pub(crate) rcs_temp_f: f64,
    pub(crate) pzr_temp_f: f64,

    pub(crate) regime: PlantRegime,
    pub(crate) bubble_phase: BubblePhase,
}

impl SystemState {
    /// Liquid-solid plant at uniform pressure.
    ///
    /// Compartment masses come from geometry and liquid density; the ledger
    /// starts at their sum.
    pub(crate) fn solid(
        rcs_mass_lb: f64,
        pzr_mass_lb: f64,
        rcs_energy_btu: f64,
        pzr_energy_btu: f64,
        pressure_psia: f64,
        rcs_temp_f: f64,
        pzr_temp_f: f64,
    ) -> Self {
        let total = rcs_mass_lb + pzr_mass_lb;
        Self {
            total_mass_lb: total,
            initial_mass_lb: total,
            boundary_integral: CompensatedSum::new(0.0),
            accumulators: BoundaryAccumulators::default(),
            rcs_water_mass_lb: rcs_mass_lb,
            pzr_water_mass_lb: pzr_mass_lb,
            pzr_steam_mass_lb: 0.0,
            rcs_energy_btu,
            pzr_energy_btu,
            pressure_psia,
            rcs_temp_f,
            pzr_temp_f,
            regime: PlantRegime::ColdShutdown,
            bubble_phase: BubblePhase::Solid,
        }
    }

    pub fn total_mass_lb(&self) -> f64 {
        self.total_mass_lb
    }

    pub fn initial_mass_lb(&self) -> f64 {
        self.initial_mass_lb
    }

    /// Sum of every boundary delta applied since initialization.
    pub fn boundary_net_lb(&self) -> f64 {
        self.boundary_integral.value()
    }

    pub fn accumulators(&self) -> BoundaryAccumulators {
        self.accumulators
    }

    pub fn rcs_water_mass_lb(&self) -> f64 {
        self.rcs_water_mass_lb
    }

    pub fn pzr_water_mass_lb(&self) -> f64 {
        self.pzr_water_mass_lb
    }

    pub fn pzr_steam_mass_lb(&self) -> f64 {
        self.pzr_steam_mass_lb
    }

    pub fn pzr_mass_lb(&self) -> f64 {
        self.pzr_water_mass_lb + self.pzr_steam_mass_lb
    }

    pub fn rcs_energy_btu(&self) -> f64 {
        self.rcs_energy_btu
    }

    pub fn pzr_energy_btu(&self) -> f64 {
        self.pzr_energy_btu
    }

    /// RCS liquid specific internal energy [BTU/lb].
    pub fn rcs_specific_energy(&self) -> f64 {
        if self.rcs_water_mass_lb > 0.0 {
            self.rcs_energy_btu / self.rcs_water_mass_lb
        } else {
            0.0
        }
    }

    pub fn pressure_psia(&self) -> f64 {
        self.pressure_psia
    }

    pub fn rcs_temp_f(&self) -> f64 {
        self.rcs_temp_f
    }

    pub fn pzr_temp_f(&self) -> f64 {
        self.pzr_temp_f
    }

    pub fn regime(&self) -> PlantRegime {
        self.regime
    }

    pub fn bubble_phase(&self) -> BubblePhase {
        self.bubble_phase
    }

    /// Ledger total minus the initial mass plus integrated boundary flow.
    pub fn drift_lb(&self) -> f64 {
        self.total_mass_lb - (self.initial_mass_lb + self.boundary_integral.value())
    }

    /// Pressurizer liquid level as a percentage of its volume.
    pub fn pzr_level_pct(&self, liquid_specific_volume: f64, pzr_volume_ft3: f64) -> f64 {
        if !self.bubble_phase.has_bubble() {
            return 100.0;
        }
        (self.pzr_water_mass_lb * liquid_specific_volume / pzr_volume_ft3 * 100.0).clamp(0.0, 100.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn regime_order_follows_heatup() {
        for pair in PlantRegime::ALL.windows(2) {
            assert!(pair[0] < pair[1]);
        }
        assert_eq!(PlantRegime::RcpStartup.name(), "RCPStartup");
    }

    #[test]
    fn accumulators_only_grow() {
        let mut acc = BoundaryAccumulators::default();
        acc.record(BoundarySource::Letdown, -3.0);
        acc.record(BoundarySource::Letdown, -2.0);
        acc.record(BoundarySource::Charging, 4.0);
        assert_eq!(acc.letdown_net_lb, 5.0);
        assert_eq!(acc.charging_net_lb, 4.0);
        assert_eq!(acc.net_lb(), -1.0);
    }

    #[test]
    fn solid_state_sums_compartments() {
        let s = SystemState::solid(700_000.0, 110_000.0, 4.7e7, 7.4e6, 14.7, 100.0, 100.0);
        assert_eq!(s.total_mass_lb(), 810_000.0);
        assert_eq!(s.drift_lb(), 0.0);
        assert_eq!(s.regime(), PlantRegime::ColdShutdown);
        assert_eq!(s.bubble_phase(), BubblePhase::Solid);
        assert_eq!(s.pzr_level_pct(0.016, 1_800.0), 100.0);
    }
}
