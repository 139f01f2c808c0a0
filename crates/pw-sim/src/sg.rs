//! Steam generator multi-node thermal model.
//!
//! Each node tracks its own boiling state. Once a node boils, its heat
//! transfer coefficient, effective area, and driving temperature move from
//! subcooled to boiling values together, following one blend factor that
//! ramps over `blend_ramp_s`. The blend drops back to zero as soon as the
//! node stops boiling. After aggregation the change in total heat between
//! ticks is clamped unless the pump count changed or steam dump engaged or
//! released on this tick.

use crate::config::{MAX_SG_NODES, PlantConfig};
use crate::error::{SimError, SimResult};
use pw_core::{btu_per_s_to_mw, lerp};
use pw_water::WaterProperties;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SgNodeState {
    pub temperature_f: f32,
    pub is_boiling: bool,
    pub regime_blend: f32,
    pub effective_area_fraction: f32,
    /// Effective HTC including the flow factor [BTU/hr·ft²·°F]
    pub htc: f32,
    pub heat_mw: f32,
    /// Continuous boiling time; zero while subcooled
    pub boiling_elapsed_s: f64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SgRegime {
    #[default]
    Subcooled,
    Boiling,
    SteamDump,
}

impl SgRegime {
    pub fn name(self) -> &'static str {
        match self {
            SgRegime::Subcooled => "Subcooled",
            SgRegime::Boiling => "Boiling",
            SgRegime::SteamDump => "SteamDump",
        }
    }
}

/// Why the delta clamp stood aside this tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClampBypass {
    RcpCountChanged,
    SteamDumpEdge,
}

impl ClampBypass {
    pub fn name(self) -> &'static str {
        match self {
            ClampBypass::RcpCountChanged => "rcp_count_changed",
            ClampBypass::SteamDumpEdge => "steam_dump_edge",
        }
    }
}

/// Secondary-side state carried between ticks.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SgState {
    nodes: [SgNodeState; MAX_SG_NODES],
    node_count: usize,
    total_mw: f64,
    raw_mw: f64,
    previous_rcps: u8,
    regime: SgRegime,
    secondary_pressure_psia: f64,
    secondary_tsat_f: f64,
    dumped_mw: f64,
}

impl SgState {
    pub fn nodes(&self) -> &[SgNodeState] {
        &self.nodes[..self.node_count]
    }

    /// Heat absorbed from the primary on the last step (after the clamp).
    pub fn total_mw(&self) -> f64 {
        self.total_mw
    }

    /// Aggregate before the clamp.
    pub fn raw_mw(&self) -> f64 {
        self.raw_mw
    }

    pub fn regime(&self) -> SgRegime {
        self.regime
    }

    pub fn secondary_pressure_psia(&self) -> f64 {
        self.secondary_pressure_psia
    }

    pub fn secondary_tsat_f(&self) -> f64 {
        self.secondary_tsat_f
    }

    pub fn dumped_mw(&self) -> f64 {
        self.dumped_mw
    }

    pub fn previous_rcps(&self) -> u8 {
        self.previous_rcps
    }
}

/// Result of one SG step.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SgStep {
    pub total_mw: f64,
    pub raw_mw: f64,
    /// Change in published total since the previous tick
    pub delta_mw: f64,
    /// Change the unclamped aggregate would have made
    pub raw_delta_mw: f64,
    pub clamped: bool,
    pub bypass: Option<ClampBypass>,
    pub regime: SgRegime,
    pub dumped_mw: f64,
}

#[derive(Clone, Copy, Debug)]
pub struct SteamGenerator {
    node_count: usize,
    area_fractions: [f64; MAX_SG_NODES],
    node_mass_lb: f64,
    tube_area_ft2: f64,
    htc_subcooled: f64,
    htc_boiling: f64,
    subcooled_area_fraction: f64,
    blend_ramp_s: f64,
    delta_clamp_mw: f64,
    mixing_per_s: f64,
    natural_circulation_factor: f64,
    boiling_margin_f: f64,
    steam_dump_pressure_psia: f64,
    condenser_vacuum: bool,
    secondary_floor_psia: f64,
    pump_count: u8,
}

impl SteamGenerator {
    pub fn new(config: &PlantConfig) -> SimResult<Self> {
        let sg = &config.sg;
        let node_count = config.geometry.sg_nodes;
        if node_count == 0 || node_count > MAX_SG_NODES || sg.area_fractions.len() != node_count {
            return Err(SimError::InvalidConfig {
                what: "SG node count does not match area fractions",
            });
        }
        let mut area_fractions = [0.0; MAX_SG_NODES];
        area_fractions[..node_count].copy_from_slice(&sg.area_fractions);
        Ok(Self {
            node_count,
            area_fractions,
            node_mass_lb: sg.secondary_mass_lb / node_count as f64,
            tube_area_ft2: sg.tube_area_ft2,
            htc_subcooled: sg.htc_subcooled,
            htc_boiling: sg.htc_boiling,
            subcooled_area_fraction: sg.subcooled_area_fraction,
            blend_ramp_s: sg.blend_ramp_s,
            delta_clamp_mw: sg.delta_clamp_mw,
            mixing_per_s: sg.mixing_per_s,
            natural_circulation_factor: sg.natural_circulation_factor,
            boiling_margin_f: sg.boiling_margin_f,
            steam_dump_pressure_psia: sg.steam_dump_pressure_psia,
            condenser_vacuum: sg.condenser_vacuum,
            secondary_floor_psia: sg.secondary_floor_psia,
            pump_count: config.rcp.pump_count,
        })
    }

    pub fn node_count(&self) -> usize {
        self.node_count
    }

    /// Secondary at uniform temperature, nothing boiling yet.
    pub fn initial_state<W: WaterProperties + ?Sized>(&self, water: &W, temp_f: f64) -> SgState {
        let node = SgNodeState {
            temperature_f: temp_f as f32,
            effective_area_fraction: self.subcooled_area_fraction as f32,
            htc: self.htc_subcooled as f32,
            ..SgNodeState::default()
        };
        let p = self.secondary_floor_psia.max(water.sat_pressure(temp_f));
        SgState {
            nodes: [node; MAX_SG_NODES],
            node_count: self.node_count,
            total_mw: 0.0,
            raw_mw: 0.0,
            previous_rcps: 0,
            regime: SgRegime::Subcooled,
            secondary_pressure_psia: p,
            secondary_tsat_f: water.sat_temperature(p),
            dumped_mw: 0.0,
        }
    }

    /// Primary-side flow multiplier on the HTC.
    pub fn flow_factor(&self, rcps_running: u8) -> f64 {
        if rcps_running == 0 {
            self.natural_circulation_factor
        } else {
            (rcps_running as f64 / self.pump_count as f64).min(1.0).powf(0.8)
        }
    }

    /// Advance the secondary by one tick against primary temperature `rcs_temp_f`.
    pub fn step<W: WaterProperties + ?Sized>(
        &self,
        state: &mut SgState,
        water: &W,
        rcs_temp_f: f64,
        rcps_running: u8,
        dt: f64,
    ) -> SgStep {
        let n = self.node_count;
        let nodes = &mut state.nodes[..n];

        let hottest = nodes
            .iter()
            .map(|node| node.temperature_f as f64)
            .fold(f64::MIN, f64::max);
        let dump_tsat = water.sat_temperature(self.steam_dump_pressure_psia);
        let dumping = self.condenser_vacuum
            && (state.regime == SgRegime::SteamDump || hottest >= dump_tsat);
        let p_sec = if dumping {
            self.steam_dump_pressure_psia
        } else {
            self.secondary_floor_psia
                .max(water.sat_pressure(nodes[0].temperature_f as f64))
        };
        let tsat = water.sat_temperature(p_sec);
        let flow = self.flow_factor(rcps_running);

        let mut q = [0.0f64; MAX_SG_NODES];
        for (i, node) in nodes.iter_mut().enumerate() {
            let t = node.temperature_f as f64;
            node.is_boiling = t >= tsat - self.boiling_margin_f;
            node.boiling_elapsed_s = if node.is_boiling {
                node.boiling_elapsed_s + dt
            } else {
                0.0
            };
            let blend = (node.boiling_elapsed_s / self.blend_ramp_s).min(1.0);
            let htc = lerp(self.htc_subcooled, self.htc_boiling, blend) * flow;
            let area_frac = lerp(self.subcooled_area_fraction, 1.0, blend);
            let sink_temp = lerp(t, tsat, blend);
            q[i] = htc * self.tube_area_ft2 * self.area_fractions[i] * area_frac
                * (rcs_temp_f - sink_temp)
                / 3_600.0;

            node.regime_blend = blend as f32;
            node.effective_area_fraction = area_frac as f32;
            node.htc = htc as f32;
        }

        let raw_mw = btu_per_s_to_mw(q[..n].iter().sum::<f64>());
        let regime = if dumping {
            SgRegime::SteamDump
        } else if nodes.iter().any(|node| node.is_boiling) {
            SgRegime::Boiling
        } else {
            SgRegime::Subcooled
        };

        let bypass = if rcps_running != state.previous_rcps {
            Some(ClampBypass::RcpCountChanged)
        } else if (regime == SgRegime::SteamDump) != (state.regime == SgRegime::SteamDump) {
            Some(ClampBypass::SteamDumpEdge)
        } else {
            None
        };

        let previous = state.total_mw;
        let mut total_mw = raw_mw;
        let mut clamped = false;
        if bypass.is_none() && (raw_mw - previous).abs() > self.delta_clamp_mw {
            total_mw = previous + self.delta_clamp_mw.copysign(raw_mw - previous);
            clamped = true;
        }
        if clamped {
            if raw_mw.abs() > 1e-12 {
                let scale = total_mw / raw_mw;
                q[..n].iter_mut().for_each(|qi| *qi *= scale);
            } else {
                let total_btu = pw_core::mw_to_btu_per_s(total_mw);
                for (qi, frac) in q[..n].iter_mut().zip(&self.area_fractions[..n]) {
                    *qi = total_btu * frac;
                }
            }
        }

        let mut dumped_btu = 0.0;
        for (node, qi) in nodes.iter_mut().zip(&q[..n]) {
            let t = node.temperature_f as f64;
            let cp = water.liquid_specific_heat(t);
            let mut t_new = t + qi * dt / (self.node_mass_lb * cp);
            if dumping && t_new > tsat {
                dumped_btu += (t_new - tsat) * self.node_mass_lb * cp;
                t_new = tsat;
            }
            node.temperature_f = t_new as f32;
            node.heat_mw = btu_per_s_to_mw(*qi) as f32;
        }

        // equal node masses: exchange conserves energy
        let k = (self.mixing_per_s * dt).min(0.5);
        for i in 0..n.saturating_sub(1) {
            let exchange = 0.5 * k * (nodes[i + 1].temperature_f - nodes[i].temperature_f) as f64;
            nodes[i].temperature_f = (nodes[i].temperature_f as f64 + exchange) as f32;
            nodes[i + 1].temperature_f = (nodes[i + 1].temperature_f as f64 - exchange) as f32;
        }

        let dumped_mw = btu_per_s_to_mw(dumped_btu / dt);
        let step = SgStep {
            total_mw,
            raw_mw,
            delta_mw: total_mw - previous,
            raw_delta_mw: raw_mw - previous,
            clamped,
            bypass,
            regime,
            dumped_mw,
        };
        state.total_mw = total_mw;
        state.raw_mw = raw_mw;
        state.previous_rcps = rcps_running;
        state.regime = regime;
        state.secondary_pressure_psia = p_sec;
        state.secondary_tsat_f = tsat;
        state.dumped_mw = dumped_mw;
        step
    }
}
