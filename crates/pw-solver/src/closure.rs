//! Pressurizer/RCS partition closures.
//!
//! Mass split between the RCS and the pressurizer follows from volume
//! closure: the RCS is always full of liquid, so its mass is fixed by its
//! volume and the current pressure, and the pressurizer holds the rest of
//! the ledger total. Whatever mass crosses the surge line carries energy:
//! an insurge brings RCS liquid, an outsurge leaves at the pressurizer
//! liquid energy. Steam is never created by geometry; it appears only when
//! pressurizer energy exceeds what saturated liquid can hold.

use crate::problem::ClosureProblem;
use nalgebra::SVector;
use pw_water::{P_MAX_PSIA, WaterProperties};

pub const P_FLOOR_PSIA: f64 = 1.0;
pub const P_CEILING_PSIA: f64 = P_MAX_PSIA;

/// Internal transfer through the surge line. Positive mass is an insurge.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Surge {
    pub mass_lb: f64,
    pub energy_btu: f64,
}

/// State the closure starts from (after boundary flows and heat input).
#[derive(Clone, Copy, Debug)]
pub struct PartitionInputs {
    pub total_mass_lb: f64,
    pub rcs_volume_ft3: f64,
    pub pzr_volume_ft3: f64,
    pub rcs_temp_f: f64,
    /// RCS liquid specific internal energy [BTU/lb]
    pub rcs_specific_energy: f64,
    pub pzr_mass_lb: f64,
    pub pzr_energy_btu: f64,
    pub pressure_guess_psia: f64,
    pub steam_mass_guess_lb: f64,
}

/// Liquid-solid pressurizer: one unknown, pressure.
pub struct SolidClosure<'a, W: WaterProperties + ?Sized> {
    pub water: &'a W,
    pub inputs: PartitionInputs,
    pub pzr_temp_f: f64,
    pub volume_tol_ft3: f64,
}

impl<W: WaterProperties + ?Sized> SolidClosure<'_, W> {
    pub fn pzr_mass_at(&self, p_psia: f64) -> f64 {
        self.inputs.pzr_volume_ft3 * self.water.liquid_density(self.pzr_temp_f, p_psia)
    }

    pub fn surge_at(&self, p_psia: f64) -> Surge {
        let dm = self.pzr_mass_at(p_psia) - self.inputs.pzr_mass_lb;
        let u_src = if dm > 0.0 {
            self.inputs.rcs_specific_energy
        } else {
            self.inputs.pzr_energy_btu / self.inputs.pzr_mass_lb
        };
        Surge {
            mass_lb: dm,
            energy_btu: dm * u_src,
        }
    }
}

impl<W: WaterProperties + ?Sized> ClosureProblem<1> for SolidClosure<'_, W> {
    fn residual(&self, x: &SVector<f64, 1>) -> SVector<f64, 1> {
        let p = x[0];
        let rcs_mass = self.inputs.total_mass_lb - self.pzr_mass_at(p);
        let rcs_rho = self.water.liquid_density(self.inputs.rcs_temp_f, p);
        SVector::<f64, 1>::new(rcs_mass / rcs_rho - self.inputs.rcs_volume_ft3)
    }

    fn tolerances(&self) -> SVector<f64, 1> {
        SVector::<f64, 1>::new(self.volume_tol_ft3)
    }

    fn lower_bounds(&self) -> SVector<f64, 1> {
        SVector::<f64, 1>::new(P_FLOOR_PSIA)
    }

    fn upper_bounds(&self) -> SVector<f64, 1> {
        SVector::<f64, 1>::new(P_CEILING_PSIA)
    }

    fn fd_step(&self, x: &SVector<f64, 1>, _j: usize) -> f64 {
        1e-4 * x[0].abs().max(1.0)
    }
}

/// Two-phase pressurizer: unknowns are pressure and steam mass.
///
/// The surge energy source is chosen once per solve from the direction the
/// surge takes at the initial guess, and held fixed so the residual stays
/// smooth while Newton iterates.
pub struct TwoPhaseClosure<'a, W: WaterProperties + ?Sized> {
    pub water: &'a W,
    pub inputs: PartitionInputs,
    pub insurge: bool,
    pub volume_tol_ft3: f64,
    pub energy_tol_btu: f64,
}

impl<'a, W: WaterProperties + ?Sized> TwoPhaseClosure<'a, W> {
    pub fn new(
        water: &'a W,
        inputs: PartitionInputs,
        volume_tol_ft3: f64,
        energy_tol_btu: f64,
    ) -> Self {
        let mut closure = Self {
            water,
            inputs,
            insurge: true,
            volume_tol_ft3,
            energy_tol_btu,
        };
        closure.insurge = closure.pzr_mass_at(inputs.pressure_guess_psia) > inputs.pzr_mass_lb;
        closure
    }

    pub fn pzr_mass_at(&self, p_psia: f64) -> f64 {
        let rcs_mass =
            self.inputs.rcs_volume_ft3 * self.water.liquid_density(self.inputs.rcs_temp_f, p_psia);
        self.inputs.total_mass_lb - rcs_mass
    }

    pub fn surge_at(&self, p_psia: f64) -> Surge {
        let dm = self.pzr_mass_at(p_psia) - self.inputs.pzr_mass_lb;
        let u_src = if self.insurge {
            self.inputs.rcs_specific_energy
        } else {
            self.water.sat_at_pressure(p_psia).uf
        };
        Surge {
            mass_lb: dm,
            energy_btu: dm * u_src,
        }
    }
}

impl<W: WaterProperties + ?Sized> ClosureProblem<2> for TwoPhaseClosure<'_, W> {
    fn residual(&self, x: &SVector<f64, 2>) -> SVector<f64, 2> {
        let (p, steam) = (x[0], x[1]);
        let sat = self.water.sat_at_pressure(p);
        let pzr_mass = self.pzr_mass_at(p);
        let liquid = pzr_mass - steam;

        let surge = self.surge_at(p);
        let energy = self.inputs.pzr_energy_btu + surge.energy_btu;

        SVector::<f64, 2>::new(
            liquid * sat.vf + steam * sat.vg - self.inputs.pzr_volume_ft3,
            liquid * sat.uf + steam * sat.ug - energy,
        )
    }

    fn tolerances(&self) -> SVector<f64, 2> {
        SVector::<f64, 2>::new(self.volume_tol_ft3, self.energy_tol_btu)
    }

    fn lower_bounds(&self) -> SVector<f64, 2> {
        SVector::<f64, 2>::new(P_FLOOR_PSIA, 0.0)
    }

    fn upper_bounds(&self) -> SVector<f64, 2> {
        SVector::<f64, 2>::new(P_CEILING_PSIA, self.inputs.total_mass_lb.max(0.0))
    }

    fn fd_step(&self, x: &SVector<f64, 2>, j: usize) -> f64 {
        match j {
            0 => 1e-5 * x[0].abs().max(1.0),
            _ => 1e-4 * x[1].abs().max(1.0),
        }
    }
}
