//! High-level closure interface used by the tick.

use crate::closure::{PartitionInputs, SolidClosure, Surge, TwoPhaseClosure};
use crate::error::{SolverError, SolverResult};
use crate::newton::{NewtonConfig, newton_solve};
use crate::pattern::ConvergencePattern;
use nalgebra::SVector;
use pw_water::{SaturationProps, WaterProperties};
use tracing::debug;

/// Closure solver settings.
#[derive(Clone, Copy, Debug)]
pub struct ClosureConfig {
    /// Iteration budget per solve (zero forces a reported failure)
    pub max_iterations: usize,
    pub volume_tol_ft3: f64,
    pub energy_tol_btu: f64,
    pub line_search_beta: f64,
    pub max_line_search_iters: usize,
}

impl Default for ClosureConfig {
    fn default() -> Self {
        Self {
            max_iterations: 25,
            volume_tol_ft3: 1e-4,
            energy_tol_btu: 0.5,
            line_search_beta: 0.5,
            max_line_search_iters: 8,
        }
    }
}

impl ClosureConfig {
    pub fn validate(&self) -> SolverResult<()> {
        if !(self.volume_tol_ft3.is_finite() && self.volume_tol_ft3 > 0.0) {
            return Err(SolverError::InvalidConfig {
                what: "volume tolerance must be positive",
            });
        }
        if !(self.energy_tol_btu.is_finite() && self.energy_tol_btu > 0.0) {
            return Err(SolverError::InvalidConfig {
                what: "energy tolerance must be positive",
            });
        }
        if !(self.line_search_beta > 0.0 && self.line_search_beta < 1.0) {
            return Err(SolverError::InvalidConfig {
                what: "line search factor must be in (0, 1)",
            });
        }
        Ok(())
    }

    fn newton(&self) -> NewtonConfig {
        NewtonConfig {
            max_iterations: self.max_iterations,
            line_search_beta: self.line_search_beta,
            max_line_search_iters: self.max_line_search_iters,
        }
    }
}

/// Per-tick solver report.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ClosureResult {
    pub converged: bool,
    pub iterations: u32,
    pub volume_residual_ft3: f32,
    pub energy_residual_btu: f32,
    pub pattern: ConvergencePattern,
}

impl Default for ClosureResult {
    fn default() -> Self {
        Self {
            converged: true,
            iterations: 0,
            volume_residual_ft3: 0.0,
            energy_residual_btu: 0.0,
            pattern: ConvergencePattern::Immediate,
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct SolidSolution {
    pub pressure_psia: f64,
    pub pzr_mass_lb: f64,
    pub surge: Surge,
}

#[derive(Clone, Copy, Debug)]
pub struct TwoPhaseSolution {
    pub pressure_psia: f64,
    pub pzr_mass_lb: f64,
    pub steam_mass_lb: f64,
    pub surge: Surge,
    pub sat: SaturationProps,
}

/// Solve the liquid-solid partition for pressure.
pub fn solve_solid<W: WaterProperties + ?Sized>(
    water: &W,
    inputs: PartitionInputs,
    pzr_temp_f: f64,
    config: &ClosureConfig,
) -> (SolidSolution, ClosureResult) {
    let problem = SolidClosure {
        water,
        inputs,
        pzr_temp_f,
        volume_tol_ft3: config.volume_tol_ft3,
    };
    let x0 = SVector::<f64, 1>::new(inputs.pressure_guess_psia);
    let out = newton_solve(&problem, x0, &config.newton());

    let p = out.x[0];
    let result = ClosureResult {
        converged: out.converged,
        iterations: out.iterations as u32,
        volume_residual_ft3: out.residual[0] as f32,
        energy_residual_btu: 0.0,
        pattern: out.pattern,
    };
    if !out.converged {
        debug!(
            pattern = out.pattern.as_tag(),
            iterations = out.iterations,
            volume_residual_ft3 = out.residual[0],
            "solid closure did not converge"
        );
    }
    (
        SolidSolution {
            pressure_psia: p,
            pzr_mass_lb: problem.pzr_mass_at(p),
            surge: problem.surge_at(p),
        },
        result,
    )
}

/// Solve the two-phase partition for pressure and steam mass.
pub fn solve_two_phase<W: WaterProperties + ?Sized>(
    water: &W,
    inputs: PartitionInputs,
    config: &ClosureConfig,
) -> (TwoPhaseSolution, ClosureResult) {
    let problem =
        TwoPhaseClosure::new(water, inputs, config.volume_tol_ft3, config.energy_tol_btu);
    let x0 = SVector::<f64, 2>::new(inputs.pressure_guess_psia, inputs.steam_mass_guess_lb);
    let out = newton_solve(&problem, x0, &config.newton());

    let (p, steam) = (out.x[0], out.x[1]);
    let result = ClosureResult {
        converged: out.converged,
        iterations: out.iterations as u32,
        volume_residual_ft3: out.residual[0] as f32,
        energy_residual_btu: out.residual[1] as f32,
        pattern: out.pattern,
    };
    if !out.converged {
        debug!(
            pattern = out.pattern.as_tag(),
            iterations = out.iterations,
            volume_residual_ft3 = out.residual[0],
            energy_residual_btu = out.residual[1],
            insurge = problem.insurge,
            "two-phase closure did not converge"
        );
    }
    (
        TwoPhaseSolution {
            pressure_psia: p,
            pzr_mass_lb: problem.pzr_mass_at(p),
            steam_mass_lb: steam,
            surge: problem.surge_at(p),
            sat: water.sat_at_pressure(p),
        },
        result,
    )
}
