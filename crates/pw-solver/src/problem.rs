//! Closure problem definition.

use nalgebra::SVector;

/// A square nonlinear system with box bounds and per-equation tolerances.
pub trait ClosureProblem<const N: usize> {
    /// Residual vector. Non-finite entries mark an evaluation failure.
    fn residual(&self, x: &SVector<f64, N>) -> SVector<f64, N>;

    /// Per-equation absolute tolerance; converged when every
    /// `|r_i| <= tol_i`.
    fn tolerances(&self) -> SVector<f64, N>;

    fn lower_bounds(&self) -> SVector<f64, N>;

    fn upper_bounds(&self) -> SVector<f64, N>;

    /// Finite difference step for unknown `j` at `x`.
    fn fd_step(&self, x: &SVector<f64, N>, j: usize) -> f64 {
        1e-6 * x[j].abs().max(1.0)
    }

    /// Project `x` onto the bounds.
    fn project(&self, x: &SVector<f64, N>) -> SVector<f64, N> {
        let lo = self.lower_bounds();
        let hi = self.upper_bounds();
        SVector::<f64, N>::from_fn(|i, _| x[i].clamp(lo[i], hi[i]))
    }

    /// Residual scaled by tolerance; its max-norm is <= 1 at convergence.
    fn scaled_residual(&self, x: &SVector<f64, N>) -> SVector<f64, N> {
        let r = self.residual(x);
        let tol = self.tolerances();
        SVector::<f64, N>::from_fn(|i, _| r[i] / tol[i])
    }
}
