//! Finite difference Jacobian computation.

use crate::problem::ClosureProblem;
use nalgebra::{SMatrix, SVector};

/// Compute Jacobian using central finite differences.
///
/// Perturbations stay inside the bounds: near a bound the stencil is shifted
/// to one side so the residual is never evaluated at an infeasible point.
pub fn central_difference_jacobian<const N: usize, P: ClosureProblem<N>>(
    problem: &P,
    x: &SVector<f64, N>,
) -> SMatrix<f64, N, N> {
    let lo = problem.lower_bounds();
    let hi = problem.upper_bounds();
    let mut jac = SMatrix::<f64, N, N>::zeros();

    for j in 0..N {
        let h = problem.fd_step(x, j);

        let mut x_plus = *x;
        x_plus[j] = (x[j] + h).min(hi[j]);
        let mut x_minus = *x;
        x_minus[j] = (x[j] - h).max(lo[j]);

        let span = x_plus[j] - x_minus[j];
        if span <= 0.0 {
            continue;
        }

        let df = (problem.residual(&x_plus) - problem.residual(&x_minus)) / span;
        jac.set_column(j, &df);
    }

    jac
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Quadratic;

    impl ClosureProblem<2> for Quadratic {
        fn residual(&self, x: &SVector<f64, 2>) -> SVector<f64, 2> {
            SVector::<f64, 2>::new(x[0] * x[0] - 4.0, x[0] * x[1])
        }
        fn tolerances(&self) -> SVector<f64, 2> {
            SVector::<f64, 2>::repeat(1e-9)
        }
        fn lower_bounds(&self) -> SVector<f64, 2> {
            SVector::<f64, 2>::new(0.0, 0.0)
        }
        fn upper_bounds(&self) -> SVector<f64, 2> {
            SVector::<f64, 2>::repeat(100.0)
        }
    }

    #[test]
    fn jacobian_quadratic() {
        let x = SVector::<f64, 2>::new(3.0, 2.0);
        let jac = central_difference_jacobian(&Quadratic, &x);

        assert!((jac[(0, 0)] - 6.0).abs() < 1e-6);
        assert!(jac[(0, 1)].abs() < 1e-9);
        assert!((jac[(1, 0)] - 2.0).abs() < 1e-6);
        assert!((jac[(1, 1)] - 3.0).abs() < 1e-6);
    }

    #[test]
    fn stencil_shifts_at_lower_bound() {
        let x = SVector::<f64, 2>::new(3.0, 0.0);
        let jac = central_difference_jacobian(&Quadratic, &x);
        // one-sided difference on x[1] still gives d(x0*x1)/dx1 = x0
        assert!((jac[(1, 1)] - 3.0).abs() < 1e-6);
    }
}
